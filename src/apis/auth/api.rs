use crate::{
    apis::{auth::AccessToken, MyPosClientInner},
    Error,
};
use std::sync::Arc;

/// myPOS authentication API client.
#[derive(Debug, Clone)]
pub struct AuthApi {
    inner: Arc<MyPosClientInner>,
}

impl AuthApi {
    pub(crate) fn new(inner: Arc<MyPosClientInner>) -> Self {
        Self { inner }
    }

    /// Returns the current [`AccessToken`](crate::apis::auth::AccessToken) used to authenticate to the myPOS APIs.
    /// If the client is not authenticated yet, a new authentication request
    /// using the configured credentials will be fired.
    pub async fn get_access_token(&self) -> Result<AccessToken, Error> {
        self.inner.authenticator.get_access_token().await
    }

    /// Discards the current access token and obtains a new one with the configured credentials.
    ///
    /// On failure, the previous token is kept.
    #[tracing::instrument(name = "Refresh Access Token", skip(self))]
    pub async fn refresh_access_token(&self) -> Result<AccessToken, Error> {
        self.inner.authenticator.acquire_access_token().await
    }
}
