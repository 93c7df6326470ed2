//! Module containing the main myPOS API client.

use crate::{
    apis::{
        auth::{AuthApi, Credentials},
        transactions::TransactionsApi,
        webhooks::WebhooksApi,
        MyPosClientInner,
    },
    authenticator::Authenticator,
    common::{DEFAULT_API_URL, DEFAULT_AUTH_URL, DEFAULT_WEBHOOKS_URL},
    executor::{RequestDescriptor, RequestExecutor, ResponseBody},
    middlewares::inject_headers::InjectHeadersMiddleware,
    Error,
};
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use reqwest_tracing::{DefaultSpanBackend, TracingMiddleware};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Client for myPOS public APIs.
///
/// Every request is authenticated with an access token obtained through the
/// client credentials grant. Tokens carry no expiry: when a response reports the
/// token as unusable (a `401` status, or a `{"code": 503}` body) the client obtains
/// a new token and sends the request once more. No other retry is ever performed.
#[derive(Debug, Clone)]
pub struct MyPosClient {
    /// Authentication APIs client.
    pub auth: AuthApi,
    /// Transactions APIs client.
    pub transactions: TransactionsApi,
    /// Webhooks APIs client.
    pub webhooks: WebhooksApi,
    inner: Arc<MyPosClientInner>,
}

impl MyPosClient {
    /// Builds a new [`MyPosClient`](crate::client::MyPosClient) with the default configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(credentials: Credentials) -> MyPosClient {
        MyPosClientBuilder::new(credentials).build()
    }

    /// Returns a new builder to configure a new [`MyPosClient`](crate::client::MyPosClient).
    pub fn builder(credentials: Credentials) -> MyPosClientBuilder {
        MyPosClientBuilder::new(credentials)
    }

    /// Environment this client is configured for.
    pub fn environment(&self) -> &Environment {
        &self.inner.environment
    }

    /// Sends an arbitrary request to a myPOS endpoint, with the same authentication
    /// and recovery behaviour as the typed API clients.
    ///
    /// Returns `None` when the server answers `204 No Content`.
    pub async fn execute(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<Option<ResponseBody>, Error> {
        self.inner.executor.execute(descriptor).await
    }

    /// Like [`execute`](Self::execute), deserializing the JSON response body into `T`.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<T, Error> {
        self.inner.executor.execute_json(descriptor).await
    }
}

/// Builder for a [`MyPosClient`](crate::client::MyPosClient).
#[derive(Debug)]
pub struct MyPosClientBuilder {
    client: reqwest::Client,
    environment: Environment,
    credentials: Credentials,
}

impl MyPosClientBuilder {
    /// Creates a new builder to configure a [`MyPosClient`](crate::client::MyPosClient).
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            environment: Environment::Live,
            credentials,
        }
    }

    /// Consumes the builder and builds a new [`MyPosClient`](crate::client::MyPosClient).
    ///
    /// No request is sent: the first access token is obtained on first use.
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> MyPosClient {
        let client = build_client_with_middleware(self.client);

        let authenticator = Authenticator::new(
            client.clone(),
            self.environment.auth_url(),
            self.credentials,
        );
        let executor = RequestExecutor::new(
            client,
            authenticator.clone(),
            self.environment.api_url(),
        );

        let inner = Arc::new(MyPosClientInner {
            executor,
            authenticator,
            environment: self.environment,
        });

        MyPosClient {
            auth: AuthApi::new(inner.clone()),
            transactions: TransactionsApi::new(inner.clone()),
            webhooks: WebhooksApi::new(inner.clone()),
            inner,
        }
    }

    /// Builds the client and obtains a first access token before returning it.
    ///
    /// Fails with [`Error::AuthenticationError`](crate::Error::AuthenticationError)
    /// if the credentials are rejected.
    #[tracing::instrument(name = "Connect", skip(self))]
    pub async fn connect(self) -> Result<MyPosClient, Error> {
        let client = self.build();
        client.inner.authenticator.get_access_token().await?;
        Ok(client)
    }

    /// Sets a specific reqwest [`Client`](reqwest::Client) to use.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Sets the environment to which this client should connect.
    ///
    /// Defaults to: [`Environment::Live`](crate::client::Environment::Live)
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}

/// myPOS environment to which a [`MyPosClient`](crate::client::MyPosClient) should connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// myPOS production environment.
    Live,
    /// Custom environment. This variant is mainly used for tests.
    Custom {
        auth_url: Url,
        api_url: Url,
        webhooks_url: Url,
    },
}

impl Environment {
    /// Builds a custom environment where all the URLs are the same.
    pub fn from_single_url(url: &Url) -> Environment {
        Environment::Custom {
            auth_url: url.clone(),
            api_url: url.clone(),
            webhooks_url: url.clone(),
        }
    }

    /// Base URL for the client credentials grant exchange.
    pub fn auth_url(&self) -> Url {
        match self {
            Environment::Live => Url::parse(DEFAULT_AUTH_URL).unwrap(),
            Environment::Custom { auth_url, .. } => auth_url.clone(),
        }
    }

    /// Base URL for transactions and the other merchant APIs.
    pub fn api_url(&self) -> Url {
        match self {
            Environment::Live => Url::parse(DEFAULT_API_URL).unwrap(),
            Environment::Custom { api_url, .. } => api_url.clone(),
        }
    }

    /// Base URL for webhooks management.
    pub fn webhooks_url(&self) -> Url {
        match self {
            Environment::Live => Url::parse(DEFAULT_WEBHOOKS_URL).unwrap(),
            Environment::Custom { webhooks_url, .. } => webhooks_url.clone(),
        }
    }
}

fn build_client_with_middleware(client: reqwest::Client) -> ClientWithMiddleware {
    reqwest_middleware::ClientBuilder::new(client)
        .with(TracingMiddleware::<DefaultSpanBackend>::new())
        .with(InjectHeadersMiddleware::new())
        .build()
}
