use crate::{
    apis::auth::{AccessToken, Credentials, Token},
    common::endpoint_url,
    error::{ApiError, AuthenticationFailure, Error},
};
use reqwest::{StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use tokio::sync::{mpsc, oneshot};

type Reply = oneshot::Sender<Result<AccessToken, Error>>;

/// Manager for credentials and access tokens.
///
/// All the token operations are forwarded to a single background task owning the
/// credential slot, so refreshes triggered by concurrent callers are serialized.
#[derive(Debug, Clone)]
pub struct Authenticator {
    tx: mpsc::UnboundedSender<(Command, Reply)>,
    pub(crate) client_id: String,
}

/// Request sent to the background task.
#[derive(Debug, Clone, Copy)]
enum Command {
    /// Return the current token, acquiring one if the slot is empty.
    Ensure,
    /// Replace the token whose generation is `stale`, unless it has already been replaced.
    /// With `stale: None` a new token is always acquired.
    Refresh { stale: Option<u64> },
}

impl Authenticator {
    /// Starts a new authenticator with the given client identity.
    pub fn new(client: ClientWithMiddleware, auth_url: Url, credentials: Credentials) -> Self {
        let client_id = credentials.client_id().to_string();
        let state = AuthenticatorState {
            client,
            auth_url,
            credentials,
            slot: CredentialSlot::Absent,
            generation: 0,
        };

        // Spawn a long running task which will running forever until the authenticator is dropped
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            process_loop(state, rx).await;
        });

        Self { tx, client_id }
    }

    /// Returns the current access token, performing a grant exchange if no token
    /// has been obtained yet.
    ///
    /// Concurrent calls to `get_access_token` are batched into one single request to the auth server.
    pub async fn get_access_token(&self) -> Result<AccessToken, Error> {
        self.send(Command::Ensure).await
    }

    /// Replaces a token that the API reported as unusable.
    ///
    /// If another caller already replaced `stale`, the newer token is returned without
    /// contacting the auth server, so any number of callers holding the same stale token
    /// cause exactly one grant exchange.
    pub async fn refresh_access_token(&self, stale: &AccessToken) -> Result<AccessToken, Error> {
        self.send(Command::Refresh {
            stale: Some(stale.generation),
        })
        .await
    }

    /// Unconditionally performs a new grant exchange and stores its result.
    pub async fn acquire_access_token(&self) -> Result<AccessToken, Error> {
        self.send(Command::Refresh { stale: None }).await
    }

    async fn send(&self, command: Command) -> Result<AccessToken, Error> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send((command, tx))
            .map_err(|_| Error::Other(anyhow::anyhow!("Authenticator task is not running")))?;

        rx.await
            .map_err(|_| Error::Other(anyhow::anyhow!("Authenticator task dropped the reply")))?
    }
}

/// Credential slot. A token is never deleted, only overwritten by a newer one.
#[derive(Debug)]
enum CredentialSlot {
    /// No grant exchange has succeeded yet.
    Absent,
    /// Token assumed to be valid until a response reports otherwise.
    Assumed(AccessToken),
    /// A grant exchange is in flight; `previous` is restored if it fails.
    Refreshing { previous: Option<AccessToken> },
}

/// Internal state of the authenticator.
struct AuthenticatorState {
    client: ClientWithMiddleware,
    auth_url: Url,
    credentials: Credentials,
    slot: CredentialSlot,
    generation: u64,
}

async fn process_loop(
    mut state: AuthenticatorState,
    mut rx: mpsc::UnboundedReceiver<(Command, Reply)>,
) {
    // Infinite loop waiting for commands from the main client
    while let Some((command, reply)) = rx.recv().await {
        if reply.send(process_command(&mut state, command).await).is_err() {
            tracing::warn!("Receiver dropped before the reply");
        }
    }
}

async fn process_command(
    state: &mut AuthenticatorState,
    command: Command,
) -> Result<AccessToken, Error> {
    if let CredentialSlot::Assumed(token) = &state.slot {
        match command {
            Command::Ensure => {
                tracing::debug!("Reusing existing access token");
                return Ok(token.clone());
            }
            Command::Refresh { stale: Some(stale) } if token.generation > stale => {
                tracing::debug!(
                    generation = token.generation,
                    "Access token already refreshed by another request"
                );
                return Ok(token.clone());
            }
            Command::Refresh { .. } => {}
        }
    }

    let previous = match std::mem::replace(&mut state.slot, CredentialSlot::Absent) {
        CredentialSlot::Assumed(token) => Some(token),
        CredentialSlot::Absent | CredentialSlot::Refreshing { .. } => None,
    };
    state.slot = CredentialSlot::Refreshing { previous };

    match exchange_client_credentials(state).await {
        Ok(token) => {
            state.generation += 1;
            let token = AccessToken {
                token,
                generation: state.generation,
            };
            state.slot = CredentialSlot::Assumed(token.clone());

            tracing::info!(generation = token.generation, "Got new access token");
            Ok(token)
        }
        Err(e) => {
            if let CredentialSlot::Refreshing {
                previous: Some(token),
            } = std::mem::replace(&mut state.slot, CredentialSlot::Absent)
            {
                state.slot = CredentialSlot::Assumed(token);
            }
            Err(e)
        }
    }
}

/// Performs the client credentials grant exchange against `/oauth/token`.
#[tracing::instrument(
    name = "Client Credentials Grant",
    level = "debug",
    skip(state),
    fields(
        client_id = %state.credentials.client_id(),
        request_id = ?state.credentials.request_id(),
    )
)]
async fn exchange_client_credentials(state: &AuthenticatorState) -> Result<Token, Error> {
    let url = endpoint_url(&state.auth_url, "/oauth/token")?;

    let res = state
        .client
        .post(url)
        .basic_auth(
            state.credentials.client_id(),
            Some(state.credentials.client_secret().expose_secret()),
        )
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(transport_error)?;

    let status = res.status();
    let body = res
        .bytes()
        .await
        .map_err(|e| transport_error(e.into()))?;

    if status != StatusCode::OK {
        tracing::error!(status = status.as_u16(), "Failed to get access token");
        return Err(Error::AuthenticationError(AuthenticationFailure::Rejected(
            ApiError::from_body(status.as_u16(), &body, None),
        )));
    }

    let access_token = serde_json::from_slice::<RawAuthenticationResponse>(&body)
        .ok()
        .and_then(|res| res.access_token)
        .filter(|token| !token.is_empty());

    match access_token {
        Some(token) => Ok(Token::new(token)),
        None => {
            tracing::error!("No access token found in response");
            Err(Error::AuthenticationError(AuthenticationFailure::Rejected(
                ApiError::from_body(status.as_u16(), &body, None),
            )))
        }
    }
}

fn transport_error(e: reqwest_middleware::Error) -> Error {
    tracing::error!(error = %e, "Failed to reach the authorization server");
    Error::AuthenticationError(AuthenticationFailure::Transport(e))
}

/// Body of a successful response to a grant exchange.
#[derive(serde::Deserialize)]
struct RawAuthenticationResponse {
    access_token: Option<String>,
}
