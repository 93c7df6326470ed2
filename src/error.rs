//! Standard errors used by all functions in the crate.

use std::fmt;

/// Error collecting all possible failures of the myPOS client.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Reqwest error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    /// The client credentials grant exchange failed or did not yield an access token.
    #[error("Authentication failed: {0}")]
    AuthenticationError(AuthenticationFailure),
    /// A myPOS API endpoint returned a non-success response after credential recovery.
    #[error("{0}")]
    RequestError(#[from] ApiError),
    /// A successful response could not be turned into the expected shape.
    #[error("Invalid response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    /// Client configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] config::ConfigError),
    /// Catch-all variant for unexpected errors.
    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<reqwest_middleware::Error> for Error {
    fn from(e: reqwest_middleware::Error) -> Self {
        match e {
            reqwest_middleware::Error::Reqwest(e) => Error::HttpError(e),
            reqwest_middleware::Error::Middleware(e) => {
                e.downcast::<Error>().unwrap_or_else(Error::Other)
            }
        }
    }
}

impl From<Error> for reqwest_middleware::Error {
    fn from(e: Error) -> Self {
        reqwest_middleware::Error::Middleware(e.into())
    }
}

/// Reason why a client credentials grant exchange failed.
#[derive(thiserror::Error, Debug)]
pub enum AuthenticationFailure {
    /// The authorization server answered without handing out an access token.
    #[error("{0}")]
    Rejected(ApiError),
    /// The authorization server could not be reached or its response could not be read.
    #[error("HTTP error: {0}")]
    Transport(#[source] reqwest_middleware::Error),
}

impl AuthenticationFailure {
    /// Error returned by the authorization server, if it answered.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            AuthenticationFailure::Rejected(e) => Some(e),
            AuthenticationFailure::Transport(_) => None,
        }
    }
}

/// myPOS HTTP APIs error.
#[derive(thiserror::Error, Debug, Clone)]
pub struct ApiError {
    /// HTTP status returned by the server.
    pub status: u16,
    /// Provider specific error code found in the JSON body, if any.
    pub code: Option<i64>,
    /// Human readable message found in the JSON body, if any.
    pub message: Option<String>,
    /// Value of the `X-Request-ID` header sent with the failed request.
    pub request_id: Option<String>,
    /// Raw response body, kept for diagnostics.
    pub body: String,
}

impl ApiError {
    /// Builds an error out of a status code and a raw response body,
    /// picking up the `code` and `message` fields when the body is a JSON object.
    pub(crate) fn from_body(status: u16, body: &[u8], request_id: Option<String>) -> Self {
        let json = serde_json::from_slice::<serde_json::Value>(body).ok();
        let field = |name: &str| json.as_ref().and_then(|v| v.get(name));

        Self {
            status,
            code: field("code").and_then(serde_json::Value::as_i64),
            message: field("message")
                .or_else(|| field("error_description"))
                .or_else(|| field("error"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            request_id,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "myPOS HTTP error {}", self.status)?;

        if let Some(code) = self.code {
            write!(f, " (code {})", code)?;
        }

        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }

        if let Some(ref request_id) = self.request_id {
            write!(f, "\nRequest ID: {}", request_id)?;
        }

        if !self.body.is_empty() {
            write!(f, "\nResponse body: {}", self.body)?;
        }

        Ok(())
    }
}
