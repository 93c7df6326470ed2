use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Static client identity used to authenticate against myPOS APIs.
///
/// It is set once when the client is built and never mutated afterwards.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Credentials {
    client_id: String,
    client_secret: Token,
    #[serde(default)]
    request_id: Option<String>,
}

impl Credentials {
    /// Creates a new set of client credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<Token>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            request_id: None,
        }
    }

    /// Attaches a correlation id identifying this client instance in logs.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns a reference to the client id stored in these [`Credentials`](crate::apis::auth::Credentials).
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns a reference to the client secret stored in these [`Credentials`](crate::apis::auth::Credentials).
    pub fn client_secret(&self) -> &Token {
        &self.client_secret
    }

    /// Returns the correlation id configured for this client, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

/// Opaque bearer token used to authenticate to myPOS APIs.
///
/// No expiry is tracked: a token is assumed valid until a response says otherwise.
/// Each token obtained by the client carries a generation number, increasing
/// with every successful grant exchange.
#[derive(Clone, Debug)]
pub struct AccessToken {
    pub(crate) token: Token,
    pub(crate) generation: u64,
}

impl AccessToken {
    /// Actual token contents held by this `AccessToken` instance.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Sequence number of the grant exchange that produced this token, starting from 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Deref for AccessToken {
    type Target = Token;

    fn deref(&self) -> &Self::Target {
        self.token()
    }
}

/// Wrapper for a secret string that makes it harder to accidentally expose secrets
/// and ensures the backing memory is wiped on drop.
///
/// It is a wrapper around a [`secrecy::Secret`](secrecy::Secret).
///
/// ```rust
/// # use mypos_rust::apis::auth::Token;
/// let token = Token::new("supersecret");
///
/// // The secret is redacted when printed with Debug
/// assert!(!format!("{:?}", token).contains("supersecret"));
///
/// // But can be manually exposed calling `expose_secret()`
/// assert_eq!(token.expose_secret(), "supersecret");
/// ```
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Token(#[serde(serialize_with = "serialize_secret")] Secret<String>);

impl Token {
    /// Wraps a secret string in a new `Token`.
    pub fn new<T: Into<String>>(s: T) -> Self {
        Self(Secret::new(s.into()))
    }

    /// Exposes a reference to the underlying secret string.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl<T> From<T> for Token
where
    T: Into<String>,
{
    fn from(s: T) -> Self {
        Token::new(s)
    }
}

fn serialize_secret<S>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::ser::Serializer,
{
    secret.expose_secret().serialize(serializer)
}
