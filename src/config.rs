//! Loading of client settings from the process environment.
//!
//! | Variable                  | Meaning                                  |
//! |---------------------------|------------------------------------------|
//! | `MYPOS_CLIENT_ID`         | Client id (required)                     |
//! | `MYPOS_CLIENT_SECRET`     | Client secret (required)                 |
//! | `MYPOS_REQUEST_ID`        | Correlation id attached to log spans     |
//! | `MYPOS_AUTH_BASE_URL`     | Overrides the authentication base URL    |
//! | `MYPOS_API_BASE_URL`      | Overrides the transactions base URL      |
//! | `MYPOS_WEBHOOKS_BASE_URL` | Overrides the webhooks base URL          |

use crate::{
    apis::auth::{Credentials, Token},
    client::{Environment, MyPosClient, MyPosClientBuilder},
    Error,
};
use reqwest::Url;
use serde::Deserialize;

/// Prefix shared by all the environment variables read by [`ClientConfig::from_env`].
pub const ENV_PREFIX: &str = "MYPOS";

/// Settings needed to build a [`MyPosClient`](crate::client::MyPosClient).
#[derive(Deserialize, Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Token,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub auth_base_url: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub webhooks_base_url: Option<String>,
}

impl ClientConfig {
    /// Reads the configuration from `MYPOS_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let config = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Client identity described by this configuration.
    pub fn credentials(&self) -> Credentials {
        let credentials = Credentials::new(self.client_id.clone(), self.client_secret.clone());
        match self.request_id {
            Some(ref request_id) => credentials.with_request_id(request_id.clone()),
            None => credentials,
        }
    }

    /// Environment described by this configuration.
    ///
    /// Without any URL override this is [`Environment::Live`](crate::client::Environment::Live);
    /// otherwise the URLs that are not overridden keep their live value.
    pub fn environment(&self) -> Result<Environment, Error> {
        if self.auth_base_url.is_none()
            && self.api_base_url.is_none()
            && self.webhooks_base_url.is_none()
        {
            return Ok(Environment::Live);
        }

        let live = Environment::Live;
        Ok(Environment::Custom {
            auth_url: parse_url(self.auth_base_url.as_deref(), live.auth_url())?,
            api_url: parse_url(self.api_base_url.as_deref(), live.api_url())?,
            webhooks_url: parse_url(self.webhooks_base_url.as_deref(), live.webhooks_url())?,
        })
    }

    /// Returns a builder configured with these settings.
    pub fn into_builder(self) -> Result<MyPosClientBuilder, Error> {
        let environment = self.environment()?;
        Ok(MyPosClient::builder(self.credentials()).with_environment(environment))
    }
}

fn parse_url(value: Option<&str>, default: Url) -> Result<Url, Error> {
    match value {
        Some(value) => Url::parse(value).map_err(|e| {
            Error::ConfigError(::config::ConfigError::Message(format!(
                "Invalid URL {:?}: {}",
                value, e
            )))
        }),
        None => Ok(default),
    }
}
