//! Execution of authenticated requests against myPOS APIs.
//!
//! Every logical request goes through at most two network attempts: if the first
//! response reports the access token as unusable, the token is refreshed once and
//! the request is sent again. Whatever the second response says is final.

use crate::{
    apis::auth::AccessToken,
    authenticator::Authenticator,
    common::{endpoint_url, API_KEY_HEADER, REQUEST_ID_HEADER},
    error::{ApiError, Error},
};
use derive_builder::Builder;
use reqwest::{
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode, Url,
};
use reqwest_middleware::ClientWithMiddleware;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    borrow::Cow,
    fmt::{Debug, Formatter},
};
use uuid::Uuid;

/// Domain error code with which myPOS reports a stale access token in the body
/// of otherwise ordinary responses.
const STALE_TOKEN_CODE: i64 = 503;

/// Body sent along with a [`RequestDescriptor`](crate::executor::RequestDescriptor).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No content. The request is still labelled as `application/json`.
    #[default]
    Empty,
    /// JSON encoded body.
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` body.
    Form(Vec<(String, String)>),
}

/// Description of a single call to a myPOS endpoint.
///
/// Descriptors are immutable values: the executor only reads them, so the same
/// descriptor can be replayed as-is on retry.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into))]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path appended to the base URL, starting with `/`.
    pub path: String,
    /// Base URL to use instead of the API base URL of the configured environment.
    #[builder(default, setter(strip_option))]
    pub base_url: Option<Url>,
    #[builder(default)]
    pub query: Vec<(String, String)>,
    #[builder(default)]
    pub body: RequestBody,
}

impl RequestDescriptor {
    /// Creates a new descriptor with no query parameters and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            base_url: None,
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Sends this request against `base_url` instead of the environment's API URL.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Sets a JSON body, replacing any previous body.
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Serializes `body` as the JSON body of the request, replacing any previous body.
    pub fn with_json_body<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, Error> {
        let body = serde_json::to_value(body).map_err(|e| {
            Error::Other(anyhow::Error::new(e).context("Failed to serialize the request body"))
        })?;
        Ok(self.with_json(body))
    }

    /// Sets a form encoded body, replacing any previous body.
    pub fn with_form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }
}

/// Body of a response, parsed as JSON when possible.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Parsed(serde_json::Value),
    Unparsed(Vec<u8>),
}

impl ResponseBody {
    /// Parses `bytes` as JSON, keeping the raw bytes if that fails.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => ResponseBody::Parsed(value),
            Err(_) => ResponseBody::Unparsed(bytes.to_vec()),
        }
    }

    /// Returns the JSON value, if the body could be parsed.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Parsed(value) => Some(value),
            ResponseBody::Unparsed(_) => None,
        }
    }

    /// Returns the body as text.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            ResponseBody::Parsed(value) => Cow::Owned(value.to_string()),
            ResponseBody::Unparsed(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    /// Domain error code carried by a JSON object body.
    ///
    /// Integral floats such as `503.0` count as the same code as `503`.
    fn code(&self) -> Option<i64> {
        let code = self.as_json()?.get("code")?;
        code.as_i64().or_else(|| {
            code.as_f64()
                .filter(|code| code.fract() == 0.0)
                .map(|code| code as i64)
        })
    }
}

/// Classification of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    /// The access token used for the request is no longer usable.
    AuthInvalid,
    ClientOrServerError,
}

impl Classification {
    /// Classifies a response from its status code and body.
    ///
    /// A `401` status or a JSON object body with `"code": 503` mean the token is
    /// unusable. Bodies that are not JSON are judged by the status code alone.
    pub fn of(status: StatusCode, body: &ResponseBody) -> Self {
        if status == StatusCode::UNAUTHORIZED || body.code() == Some(STALE_TOKEN_CODE) {
            Classification::AuthInvalid
        } else if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            Classification::Success
        } else {
            Classification::ClientOrServerError
        }
    }
}

/// Position of a network call within one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

/// Outcome of a single network call.
struct AttemptResponse {
    status: StatusCode,
    raw: Vec<u8>,
    body: ResponseBody,
    classification: Classification,
}

impl AttemptResponse {
    /// Terminal mapping of the last attempt of a logical request.
    fn into_result(self, request_id: String) -> Result<Option<ResponseBody>, Error> {
        match self.classification {
            Classification::Success if self.status == StatusCode::NO_CONTENT => Ok(None),
            Classification::Success => Ok(Some(self.body)),
            Classification::AuthInvalid | Classification::ClientOrServerError => {
                tracing::error!(
                    status = self.status.as_u16(),
                    classification = ?self.classification,
                    "Request failed"
                );
                Err(Error::RequestError(ApiError::from_body(
                    self.status.as_u16(),
                    &self.raw,
                    Some(request_id),
                )))
            }
        }
    }
}

/// Executes [`RequestDescriptor`](crate::executor::RequestDescriptor)s with the current access token,
/// recovering once from an unusable token.
#[derive(Clone)]
pub(crate) struct RequestExecutor {
    client: ClientWithMiddleware,
    authenticator: Authenticator,
    api_url: Url,
}

impl Debug for RequestExecutor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("authenticator", &self.authenticator)
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    pub(crate) fn new(client: ClientWithMiddleware, authenticator: Authenticator, api_url: Url) -> Self {
        Self {
            client,
            authenticator,
            api_url,
        }
    }

    /// Executes one logical request.
    ///
    /// Returns `None` for `204 No Content` responses.
    #[tracing::instrument(
        name = "Execute Request",
        skip(self, descriptor),
        fields(method = %descriptor.method, path = %descriptor.path)
    )]
    pub(crate) async fn execute(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<Option<ResponseBody>, Error> {
        // The same correlation id is used for the retry
        let request_id = Uuid::new_v4().to_string();

        let token = self.authenticator.get_access_token().await?;
        let first = self
            .attempt(descriptor, &token, &request_id, Attempt::First)
            .await?;

        let last = match first.classification {
            Classification::AuthInvalid => {
                tracing::warn!(
                    status = first.status.as_u16(),
                    generation = token.generation(),
                    "Access token expired or invalid, refreshing"
                );
                let token = self.authenticator.refresh_access_token(&token).await?;
                self.attempt(descriptor, &token, &request_id, Attempt::Retry)
                    .await?
            }
            Classification::Success | Classification::ClientOrServerError => first,
        };

        last.into_result(request_id)
    }

    /// Executes one logical request and deserializes its JSON body.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<T, Error> {
        match self.execute(descriptor).await? {
            Some(ResponseBody::Parsed(value)) => Ok(serde_json::from_value(value)?),
            Some(body @ ResponseBody::Unparsed(_)) => Err(Error::Other(anyhow::anyhow!(
                "Expected a JSON response body, got: {}",
                body.text()
            ))),
            None => Err(Error::Other(anyhow::anyhow!(
                "Expected a JSON response body, got no content"
            ))),
        }
    }

    async fn attempt(
        &self,
        descriptor: &RequestDescriptor,
        token: &AccessToken,
        request_id: &str,
        attempt: Attempt,
    ) -> Result<AttemptResponse, Error> {
        let base_url = descriptor.base_url.as_ref().unwrap_or(&self.api_url);
        let url = endpoint_url(base_url, &descriptor.path)?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Other(e.into()))?;
        authorization.set_sensitive(true);

        let builder = self
            .client
            .request(descriptor.method.clone(), url)
            .header(AUTHORIZATION, authorization)
            .header(API_KEY_HEADER, self.authenticator.client_id.as_str())
            .header(REQUEST_ID_HEADER, request_id)
            .query(&descriptor.query);
        let builder = match &descriptor.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let res = builder.send().await?;
        let status = res.status();
        let raw = res.bytes().await?.to_vec();
        let body = ResponseBody::from_bytes(&raw);
        let classification = Classification::of(status, &body);

        tracing::debug!(
            ?attempt,
            status = status.as_u16(),
            ?classification,
            "Received response"
        );

        Ok(AttemptResponse {
            status,
            raw,
            body,
            classification,
        })
    }
}
