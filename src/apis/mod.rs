//! Clients for the various myPOS APIs.

use crate::{authenticator::Authenticator, client::Environment, executor::RequestExecutor};
use std::fmt::{Debug, Formatter};

pub mod auth;
pub mod transactions;
pub mod webhooks;

/// Pagination information attached to list responses.
///
/// Depending on the endpoint, the page size is reported either as `size` or as `page_size`.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Pagination {
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    pub total: u64,
}

pub(crate) struct MyPosClientInner {
    pub(crate) executor: RequestExecutor,
    pub(crate) authenticator: Authenticator,
    pub(crate) environment: Environment,
}

impl Debug for MyPosClientInner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MyPosClientInner")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
