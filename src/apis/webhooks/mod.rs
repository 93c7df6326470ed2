//! APIs and models related to webhooks, event subscriptions and notifications.

mod api;
mod model;

pub use api::WebhooksApi;
pub use model::*;
