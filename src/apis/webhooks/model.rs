use crate::apis::Pagination;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Webhook {
    pub id: String,
    pub created_on: String,
    pub is_active: bool,
    pub payload_url: String,
    /// Secret used to sign the notifications delivered to this webhook.
    pub secret: String,
    #[serde(default)]
    pub events: Option<Vec<WebhookEvent>>,
}

/// Event a webhook is subscribed to.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct WebhookEvent {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct WebhookList {
    pub webhooks: Vec<Webhook>,
    pub pagination: Pagination,
}

/// Changes to apply to an existing webhook. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Eq, PartialEq, Builder)]
#[builder(default, setter(into, strip_option))]
#[cfg_attr(not(feature = "compat"), non_exhaustive)]
pub struct UpdateWebhookRequest {
    pub payload_url: Option<String>,
    pub secret: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateWebhookRequest {
    /// Form fields sent to the server, with `is_active` as `"true"` or `"false"`.
    pub(crate) fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if let Some(ref payload_url) = self.payload_url {
            fields.push(("payload_url".to_string(), payload_url.clone()));
        }
        if let Some(ref secret) = self.secret {
            fields.push(("secret".to_string(), secret.clone()));
        }
        if let Some(is_active) = self.is_active {
            fields.push(("is_active".to_string(), is_active.to_string()));
        }
        fields
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Event {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct EventList {
    pub events: Vec<Event>,
    pub pagination: Pagination,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub created_on: String,
    /// Name of the event.
    pub event: String,
    #[serde(default)]
    pub filter: Option<serde_json::Value>,
    pub hook: Webhook,
}

/// Delivery attempt of an event to a webhook.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    pub event: String,
    pub payload: serde_json::Value,
    pub sent_on: String,
    pub response_code: u16,
    pub retry_count: u32,
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
}

/// Single-resource responses are wrapped in an object named after the resource.
#[derive(Deserialize)]
pub(crate) struct WebhookEnvelope {
    pub(crate) webhook: Webhook,
}

#[derive(Deserialize)]
pub(crate) struct SubscriptionEnvelope {
    pub(crate) subscription: Subscription,
}
