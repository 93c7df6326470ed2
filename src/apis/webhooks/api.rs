use super::model::{SubscriptionEnvelope, WebhookEnvelope};
use crate::{
    apis::{
        webhooks::{
            EventList, NotificationList, Subscription, UpdateWebhookRequest, Webhook, WebhookList,
        },
        MyPosClientInner,
    },
    executor::RequestDescriptor,
    signature::SignatureVerifier,
    Error,
};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use urlencoding::encode;

/// myPOS Webhooks APIs client.
///
/// All the requests are sent to the webhooks base URL of the configured
/// [`Environment`](crate::client::Environment).
#[derive(Clone, Debug)]
pub struct WebhooksApi {
    inner: Arc<MyPosClientInner>,
}

impl WebhooksApi {
    pub(crate) fn new(inner: Arc<MyPosClientInner>) -> Self {
        Self { inner }
    }

    /// Registers a new webhook. Notifications delivered to `payload_url` will be signed with `secret`.
    #[tracing::instrument(name = "Create Webhook", skip(self, secret))]
    pub async fn create(&self, payload_url: &str, secret: &str) -> Result<Webhook, Error> {
        let descriptor = self.descriptor(RequestDescriptor::post("/v1/webhooks")).with_form(vec![
            ("payload_url".to_string(), payload_url.to_string()),
            ("secret".to_string(), secret.to_string()),
        ]);

        let res: WebhookEnvelope = self.inner.executor.execute_json(&descriptor).await?;
        Ok(res.webhook)
    }

    /// Lists the registered webhooks.
    #[tracing::instrument(name = "List Webhooks", skip(self))]
    pub async fn list(&self, page: u32, size: u32) -> Result<WebhookList, Error> {
        let descriptor = self
            .descriptor(RequestDescriptor::get("/v1/webhooks"))
            .with_query("page", page)
            .with_query("size", size);

        self.inner.executor.execute_json(&descriptor).await
    }

    /// Gets a single webhook by its id.
    #[tracing::instrument(name = "Get Webhook", skip(self))]
    pub async fn get(&self, webhook_id: &str) -> Result<Webhook, Error> {
        let descriptor = self.descriptor(RequestDescriptor::get(format!(
            "/v1/webhooks/{}",
            encode(webhook_id)
        )));

        let res: WebhookEnvelope = self.inner.executor.execute_json(&descriptor).await?;
        Ok(res.webhook)
    }

    /// Updates an existing webhook. To stop deliveries without deleting the webhook,
    /// set `is_active` to `false`.
    #[tracing::instrument(name = "Update Webhook", skip(self, request))]
    pub async fn update(
        &self,
        webhook_id: &str,
        request: &UpdateWebhookRequest,
    ) -> Result<Webhook, Error> {
        let descriptor = self
            .descriptor(RequestDescriptor::patch(format!(
                "/v1/webhooks/{}",
                encode(webhook_id)
            )))
            .with_form(request.form_fields());

        let res: WebhookEnvelope = self.inner.executor.execute_json(&descriptor).await?;
        Ok(res.webhook)
    }

    /// Deletes a webhook.
    #[tracing::instrument(name = "Delete Webhook", skip(self))]
    pub async fn delete(&self, webhook_id: &str) -> Result<(), Error> {
        let descriptor = self.descriptor(RequestDescriptor::delete(format!(
            "/v1/webhooks/{}",
            encode(webhook_id)
        )));

        self.inner.executor.execute(&descriptor).await?;
        Ok(())
    }

    /// Lists the events a webhook can subscribe to.
    #[tracing::instrument(name = "List Events", skip(self))]
    pub async fn list_events(&self, page: u32, size: u32) -> Result<EventList, Error> {
        let descriptor = self
            .descriptor(RequestDescriptor::get("/v1/events"))
            .with_query("page", page)
            .with_query("size", size);

        self.inner.executor.execute_json(&descriptor).await
    }

    /// Subscribes a webhook to an event.
    #[tracing::instrument(name = "Subscribe", skip(self))]
    pub async fn subscribe(
        &self,
        event_id: &str,
        webhook_id: Option<&str>,
    ) -> Result<Subscription, Error> {
        let mut fields = vec![("event_id".to_string(), event_id.to_string())];
        if let Some(webhook_id) = webhook_id {
            fields.push(("webhook_id".to_string(), webhook_id.to_string()));
        }
        let descriptor = self
            .descriptor(RequestDescriptor::post("/v1/subscriptions"))
            .with_form(fields);

        let res: SubscriptionEnvelope = self.inner.executor.execute_json(&descriptor).await?;
        Ok(res.subscription)
    }

    /// Replaces the filter of a subscription, for example `{"tids": ["90004889"]}`.
    ///
    /// The filter is sent JSON encoded inside the `filter` form field.
    #[tracing::instrument(name = "Update Subscription", skip(self, filter))]
    pub async fn update_subscription(
        &self,
        subscription_id: &str,
        filter: Option<&serde_json::Value>,
    ) -> Result<Subscription, Error> {
        let mut fields = Vec::new();
        if let Some(filter) = filter {
            let filter = serde_json::to_string(filter).map_err(|e| {
                Error::Other(anyhow::Error::new(e).context("Failed to serialize the filter"))
            })?;
            fields.push(("filter".to_string(), filter));
        }
        let descriptor = self
            .descriptor(RequestDescriptor::put(format!(
                "/v1/subscriptions/{}",
                encode(subscription_id)
            )))
            .with_form(fields);

        let res: SubscriptionEnvelope = self.inner.executor.execute_json(&descriptor).await?;
        Ok(res.subscription)
    }

    /// Removes a subscription.
    #[tracing::instrument(name = "Unsubscribe", skip(self))]
    pub async fn unsubscribe(&self, subscription_id: &str) -> Result<(), Error> {
        let descriptor = self.descriptor(RequestDescriptor::delete(format!(
            "/v1/subscriptions/{}",
            encode(subscription_id)
        )));

        self.inner.executor.execute(&descriptor).await?;
        Ok(())
    }

    /// Lists past deliveries of events to webhooks.
    #[tracing::instrument(name = "List Notifications", skip(self))]
    pub async fn list_notifications(&self, page: u32, size: u32) -> Result<NotificationList, Error> {
        let descriptor = self
            .descriptor(RequestDescriptor::get("/v1/notifications"))
            .with_query("page", page)
            .with_query("size", size);

        self.inner.executor.execute_json(&descriptor).await
    }

    /// Checks that a notification received by a webhook was signed with `secret`
    /// within the last five minutes.
    ///
    /// `payload` must be the request body exactly as received. No request is sent.
    pub fn verify_signature(&self, payload: &[u8], headers: &HeaderMap, secret: &str) -> bool {
        SignatureVerifier::new().verify_headers(payload, headers, secret.as_bytes())
    }

    fn descriptor(&self, descriptor: RequestDescriptor) -> RequestDescriptor {
        descriptor.with_base_url(self.inner.environment.webhooks_url())
    }
}
