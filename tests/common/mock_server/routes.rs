use crate::common::{
    mock_server::{MockServerConfiguration, MockServerState},
    StaleSignal,
};
use actix_web::{web, HttpRequest, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use mypos_rust::apis::webhooks::{Subscription, Webhook};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Deserialize)]
pub(super) struct PageQuery {
    page: Option<u32>,
    size: Option<u32>,
}

impl PageQuery {
    fn pagination(&self, total: usize) -> serde_json::Value {
        json!({
            "page": self.page.unwrap_or(1),
            "size": self.size.unwrap_or(20),
            "total": total
        })
    }
}

/// Checks the bearer token of an API request. Returns the response to send back
/// if the token is not the one currently valid.
fn authorize(req: &HttpRequest, state: &MockServerState) -> Option<HttpResponse> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let state = state.read().unwrap();
    match token {
        Some(token) if state.access_token.as_deref() == Some(token) => None,
        Some(token) => match state.expired_tokens.get(token) {
            Some(StaleSignal::Code503) => Some(HttpResponse::Ok().json(json!({
                "code": 503,
                "message": "Access token expired"
            }))),
            Some(StaleSignal::Unauthorized) | None => Some(unauthorized()),
        },
        None => Some(unauthorized()),
    }
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "code": 401,
        "message": "Invalid access token"
    }))
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "code": 404,
        "message": message
    }))
}

macro_rules! authorize {
    ($req:expr, $state:expr) => {
        if let Some(res) = authorize(&$req, &$state) {
            return res;
        }
    };
}

/// POST /oauth/token
pub(super) async fn post_token(
    req: HttpRequest,
    configuration: web::Data<MockServerConfiguration>,
    state: web::Data<MockServerState>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    let credentials = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|v| STANDARD.decode(v).ok())
        .and_then(|v| String::from_utf8(v).ok());
    let expected = format!("{}:{}", configuration.client_id, configuration.client_secret);

    if credentials.as_deref() != Some(expected.as_str()) {
        return HttpResponse::Unauthorized().json(json!({
            "error": "invalid_client",
            "error_description": "Client authentication failed"
        }));
    }

    if form.get("grant_type").map(String::as_str) != Some("client_credentials") {
        return HttpResponse::BadRequest().json(json!({
            "error": "unsupported_grant_type"
        }));
    }

    // Every grant replaces the previous token
    let access_token = Uuid::new_v4().to_string();
    let mut state = state.write().unwrap();
    if let Some(previous) = state.access_token.replace(access_token.clone()) {
        state
            .expired_tokens
            .insert(previous, StaleSignal::Unauthorized);
    }
    state.grants += 1;

    HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600
    }))
}

#[derive(Deserialize)]
pub(super) struct ListTransactionsQuery {
    size: Option<usize>,
}

/// GET /v1/transactions
pub(super) async fn list_transactions(
    req: HttpRequest,
    configuration: web::Data<MockServerConfiguration>,
    state: web::Data<MockServerState>,
    query: web::Query<ListTransactionsQuery>,
    body: web::Bytes,
) -> HttpResponse {
    authorize!(req, state);

    let filters = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(filters) => filters,
            Err(_) => return HttpResponse::BadRequest().finish(),
        }
    };
    let types = filters["transaction_types"]
        .as_str()
        .map(|types| types.split(',').map(str::to_string).collect::<Vec<_>>());
    let sign = filters["sign"].as_str();
    let size = query.size.unwrap_or(20);

    let matching = configuration
        .transactions
        .iter()
        .map(|(transaction, _)| transaction)
        .filter(|t| {
            types.as_ref().map_or(true, |types| {
                t.transaction_type
                    .map_or(false, |tt| types.iter().any(|code| code == tt.code()))
            })
        })
        .filter(|t| sign.map_or(true, |sign| t.sign == sign))
        .collect::<Vec<_>>();

    HttpResponse::Ok().json(json!({
        "transactions": matching.iter().take(size).collect::<Vec<_>>(),
        "pagination": {
            "page": 1,
            "size": size,
            "total": matching.len()
        }
    }))
}

/// GET /v1/transactions/{reference}
pub(super) async fn get_transaction_details(
    req: HttpRequest,
    configuration: web::Data<MockServerConfiguration>,
    state: web::Data<MockServerState>,
    path: web::Path<String>,
) -> HttpResponse {
    authorize!(req, state);

    let reference = path.into_inner();
    configuration
        .transactions
        .iter()
        .find(|(transaction, _)| transaction.payment_reference == reference)
        .map_or_else(
            || not_found("Transaction not found"),
            |(_, details)| HttpResponse::Ok().json(json!({ "details": details })),
        )
}

/// POST /v1/webhooks
pub(super) async fn create_webhook(
    req: HttpRequest,
    state: web::Data<MockServerState>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    authorize!(req, state);

    let (payload_url, secret) = match (form.get("payload_url"), form.get("secret")) {
        (Some(payload_url), Some(secret)) => (payload_url.clone(), secret.clone()),
        _ => return HttpResponse::BadRequest().finish(),
    };

    let webhook = Webhook {
        id: Uuid::new_v4().to_string(),
        created_on: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        is_active: true,
        payload_url,
        secret,
        events: None,
    };
    state
        .write()
        .unwrap()
        .webhooks
        .insert(webhook.id.clone(), webhook.clone());

    HttpResponse::Ok().json(json!({ "webhook": webhook }))
}

/// GET /v1/webhooks
pub(super) async fn list_webhooks(
    req: HttpRequest,
    state: web::Data<MockServerState>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    authorize!(req, state);

    let state = state.read().unwrap();
    let mut webhooks = state.webhooks.values().cloned().collect::<Vec<_>>();
    webhooks.sort_by(|a, b| a.id.cmp(&b.id));

    HttpResponse::Ok().json(json!({
        "webhooks": webhooks,
        "pagination": query.pagination(webhooks.len())
    }))
}

/// GET /v1/webhooks/{id}
pub(super) async fn get_webhook(
    req: HttpRequest,
    state: web::Data<MockServerState>,
    path: web::Path<String>,
) -> HttpResponse {
    authorize!(req, state);

    let id = path.into_inner();
    state.read().unwrap().webhooks.get(&id).map_or_else(
        || not_found("Webhook not found"),
        |webhook| HttpResponse::Ok().json(json!({ "webhook": webhook })),
    )
}

/// PATCH /v1/webhooks/{id}
pub(super) async fn update_webhook(
    req: HttpRequest,
    state: web::Data<MockServerState>,
    path: web::Path<String>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    authorize!(req, state);

    let id = path.into_inner();
    let mut state = state.write().unwrap();
    let webhook = match state.webhooks.get_mut(&id) {
        Some(webhook) => webhook,
        None => return not_found("Webhook not found"),
    };

    if let Some(payload_url) = form.get("payload_url") {
        webhook.payload_url = payload_url.clone();
    }
    if let Some(secret) = form.get("secret") {
        webhook.secret = secret.clone();
    }
    match form.get("is_active").map(String::as_str) {
        Some("true") => webhook.is_active = true,
        Some("false") => webhook.is_active = false,
        Some(_) => return HttpResponse::BadRequest().finish(),
        None => {}
    }

    HttpResponse::Ok().json(json!({ "webhook": webhook }))
}

/// DELETE /v1/webhooks/{id}
pub(super) async fn delete_webhook(
    req: HttpRequest,
    state: web::Data<MockServerState>,
    path: web::Path<String>,
) -> HttpResponse {
    authorize!(req, state);

    let id = path.into_inner();
    let mut state = state.write().unwrap();
    match state.webhooks.remove(&id) {
        Some(_) => {
            state.subscriptions.retain(|_, s| s.hook.id != id);
            HttpResponse::NoContent().finish()
        }
        None => not_found("Webhook not found"),
    }
}

/// GET /v1/events
pub(super) async fn list_events(
    req: HttpRequest,
    configuration: web::Data<MockServerConfiguration>,
    state: web::Data<MockServerState>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    authorize!(req, state);

    HttpResponse::Ok().json(json!({
        "events": configuration.events,
        "pagination": query.pagination(configuration.events.len())
    }))
}

/// POST /v1/subscriptions
pub(super) async fn subscribe(
    req: HttpRequest,
    configuration: web::Data<MockServerConfiguration>,
    state: web::Data<MockServerState>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    authorize!(req, state);

    let event = match form
        .get("event_id")
        .and_then(|id| configuration.events.iter().find(|e| &e.id == id))
    {
        Some(event) => event,
        None => return not_found("Event not found"),
    };

    let mut state = state.write().unwrap();
    let hook = match form.get("webhook_id") {
        Some(webhook_id) => state.webhooks.get(webhook_id),
        None => state.webhooks.values().next(),
    };
    let hook = match hook {
        Some(hook) => hook.clone(),
        None => return not_found("Webhook not found"),
    };

    let subscription = Subscription {
        id: Uuid::new_v4().to_string(),
        created_on: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        event: event.name.clone(),
        filter: None,
        hook,
    };
    state
        .subscriptions
        .insert(subscription.id.clone(), subscription.clone());

    HttpResponse::Ok().json(json!({ "subscription": subscription }))
}

/// PUT /v1/subscriptions/{id}
pub(super) async fn update_subscription(
    req: HttpRequest,
    state: web::Data<MockServerState>,
    path: web::Path<String>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    authorize!(req, state);

    let filter = match form
        .get("filter")
        .map(|f| serde_json::from_str::<serde_json::Value>(f))
    {
        Some(Ok(filter)) => Some(filter),
        Some(Err(_)) => return HttpResponse::BadRequest().finish(),
        None => None,
    };

    let id = path.into_inner();
    let mut state = state.write().unwrap();
    match state.subscriptions.get_mut(&id) {
        Some(subscription) => {
            subscription.filter = filter;
            HttpResponse::Ok().json(json!({ "subscription": subscription }))
        }
        None => not_found("Subscription not found"),
    }
}

/// DELETE /v1/subscriptions/{id}
pub(super) async fn unsubscribe(
    req: HttpRequest,
    state: web::Data<MockServerState>,
    path: web::Path<String>,
) -> HttpResponse {
    authorize!(req, state);

    let id = path.into_inner();
    match state.write().unwrap().subscriptions.remove(&id) {
        Some(_) => HttpResponse::NoContent().finish(),
        None => not_found("Subscription not found"),
    }
}

/// GET /v1/notifications
pub(super) async fn list_notifications(
    req: HttpRequest,
    state: web::Data<MockServerState>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    authorize!(req, state);

    // One delivery per subscription
    let state = state.read().unwrap();
    let notifications = state
        .subscriptions
        .values()
        .map(|s| {
            json!({
                "event": s.event,
                "payload": { "subscription_id": s.id },
                "sent_on": s.created_on,
                "response_code": 200,
                "retry_count": 0,
                "url": s.hook.payload_url
            })
        })
        .collect::<Vec<_>>();

    HttpResponse::Ok().json(json!({
        "notifications": notifications,
        "pagination": query.pagination(notifications.len())
    }))
}
