use crate::common::mock_server::{MockServerState, RecordedRequest};
use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures::{
    future::{LocalBoxFuture, Ready},
    FutureExt,
};
use std::{
    future::Future,
    sync::Arc,
    task::{Context, Poll},
};

fn header_value<'a>(req: &'a ServiceRequest, name: &str) -> Result<Option<&'a str>, anyhow::Error> {
    Ok(req.headers().get(name).map(|v| v.to_str()).transpose()?)
}

/// Checks that all the requests carry the client user agent.
pub(super) async fn validate_user_agent(req: &mut ServiceRequest) -> Result<(), anyhow::Error> {
    anyhow::ensure!(
        header_value(req, "User-Agent")? == Some(concat!("mypos-rust/", env!("CARGO_PKG_VERSION"))),
        "Invalid User-Agent"
    );

    Ok(())
}

type CheckResult<'r> = LocalBoxFuture<'r, Result<(), anyhow::Error>>;

/// Pins the higher-ranked signature of a check closure.
fn check<F>(f: F) -> F
where
    F: for<'r> Fn(&'r mut ServiceRequest) -> CheckResult<'r>,
{
    f
}

/// Checks that API requests carry the client id in the `API-Key` header.
pub(super) fn validate_api_key(
    client_id: String,
) -> impl for<'r> Fn(&'r mut ServiceRequest) -> CheckResult<'r> {
    let client_id = Arc::new(client_id);

    check(move |req: &mut ServiceRequest| {
        let client_id = client_id.clone();

        Box::pin(async move {
            anyhow::ensure!(
                header_value(req, "API-Key")? == Some(client_id.as_str()),
                "Invalid or missing API-Key"
            );

            Ok(())
        })
    })
}

/// Checks that API requests carry a correlation id, and records them for later inspection.
pub(super) fn record_request(
    state: MockServerState,
) -> impl for<'r> Fn(&'r mut ServiceRequest) -> CheckResult<'r> {
    check(move |req: &mut ServiceRequest| {
        let state = state.clone();

        Box::pin(async move {
            let request_id = header_value(req, "X-Request-ID")?
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("Missing X-Request-ID"))?
                .to_string();
            let authorization = header_value(req, "Authorization")?
                .unwrap_or_default()
                .to_string();

            state.write().unwrap().requests.push(RecordedRequest {
                path: req.path().to_string(),
                request_id,
                authorization,
            });

            Ok(())
        })
    })
}

/// Helper trait used to circumvent a limitation of Rust's Higher Ranked Trait Bounds
/// in the implementation of `MiddlewareFnWrapper::call`.
/// For more info see: https://users.rust-lang.org/t/higher-rank-trait-bounds-use-bound-lifetime-in-another-generic/45121
pub(super) trait CallableAsyncFn<'r> {
    type Output: Future<Output = Result<(), anyhow::Error>> + 'r;

    fn call(&self, req: &'r mut ServiceRequest) -> Self::Output;
}

impl<'r, F, R> CallableAsyncFn<'r> for F
where
    F: Fn(&'r mut ServiceRequest) -> R,
    R: Future<Output = Result<(), anyhow::Error>> + 'r,
{
    type Output = R;

    fn call(&self, req: &'r mut ServiceRequest) -> Self::Output {
        self(req)
    }
}

/// Wrapper around a function to act as an actix middleware.
/// Requests for which the function fails are answered with `400 Bad Request`.
pub(super) struct MiddlewareFn<F> {
    inner: Arc<F>,
}

impl<F> MiddlewareFn<F>
where
    F: for<'r> CallableAsyncFn<'r>,
{
    pub fn new(inner: F) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<S, F> Transform<S, ServiceRequest> for MiddlewareFn<F>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
    F: 'static + for<'r> CallableAsyncFn<'r>,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = MiddlewareFnWrapper<S, F>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        futures::future::ok(MiddlewareFnWrapper {
            service: Arc::new(service),
            inner: self.inner.clone(),
        })
    }
}

pub(super) struct MiddlewareFnWrapper<S, F> {
    service: Arc<S>,
    inner: Arc<F>,
}

impl<S, F> Service<ServiceRequest> for MiddlewareFnWrapper<S, F>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
    F: 'static + for<'r> CallableAsyncFn<'r>,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = S::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ct: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ct)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let inner = self.inner.clone();
        let service = self.service.clone();

        async move {
            match inner.call(&mut req).await {
                Err(e) => Ok(req.into_response(HttpResponse::BadRequest().json(
                    serde_json::json!({ "code": 400, "message": e.to_string() }),
                ))),
                Ok(_) => service.call(req).await,
            }
        }
        .boxed_local()
    }
}
