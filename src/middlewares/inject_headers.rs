use crate::common::REQUEST_ID_HEADER;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, USER_AGENT},
    Request, Response,
};
use reqwest_middleware::{Middleware, Next};
use task_local_extensions::Extensions;
use uuid::Uuid;

/// Middleware to inject the `User-Agent` header to all outgoing requests,
/// and a fresh `X-Request-ID` to the ones that do not carry one already.
#[derive(Debug, Clone)]
pub struct InjectHeadersMiddleware {
    user_agent: HeaderValue,
}

impl InjectHeadersMiddleware {
    pub fn new() -> Self {
        Self {
            user_agent: HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            )),
        }
    }
}

#[async_trait]
impl Middleware for InjectHeadersMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        req.headers_mut()
            .insert(USER_AGENT, self.user_agent.clone());

        if !req.headers().contains_key(REQUEST_ID_HEADER) {
            let request_id = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .map_err(|e| reqwest_middleware::Error::Middleware(e.into()))?;
            req.headers_mut().insert(REQUEST_ID_HEADER, request_id);
        }

        next.run(req, extensions).await
    }
}
