use crate::core::error::GatewayError;
use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use di::ServiceProvider;
use di_axum::RouterServiceProviderExtensions;
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer};

pub mod chat;
pub mod completions;

/// The whole gateway: every endpoint under `/api`, permissive CORS, services from `provider`.
///
/// The CORS layer answers every `OPTIONS` request itself, so routes only carry `POST`.
pub fn app(provider: ServiceProvider) -> Router {
    Router::new()
        .nest("/api", router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION]),
        )
        .with_provider(provider)
}

pub fn router() -> Router {
    Router::new()
        .merge(chat::router())
        .merge(completions::router())
}

/// JSON request body. Unlike `axum::Json` it accepts any content type and
/// rejects with the gateway's own `{ "error": ... }` 400 body.
#[derive(Debug)]
pub struct GatewayJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for GatewayJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, GatewayError> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| GatewayError::Validation(e.body_text()))?;

        serde_json::from_slice(&body)
            .map(GatewayJson)
            .map_err(|e| GatewayError::Validation(format!("invalid request body: {e}")))
    }
}

pub async fn method_not_allowed() -> GatewayError {
    GatewayError::MethodNotAllowed
}
