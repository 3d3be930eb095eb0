//! Client side of the gateway wire contract.

use crate::api::chat::schemas::ChatRequest;
use crate::api::completions::schemas::AssessRequest;
use crate::core::models::{ProficiencyAnalysis, TutorReply};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Longer than the gateway's own upstream timeout, so its fallback reply can arrive.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("gateway request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("gateway returned status {0}")]
    Status(u16),

    #[error("malformed gateway reply: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<TutorReply, ClientError>;

    async fn assess(&self, request: &AssessRequest) -> Result<ProficiencyAnalysis, ClientError>;
}

/// Talks to a gateway over HTTP, e.g. `HttpGateway::new("http://localhost:3000")`.
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpGateway::with_timeout(base_url, DEFAULT_GATEWAY_TIMEOUT)
    }

    /// A timed-out call fails like any other network error.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            error!("failed to build gateway client, using defaults: {e}");
            Client::new()
        });
        HttpGateway::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        HttpGateway {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {url}");

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl GatewayTransport for HttpGateway {
    async fn chat(&self, request: &ChatRequest) -> Result<TutorReply, ClientError> {
        self.post_json("/api/chat", request).await
    }

    async fn assess(&self, request: &AssessRequest) -> Result<ProficiencyAnalysis, ClientError> {
        self.post_json("/api/assess", request).await
    }
}
