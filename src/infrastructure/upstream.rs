//! Anthropic Messages API client

use crate::infrastructure::config::GatewayConfig;
use crate::infrastructure::entities::{ChatMessage, CompletionRequest, CompletionResponse};
use crate::infrastructure::traits::CompletionClient;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, error};
use reqwest::Client;
use thiserror::Error;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("API key not configured")]
    MissingCredential,

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream API error: {0} {1}")]
    Status(u16, String),

    #[error("malformed upstream body: {0}")]
    MalformedBody(String),

    #[error("upstream reply has no text content")]
    EmptyContent,
}

pub struct AnthropicClient {
    http: Client,
    config: Ref<GatewayConfig>,
}

#[injectable(CompletionClient)]
impl AnthropicClient {
    #[inject]
    pub fn create(config: Ref<GatewayConfig>) -> AnthropicClient {
        let http = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .unwrap_or_else(|e| {
                error!("failed to build upstream client, using defaults: {e}");
                Client::new()
            });

        AnthropicClient { http, config }
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, UpstreamError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential)?;

        let request = CompletionRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages,
        };

        debug!("calling upstream {} with model {}", self.config.upstream_url, request.model);

        let response = self
            .http
            .post(&self.config.upstream_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status(status.as_u16(), body));
        }

        let body = response.text().await?;
        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| UpstreamError::MalformedBody(e.to_string()))?;

        parsed.first_text().ok_or(UpstreamError::EmptyContent)
    }
}
