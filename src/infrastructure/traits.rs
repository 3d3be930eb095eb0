//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities::ChatMessage;
use crate::infrastructure::upstream::UpstreamError;
use async_trait::async_trait;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Whether a credential is configured. Without one `complete` always fails.
    fn is_configured(&self) -> bool;

    /// Sends one completion request and returns the reply text.
    ///
    /// Exactly one upstream call is made; there is no retry.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, UpstreamError>;
}
