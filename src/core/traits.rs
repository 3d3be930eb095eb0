//! DI "Interfaces"

use crate::core::error::GatewayResult;
use crate::core::models::{HistoryEntry, Language, ProficiencyAnalysis, TutorOptions, TutorReply};
use async_trait::async_trait;

#[async_trait]
pub trait TutorService: Send + Sync {
    /// Answers one learner utterance.
    ///
    /// Returns `Err` only for validation failures; every upstream problem is
    /// absorbed into a substituted reply.
    async fn reply_to_message(
        &self,
        message: &str,
        history: &[HistoryEntry],
        options: &TutorOptions,
        goals: &[String],
    ) -> GatewayResult<TutorReply>;

    /// Forwards a free-text prompt as-is and shapes the answer into a reply.
    ///
    /// Returns `Err` when the prompt is empty, no credential is configured, or
    /// the upstream cannot be reached.
    async fn reply_to_prompt(&self, prompt: &str) -> GatewayResult<TutorReply>;

    /// Assesses the learner's level from their messages.
    ///
    /// Returns `Err` only when `messages` is empty.
    async fn assess(
        &self,
        messages: &[String],
        language: Language,
    ) -> GatewayResult<ProficiencyAnalysis>;
}
