//! Implementations for the service the app needs.
//!

use crate::core::assistant::{TutorPrompt, render_assessment};
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::fallback::{fallback_reply, parse_reply};
use crate::core::models::{HistoryEntry, Language, ProficiencyAnalysis, TutorOptions, TutorReply};
use crate::core::proficiency::{self, MIN_USER_MESSAGES};
use crate::core::traits::TutorService;
use crate::infrastructure::entities::ChatMessage;
use crate::infrastructure::traits::CompletionClient;
use async_trait::async_trait;
use di::{Ref, injectable};
use log::{debug, error, info, warn};

#[injectable(TutorService)]
pub struct MyTutorService {
    client: Ref<dyn CompletionClient>,
}

impl MyTutorService {
    pub fn new(client: Ref<dyn CompletionClient>) -> Self {
        MyTutorService { client }
    }
}

#[async_trait]
impl TutorService for MyTutorService {
    async fn reply_to_message(
        &self,
        message: &str,
        history: &[HistoryEntry],
        options: &TutorOptions,
        goals: &[String],
    ) -> GatewayResult<TutorReply> {
        if message.trim().is_empty() {
            return Err(GatewayError::Validation("Message is required".to_owned()));
        }

        if !self.client.is_configured() {
            debug!("no upstream credential configured, sending canned reply");
            return Ok(fallback_reply(message, options));
        }

        let prompt = match TutorPrompt::new(message, history, options, goals).render() {
            Ok(prompt) => prompt,
            Err(e) => {
                error!("failed to render tutor prompt: {e}");
                return Ok(fallback_reply(message, options));
            }
        };

        info!(
            "calling upstream for a {} {} learner",
            options.proficiency_level,
            options.selected_language.display_name()
        );

        match self.client.complete(vec![ChatMessage::user(prompt)]).await {
            Ok(text) => Ok(parse_reply(&text, message, options).unwrap_or_else(|| {
                warn!("upstream reply is not a usable tutor reply, substituting");
                fallback_reply(message, options)
            })),
            Err(e) => {
                warn!("upstream call failed, substituting: {e}");
                Ok(fallback_reply(message, options))
            }
        }
    }

    async fn reply_to_prompt(&self, prompt: &str) -> GatewayResult<TutorReply> {
        if prompt.trim().is_empty() {
            return Err(GatewayError::Validation("Prompt is required".to_owned()));
        }

        if !self.client.is_configured() {
            error!("upstream credential is not set");
            return Err(GatewayError::Configuration("API key not configured".to_owned()));
        }

        let text = self
            .client
            .complete(vec![ChatMessage::user(prompt)])
            .await
            .map_err(|e| {
                error!("upstream call failed: {e}");
                GatewayError::Upstream(e)
            })?;

        let options = TutorOptions::default();
        Ok(parse_reply(&text, "", &options).unwrap_or_else(|| {
            warn!("upstream reply is not valid JSON, substituting");
            fallback_reply("", &options)
        }))
    }

    async fn assess(
        &self,
        messages: &[String],
        language: Language,
    ) -> GatewayResult<ProficiencyAnalysis> {
        let messages: Vec<String> = messages
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .collect();

        if messages.is_empty() {
            return Err(GatewayError::Validation("Messages are required".to_owned()));
        }

        if messages.len() < MIN_USER_MESSAGES {
            return Ok(proficiency::too_few_user_messages());
        }

        if !self.client.is_configured() {
            debug!("no upstream credential configured, using count-based assessment");
            return Ok(proficiency::fallback_analysis(messages.len()));
        }

        let prompt = match render_assessment(&messages, language) {
            Ok(prompt) => prompt,
            Err(e) => {
                error!("failed to render assessment prompt: {e}");
                return Ok(proficiency::fallback_analysis(messages.len()));
            }
        };

        match self.client.complete(vec![ChatMessage::user(prompt)]).await {
            Ok(text) => Ok(proficiency::parse_analysis(&text).unwrap_or_else(|| {
                warn!("invalid level from upstream, using fallback");
                proficiency::fallback_analysis(messages.len())
            })),
            Err(e) => {
                warn!("assessment call failed, using fallback: {e}");
                Ok(proficiency::fallback_analysis(messages.len()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ProficiencyLevel;
    use crate::infrastructure::upstream::UpstreamError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted upstream that records every prompt it receives.
    struct FakeCompletion {
        configured: bool,
        reply: Result<String, u16>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeCompletion {
        fn replying(text: &str) -> Self {
            FakeCompletion {
                configured: true,
                reply: Ok(text.to_owned()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            FakeCompletion {
                reply: Err(status),
                ..FakeCompletion::replying("")
            }
        }

        fn unconfigured() -> Self {
            FakeCompletion {
                configured: false,
                ..FakeCompletion::replying("")
            }
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletion {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .extend(messages.into_iter().map(|m| m.content));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(UpstreamError::Status(*status, "boom".into())),
            }
        }
    }

    fn service(fake: FakeCompletion) -> (MyTutorService, Ref<FakeCompletion>) {
        let fake = Ref::new(fake);
        (MyTutorService::new(fake.clone()), fake)
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_upstream_call() {
        let (service, fake) = service(FakeCompletion::replying("{}"));

        let result = service
            .reply_to_message("   ", &[], &TutorOptions::default(), &[])
            .await;

        assert!(matches!(result, Err(GatewayError::Validation(_))));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_upstream_gives_canned_reply() {
        let (service, fake) = service(FakeCompletion::unconfigured());

        let reply = service
            .reply_to_message("hello there", &[], &TutorOptions::default(), &[])
            .await
            .unwrap();

        assert!(!reply.tutor_response.is_empty());
        assert_eq!(reply.vocabulary_used, vec!["hello", "there"]);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_json_is_used() {
        let (service, fake) =
            service(FakeCompletion::replying(r#"{"tutorResponse": "Hej! Hur mår du?"}"#));
        let options = TutorOptions {
            selected_language: Language::Swedish,
            ..TutorOptions::default()
        };

        let reply = service
            .reply_to_message("Hej", &[], &options, &["Practice Swedish pronunciation".into()])
            .await
            .unwrap();

        assert_eq!(reply.tutor_response, "Hej! Hur mår du?");
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        let prompts = fake.prompts.lock().unwrap();
        assert!(prompts[0].contains("Practice Swedish pronunciation"));
    }

    #[tokio::test]
    async fn test_non_json_upstream_is_substituted() {
        let (service, _) = service(FakeCompletion::replying("I'd love to chat!"));
        let options = TutorOptions::default();

        let reply = service
            .reply_to_message("hello", &[], &options, &[])
            .await
            .unwrap();

        assert_eq!(reply, fallback_reply("hello", &options));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_absorbed_on_chat() {
        let (service, fake) = service(FakeCompletion::failing(529));

        let reply = service
            .reply_to_message("hello", &[], &TutorOptions::default(), &[])
            .await
            .unwrap();

        assert!(!reply.tutor_response.is_empty());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prompt_requires_credential() {
        let (service, _) = service(FakeCompletion::unconfigured());
        let result = service.reply_to_prompt("Say hi").await;
        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_prompt_upstream_failure_is_an_error() {
        let (service, _) = service(FakeCompletion::failing(500));
        let result = service.reply_to_prompt("Say hi").await;
        assert!(matches!(result, Err(GatewayError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_prompt_is_forwarded_verbatim() {
        let (service, fake) = service(FakeCompletion::replying("plain text"));

        let reply = service.reply_to_prompt("Say hi").await.unwrap();

        assert!(!reply.tutor_response.is_empty());
        assert_eq!(fake.prompts.lock().unwrap().as_slice(), ["Say hi".to_string()]);
    }

    #[tokio::test]
    async fn test_assess_short_circuits_single_message() {
        let (service, fake) = service(FakeCompletion::replying(r#"{"level":"Native"}"#));

        let analysis = service
            .assess(&["Hello".into()], Language::English)
            .await
            .unwrap();

        assert_eq!(analysis.level, ProficiencyLevel::Beginner);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_assess_invalid_level_falls_back() {
        let (service, _) = service(FakeCompletion::replying(r#"{"level":"Guru"}"#));
        let messages: Vec<String> = (0..20).map(|i| format!("message {i}")).collect();

        let analysis = service.assess(&messages, Language::Italian).await.unwrap();

        assert_eq!(analysis.level, ProficiencyLevel::Intermediate);
        assert_eq!(analysis.confidence, 0.6);
    }

    #[tokio::test]
    async fn test_assess_uses_model_level() {
        let (service, _) = service(FakeCompletion::replying(r#"{"level":"Advanced"}"#));

        let analysis = service
            .assess(&["Jag har bott här".into(), "Det var länge sedan".into()], Language::Swedish)
            .await
            .unwrap();

        assert_eq!(analysis.level, ProficiencyLevel::Advanced);
    }

    #[tokio::test]
    async fn test_assess_rejects_empty_input() {
        let (service, _) = service(FakeCompletion::unconfigured());
        let result = service.assess(&["  ".into()], Language::English).await;
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }
}
