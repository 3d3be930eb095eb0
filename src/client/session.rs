//! Tutor session controller.
//!
//! A [`TutorSession`] owns one learner's conversation and drives the
//! request/response cycle with the gateway. Sending is single-flight: while a
//! send is outstanding every further send is ignored. The user's message is
//! appended before the gateway is called, and exactly one tutor message is
//! appended when the call resolves, whether it succeeded or not.
//!
//! Front-ends that run their own event loop use [`TutorSession::begin_send`]
//! and [`TutorSession::complete_send`] around the transport call; everyone
//! else can use [`TutorSession::send_message`].

use crate::api::chat::schemas::ChatRequest;
use crate::api::completions::schemas::AssessRequest;
use crate::client::goals::{LearningGoal, default_goals, generate_goals};
use crate::client::locale::Locale;
use crate::client::transport::{ClientError, GatewayTransport};
use crate::core::assistant::HISTORY_WINDOW;
use crate::core::models::{
    Feedback, HistoryEntry, Language, ProficiencyAnalysis, ProficiencyLevel, Sender, TutorOptions,
    TutorReply,
};
use crate::core::proficiency::{self, MIN_CONVERSATION_MESSAGES, MIN_USER_MESSAGES};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Progress statistics are sampled on every this-many-th successful reply.
const STATS_SAMPLE_INTERVAL: u32 = 5;

/// Startup configuration of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub locale: Locale,
    pub language: Language,
    pub lesson_mode: bool,
    /// Hide translations and ask the gateway not to produce them.
    pub target_language_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            locale: Locale::CsCz,
            language: Language::English,
            lesson_mode: false,
            target_language_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub translation: Option<String>,
    pub lesson_mode: bool,
}

impl ConversationMessage {
    fn new(sender: Sender, text: impl Into<String>, translation: Option<String>, lesson_mode: bool) -> Self {
        ConversationMessage {
            id: Uuid::now_v7(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            translation,
            lesson_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UserProfile {
    pub proficiency_level: ProficiencyLevel,
    pub total_message_count: u32,
    pub vocabulary: BTreeSet<String>,
    pub grammar_accuracy: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressStats {
    pub vocabulary_growth: Vec<usize>,
    pub grammar_accuracy: Vec<u8>,
    pub conversation_length: Vec<usize>,
}

impl Default for ProgressStats {
    fn default() -> Self {
        ProgressStats {
            vocabulary_growth: vec![20, 35, 50, 65, 78],
            grammar_accuracy: vec![60, 65, 70, 75, 80],
            conversation_length: vec![5, 8, 12, 15, 18],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending,
}

/// How a send resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The gateway replied and the reply was merged.
    Replied,
    /// The call failed and the apology message was appended.
    Apologized,
    /// The conversation was reset while the call was outstanding.
    Discarded,
}

/// A send that has been started and awaits its gateway call.
#[derive(Debug)]
pub struct PendingSend {
    epoch: u64,
    request: ChatRequest,
}

impl PendingSend {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }
}

pub struct TutorSession {
    config: SessionConfig,
    messages: Vec<ConversationMessage>,
    compose: String,
    busy: bool,
    /// Bumped on every conversation reset so late replies can be recognized.
    epoch: u64,
    profile: UserProfile,
    goals: Vec<LearningGoal>,
    feedback: Option<Feedback>,
    translated: HashSet<Uuid>,
    analysis: Option<ProficiencyAnalysis>,
    stats: ProgressStats,
    rng: StdRng,
}

impl TutorSession {
    pub fn new(config: SessionConfig) -> Self {
        TutorSession::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a session drawing goal progress from `rng`.
    pub fn with_rng(config: SessionConfig, rng: StdRng) -> Self {
        TutorSession {
            config,
            messages: Vec::new(),
            compose: String::new(),
            busy: false,
            epoch: 0,
            profile: UserProfile::default(),
            goals: default_goals(),
            feedback: None,
            translated: HashSet::new(),
            analysis: None,
            stats: ProgressStats::default(),
            rng,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.config.language
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn message(&self, id: Uuid) -> Option<&ConversationMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn goals(&self) -> &[LearningGoal] {
        &self.goals
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn analysis(&self) -> Option<&ProficiencyAnalysis> {
        self.analysis.as_ref()
    }

    pub fn stats(&self) -> &ProgressStats {
        &self.stats
    }

    pub fn compose(&self) -> &str {
        &self.compose
    }

    pub fn set_compose(&mut self, text: impl Into<String>) {
        self.compose = text.into();
    }

    pub fn set_lesson_mode(&mut self, enabled: bool) {
        self.config.lesson_mode = enabled;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn state(&self) -> SendState {
        if self.busy {
            SendState::Sending
        } else {
            SendState::Idle
        }
    }

    /// Starts a send: appends the user message, clears the compose buffer and
    /// marks the session busy.
    ///
    /// Returns `None`, changing nothing, when `text` is blank or a send is
    /// already outstanding.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        if text.trim().is_empty() || self.busy {
            return None;
        }

        self.messages.push(ConversationMessage::new(
            Sender::User,
            text,
            None,
            self.config.lesson_mode,
        ));
        self.compose.clear();
        self.busy = true;

        Some(PendingSend {
            epoch: self.epoch,
            request: self.chat_request(text),
        })
    }

    fn chat_request(&self, text: &str) -> ChatRequest {
        let skip = self.messages.len().saturating_sub(HISTORY_WINDOW);
        let history = self.messages[skip..]
            .iter()
            .map(|m| HistoryEntry {
                sender: m.sender,
                text: m.text.clone(),
            })
            .collect();

        ChatRequest {
            message: Some(text.to_owned()),
            conversation_history: Some(history),
            user_profile: Some(TutorOptions {
                proficiency_level: self.profile.proficiency_level,
                selected_language: self.config.language,
                show_lesson_mode: self.config.lesson_mode,
                target_language_only_mode: self.config.target_language_only,
            }),
            learning_goals: Some(self.goals.iter().map(|g| g.text.clone()).collect()),
        }
    }

    /// Resolves a send started with [`TutorSession::begin_send`].
    pub fn complete_send(
        &mut self,
        pending: PendingSend,
        result: Result<TutorReply, ClientError>,
    ) -> SendOutcome {
        self.busy = false;

        if pending.epoch != self.epoch {
            debug!("dropping reply for a conversation that has been reset");
            return SendOutcome::Discarded;
        }

        match result {
            Ok(reply) => {
                self.merge_reply(reply);
                SendOutcome::Replied
            }
            Err(e) => {
                warn!("error getting tutor response: {e}");
                self.messages.push(ConversationMessage::new(
                    Sender::Tutor,
                    self.config.locale.strings().sorry_trouble_responding,
                    None,
                    self.config.lesson_mode,
                ));
                SendOutcome::Apologized
            }
        }
    }

    /// Sends `text` and waits for the reply. `None` if the send was a no-op.
    pub async fn send_message<T>(&mut self, transport: &T, text: &str) -> Option<SendOutcome>
    where
        T: GatewayTransport + ?Sized,
    {
        let pending = self.begin_send(text)?;
        let result = transport.chat(pending.request()).await;
        Some(self.complete_send(pending, result))
    }

    /// Sends whatever is in the compose buffer.
    pub async fn send_compose<T>(&mut self, transport: &T) -> Option<SendOutcome>
    where
        T: GatewayTransport + ?Sized,
    {
        let text = self.compose.clone();
        self.send_message(transport, &text).await
    }

    fn merge_reply(&mut self, reply: TutorReply) {
        let sample_stats = self.profile.total_message_count % STATS_SAMPLE_INTERVAL == 0;

        self.messages.push(ConversationMessage::new(
            Sender::Tutor,
            reply.tutor_response,
            reply.czech_translation,
            self.config.lesson_mode,
        ));
        self.feedback = Some(reply.feedback);

        let profile = &mut self.profile;
        profile.total_message_count = profile.total_message_count.saturating_add(1);
        if let Ok(level) = reply.grammar_analysis.detected_level.parse() {
            profile.proficiency_level = level;
        }
        profile.grammar_accuracy = reply.grammar_analysis.accuracy.min(100);
        profile.vocabulary.extend(
            reply
                .vocabulary_used
                .iter()
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty()),
        );

        if sample_stats {
            self.stats.vocabulary_growth.push(self.profile.vocabulary.len());
            self.stats.grammar_accuracy.push(self.profile.grammar_accuracy);
            self.stats.conversation_length.push(self.messages.len());
        }
    }

    /// Flips a goal's completion. Returns the new state, or `None` for an unknown id.
    pub fn toggle_goal_completion(&mut self, goal_id: Uuid) -> Option<bool> {
        let goal = self.goals.iter_mut().find(|g| g.id == goal_id)?;
        goal.toggle();
        Some(goal.completed)
    }

    /// Adds a goal with no progress. Blank text is ignored.
    pub fn add_custom_goal(&mut self, text: &str) -> Option<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let goal = LearningGoal::new(text, 0);
        let id = goal.id;
        self.goals.push(goal);
        Some(id)
    }

    /// Flips translation visibility of a tutor message. Returns whether it is now
    /// visible, or `None` if `message_id` is not a tutor message.
    pub fn toggle_message_translation(&mut self, message_id: Uuid) -> Option<bool> {
        self.message(message_id)
            .filter(|m| m.sender == Sender::Tutor)?;

        if self.translated.remove(&message_id) {
            Some(false)
        } else {
            self.translated.insert(message_id);
            Some(true)
        }
    }

    pub fn is_translation_visible(&self, message_id: Uuid) -> bool {
        self.translated.contains(&message_id)
    }

    /// What a front-end should show for a message.
    pub fn displayed_text(&self, message_id: Uuid) -> Option<&str> {
        let message = self.message(message_id)?;
        let show_translation =
            !self.config.target_language_only && self.translated.contains(&message_id);

        Some(match (&message.translation, show_translation) {
            (Some(translation), true) => translation.as_str(),
            _ => message.text.as_str(),
        })
    }

    /// Switches the target language and starts a fresh conversation.
    ///
    /// The profile survives; goals are regenerated for the new language at the
    /// profile's level.
    pub fn change_language(&mut self, language: Language) {
        self.config.language = language;
        self.messages.clear();
        self.feedback = None;
        self.translated.clear();
        self.analysis = None;
        self.epoch += 1;
        self.goals = generate_goals(self.profile.proficiency_level, language, &mut self.rng);
    }

    /// Estimates the learner's level from the conversation so far.
    ///
    /// Short conversations are judged locally; otherwise the gateway is asked,
    /// and a failed call falls back to the message-count estimate. The result
    /// becomes the profile's level until the next reply reports one.
    pub async fn assess_proficiency<T>(&mut self, transport: &T) -> &ProficiencyAnalysis
    where
        T: GatewayTransport + ?Sized,
    {
        let user_messages: Vec<String> = self
            .messages
            .iter()
            .filter(|m| m.sender == Sender::User)
            .map(|m| m.text.clone())
            .collect();

        let analysis = if self.messages.len() < MIN_CONVERSATION_MESSAGES {
            proficiency::insufficient_conversation()
        } else if user_messages.len() < MIN_USER_MESSAGES {
            proficiency::too_few_user_messages()
        } else {
            let count = user_messages.len();
            let request = AssessRequest {
                messages: Some(user_messages),
                target_language: Some(self.config.language),
            };
            match transport.assess(&request).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!("proficiency assessment failed, using fallback: {e}");
                    proficiency::fallback_analysis(count)
                }
            }
        };

        self.profile.proficiency_level = analysis.level;
        self.analysis.insert(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fallback::fallback_reply;

    fn session() -> TutorSession {
        TutorSession::with_rng(SessionConfig::default(), StdRng::seed_from_u64(3))
    }

    fn reply(vocabulary: &[&str]) -> TutorReply {
        let mut reply = fallback_reply("", &TutorOptions::default());
        reply.vocabulary_used = vocabulary.iter().map(|w| w.to_string()).collect();
        reply
    }

    #[test]
    fn test_begin_send_builds_request_from_session() {
        let mut session = session();
        session.set_lesson_mode(true);

        let pending = session.begin_send("Hello tutor").unwrap();
        let request = pending.request();

        assert_eq!(request.message.as_deref(), Some("Hello tutor"));
        let history = request.conversation_history.as_ref().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender, Sender::User);
        let profile = request.user_profile.as_ref().unwrap();
        assert!(profile.show_lesson_mode);
        assert_eq!(profile.selected_language, Language::English);
        assert_eq!(request.learning_goals.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_history_is_windowed() {
        let mut session = session();
        for i in 0..4 {
            let pending = session.begin_send(&format!("message {i}")).unwrap();
            session.complete_send(pending, Ok(reply(&[])));
        }

        let pending = session.begin_send("last").unwrap();
        let history = pending.request().conversation_history.clone().unwrap();

        assert_eq!(history.len(), HISTORY_WINDOW);
        assert_eq!(history.last().unwrap().text, "last");
    }

    #[test]
    fn test_stats_sampled_every_fifth_reply() {
        let mut session = session();
        let seeded = session.stats().grammar_accuracy.len();

        for i in 0..6 {
            let pending = session.begin_send(&format!("message {i}")).unwrap();
            session.complete_send(pending, Ok(reply(&["word"])));
        }

        // Sampled before the first and the sixth merge.
        assert_eq!(session.stats().grammar_accuracy.len(), seeded + 2);
        assert_eq!(session.profile().total_message_count, 6);
    }

    #[test]
    fn test_unknown_detected_level_keeps_previous() {
        let mut session = session();
        let mut first = reply(&[]);
        first.grammar_analysis.detected_level = "Advanced".into();
        let pending = session.begin_send("one").unwrap();
        session.complete_send(pending, Ok(first));

        let mut second = reply(&[]);
        second.grammar_analysis.detected_level = "Somewhere in between".into();
        second.grammar_analysis.accuracy = 91;
        let pending = session.begin_send("two").unwrap();
        session.complete_send(pending, Ok(second));

        assert_eq!(session.profile().proficiency_level, ProficiencyLevel::Advanced);
        assert_eq!(session.profile().grammar_accuracy, 91);
    }

    #[test]
    fn test_user_messages_are_not_translatable() {
        let mut session = session();
        let pending = session.begin_send("hola").unwrap();
        let user_id = session.messages()[0].id;

        assert_eq!(session.toggle_message_translation(user_id), None);
        assert_eq!(session.toggle_message_translation(Uuid::new_v4()), None);

        session.complete_send(pending, Ok(reply(&[])));
        let tutor_id = session.messages()[1].id;
        assert_eq!(session.toggle_message_translation(tutor_id), Some(true));
    }

    #[test]
    fn test_displayed_text_respects_target_only_mode() {
        let config = SessionConfig {
            target_language_only: true,
            ..SessionConfig::default()
        };
        let mut session = TutorSession::with_rng(config, StdRng::seed_from_u64(3));
        let pending = session.begin_send("hello").unwrap();
        let mut r = reply(&[]);
        r.czech_translation = Some("Ahoj".into());
        session.complete_send(pending, Ok(r));

        let tutor_id = session.messages()[1].id;
        session.toggle_message_translation(tutor_id);

        assert_eq!(
            session.displayed_text(tutor_id),
            Some(session.messages()[1].text.as_str())
        );
    }
}
