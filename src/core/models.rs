//! Domain and wire types shared by the gateway and the session client.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Coarse ordinal classification of learner skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Native,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 4] = [
        ProficiencyLevel::Beginner,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Advanced,
        ProficiencyLevel::Native,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::Beginner => "Beginner",
            ProficiencyLevel::Intermediate => "Intermediate",
            ProficiencyLevel::Advanced => "Advanced",
            ProficiencyLevel::Native => "Native",
        }
    }
}

impl Display for ProficiencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProficiencyLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Languages a learner can practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Swedish,
    Italian,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Swedish, Language::Italian];

    /// Key used on the wire and in the REPL.
    pub fn key(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Swedish => "swedish",
            Language::Italian => "italian",
        }
    }

    /// Human readable name used inside prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Swedish => "Swedish",
            Language::Italian => "Italian",
        }
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|language| language.key().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Tutor,
}

/// One prior turn as sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub text: String,
}

/// Every recognized learner option, with its default. Absent and `null`
/// fields both take the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TutorOptions {
    #[serde(deserialize_with = "null_as_default")]
    pub proficiency_level: ProficiencyLevel,
    #[serde(deserialize_with = "null_as_default")]
    pub selected_language: Language,
    #[serde(deserialize_with = "null_as_default")]
    pub show_lesson_mode: bool,
    #[serde(alias = "englishOnlyMode", deserialize_with = "null_as_default")]
    pub target_language_only_mode: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for TutorOptions {
    fn default() -> Self {
        TutorOptions {
            proficiency_level: ProficiencyLevel::Beginner,
            selected_language: Language::English,
            show_lesson_mode: false,
            target_language_only_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub positive: Vec<String>,
    pub corrections: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarAnalysis {
    pub accuracy: u8,
    pub detected_level: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// The fixed-shape reply the gateway always returns on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorReply {
    pub tutor_response: String,
    pub czech_translation: Option<String>,
    pub feedback: Feedback,
    pub grammar_analysis: GrammarAnalysis,
    pub vocabulary_used: Vec<String>,
    pub progress_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetails {
    pub grammar_accuracy: u8,
    pub vocabulary_level: String,
    pub sentence_complexity: String,
    pub language_consistency: String,
    pub strong_points: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub error_count: u32,
    pub average_sentence_length: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgression {
    pub current_stage: String,
    pub next_milestone: String,
    pub estimated_progress: String,
}

/// Result of a proficiency assessment over the learner's messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyAnalysis {
    pub level: ProficiencyLevel,
    pub confidence: f32,
    pub reasoning: String,
    pub details: AnalysisDetails,
    pub level_progression: LevelProgression,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_accept_english_only_alias() {
        let options: TutorOptions = serde_json::from_str(
            r#"{"proficiencyLevel":"Advanced","selectedLanguage":"italian","englishOnlyMode":true}"#,
        )
        .unwrap();

        assert_eq!(options.proficiency_level, ProficiencyLevel::Advanced);
        assert_eq!(options.selected_language, Language::Italian);
        assert!(options.target_language_only_mode);
        assert!(!options.show_lesson_mode);
    }

    #[test]
    fn test_options_treat_null_as_default() {
        let options: TutorOptions = serde_json::from_str(
            r#"{"proficiencyLevel":null,"selectedLanguage":null,"showLessonMode":null,"targetLanguageOnlyMode":null}"#,
        )
        .unwrap();

        assert_eq!(options, TutorOptions::default());
    }

    #[test]
    fn test_options_reject_unknown_language() {
        let result: Result<TutorOptions, _> =
            serde_json::from_str(r#"{"selectedLanguage":"klingon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_level_from_str_is_case_insensitive() {
        assert_eq!("native".parse(), Ok(ProficiencyLevel::Native));
        assert_eq!(" Intermediate ".parse(), Ok(ProficiencyLevel::Intermediate));
        assert!("Expert".parse::<ProficiencyLevel>().is_err());
    }

    #[test]
    fn test_reply_serializes_null_translation() {
        let reply = TutorReply {
            tutor_response: "Hi".into(),
            czech_translation: None,
            feedback: Feedback::default(),
            grammar_analysis: GrammarAnalysis {
                accuracy: 80,
                detected_level: "Beginner".into(),
                strengths: vec![],
                improvements: vec![],
            },
            vocabulary_used: vec![],
            progress_notes: String::new(),
        };

        let json = serde_json::to_value(&reply).unwrap();
        assert!(json["czechTranslation"].is_null());
        assert_eq!(json["grammarAnalysis"]["detectedLevel"], "Beginner");
    }
}
