//! Proficiency assessment: threshold table, canned analyses and upstream normalization.

use crate::core::fallback::{extract_json_object, non_empty_str, percentage, string_list};
use crate::core::models::{AnalysisDetails, LevelProgression, ProficiencyAnalysis, ProficiencyLevel};
use serde_json::Value;

/// User message counts at which the count-based estimate moves up a level.
pub const INTERMEDIATE_THRESHOLD: usize = 15;
pub const ADVANCED_THRESHOLD: usize = 25;

/// Below this many messages in the whole conversation no assessment is attempted.
pub const MIN_CONVERSATION_MESSAGES: usize = 3;
/// Below this many learner messages no assessment is attempted.
pub const MIN_USER_MESSAGES: usize = 2;

impl ProficiencyLevel {
    /// Count-based estimate used whenever no model assessment is available.
    pub fn from_message_count(user_messages: usize) -> ProficiencyLevel {
        if user_messages >= ADVANCED_THRESHOLD {
            ProficiencyLevel::Advanced
        } else if user_messages >= INTERMEDIATE_THRESHOLD {
            ProficiencyLevel::Intermediate
        } else {
            ProficiencyLevel::Beginner
        }
    }
}

fn canned_details(strong_point: &str, error_count: u32, average_sentence_length: f32) -> AnalysisDetails {
    AnalysisDetails {
        grammar_accuracy: 70,
        vocabulary_level: "Basic".to_owned(),
        sentence_complexity: "Simple".to_owned(),
        language_consistency: "Good".to_owned(),
        strong_points: vec![strong_point.to_owned()],
        improvement_areas: vec!["Continue practicing".to_owned()],
        error_count,
        average_sentence_length,
    }
}

fn progression(level: ProficiencyLevel, estimated_progress: &str) -> LevelProgression {
    LevelProgression {
        current_stage: level.to_string(),
        next_milestone: "Continue practicing".to_owned(),
        estimated_progress: estimated_progress.to_owned(),
    }
}

/// Analysis for a conversation too short to assess.
pub fn insufficient_conversation() -> ProficiencyAnalysis {
    ProficiencyAnalysis {
        level: ProficiencyLevel::Beginner,
        confidence: 0.9,
        reasoning: "Insufficient conversation data".to_owned(),
        details: canned_details("Getting started", 0, 5.0),
        level_progression: progression(ProficiencyLevel::Beginner, "20%"),
    }
}

/// Analysis for a conversation with too few learner messages.
pub fn too_few_user_messages() -> ProficiencyAnalysis {
    ProficiencyAnalysis {
        level: ProficiencyLevel::Beginner,
        confidence: 0.8,
        reasoning: "Too few user messages to analyze".to_owned(),
        details: canned_details("Active participation", 0, 5.0),
        level_progression: progression(ProficiencyLevel::Beginner, "30%"),
    }
}

/// Analysis used when the model is unavailable or its answer is unusable.
pub fn fallback_analysis(user_messages: usize) -> ProficiencyAnalysis {
    let level = ProficiencyLevel::from_message_count(user_messages);
    ProficiencyAnalysis {
        level,
        confidence: 0.6,
        reasoning: "Fallback analysis based on conversation length".to_owned(),
        details: canned_details("Active participation", 2, 6.0),
        level_progression: progression(level, "50%"),
    }
}

/// Reads a model assessment. `None` unless `level` names one of the four levels.
pub fn parse_analysis(raw: &str) -> Option<ProficiencyAnalysis> {
    let object = extract_json_object(raw)?;
    let level: ProficiencyLevel = object.get("level")?.as_str()?.parse().ok()?;

    let empty = serde_json::Map::new();
    let details = match object.get("details") {
        Some(Value::Object(details)) => details,
        _ => &empty,
    };

    let level_progression = match object.get("levelProgression") {
        Some(Value::Object(p)) => LevelProgression {
            current_stage: non_empty_str(p.get("currentStage")).unwrap_or_else(|| level.to_string()),
            next_milestone: non_empty_str(p.get("nextMilestone"))
                .unwrap_or_else(|| "Continue practicing".to_owned()),
            estimated_progress: non_empty_str(p.get("estimatedProgress"))
                .unwrap_or_else(|| "50%".to_owned()),
        },
        _ => progression(level, "50%"),
    };

    Some(ProficiencyAnalysis {
        level,
        confidence: object
            .get("confidence")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite() && *c > 0.0)
            .map(|c| c.min(1.0) as f32)
            .unwrap_or(0.8),
        reasoning: non_empty_str(object.get("reasoning"))
            .unwrap_or_else(|| "AI analysis completed".to_owned()),
        details: AnalysisDetails {
            grammar_accuracy: percentage(details.get("grammarAccuracy"))
                .filter(|a| *a > 0)
                .unwrap_or(75),
            vocabulary_level: non_empty_str(details.get("vocabularyLevel"))
                .unwrap_or_else(|| "Basic".to_owned()),
            sentence_complexity: non_empty_str(details.get("sentenceComplexity"))
                .unwrap_or_else(|| "Simple".to_owned()),
            language_consistency: non_empty_str(details.get("languageConsistency"))
                .unwrap_or_else(|| "Good".to_owned()),
            strong_points: string_list(details.get("strongPoints")).unwrap_or_default(),
            improvement_areas: string_list(details.get("improvementAreas")).unwrap_or_default(),
            error_count: details
                .get("errorCount")
                .and_then(Value::as_u64)
                .map(|n| n.min(u32::MAX as u64) as u32)
                .unwrap_or(0),
            average_sentence_length: details
                .get("averageSentenceLength")
                .and_then(Value::as_f64)
                .filter(|n| n.is_finite() && *n > 0.0)
                .map(|n| n as f32)
                .unwrap_or(5.0),
        },
        level_progression,
    })
}
