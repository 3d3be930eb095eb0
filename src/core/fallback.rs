//! Deterministic tutor replies and normalization of upstream output.
//!
//! Whatever the upstream returns, the gateway hands the caller a complete
//! [`TutorReply`]. A reply without a usable `tutorResponse` is replaced as a
//! whole by the canned reply for the learner's language and level; any other
//! missing or mistyped field is filled from the same canned reply.

use crate::core::models::{
    Feedback, GrammarAnalysis, Language, ProficiencyLevel, TutorOptions, TutorReply,
};
use serde_json::{Map, Value};

/// Upper bound on `vocabularyUsed`.
pub const MAX_VOCABULARY: usize = 5;
const FALLBACK_ACCURACY: u8 = 80;

struct CannedUtterance {
    text: &'static str,
    czech: &'static str,
}

fn canned_utterance(language: Language, level: ProficiencyLevel) -> CannedUtterance {
    use Language::*;
    use ProficiencyLevel::*;

    let (text, czech) = match (language, level) {
        (English, Beginner) => (
            "Nice! Tell me more. What do you like to do?",
            "Pěkně! Řekněte mi víc. Co rád děláte?",
        ),
        (English, Intermediate) => (
            "I understand what you're saying. What happened next?",
            "Rozumím, co říkáte. Co se stalo potom?",
        ),
        (English, Advanced | Native) => (
            "That's an interesting point. How would you argue the opposite view?",
            "To je zajímavá myšlenka. Jak byste obhájil opačný názor?",
        ),
        (Swedish, Beginner) => (
            "Bra! Berätta mer. Vad tycker du om att göra?",
            "Dobře! Řekněte mi víc. Co rád děláte?",
        ),
        (Swedish, Intermediate) => (
            "Jag förstår vad du menar. Vad hände sedan?",
            "Rozumím, co myslíte. Co se stalo potom?",
        ),
        (Swedish, Advanced | Native) => (
            "Det är en intressant tanke. Hur skulle du försvara motsatt åsikt?",
            "To je zajímavá myšlenka. Jak byste obhájil opačný názor?",
        ),
        (Italian, Beginner) => (
            "Bene! Dimmi di più. Che cosa ti piace fare?",
            "Dobře! Řekni mi víc. Co rád děláš?",
        ),
        (Italian, Intermediate) => (
            "Capisco cosa dici. Che cosa è successo dopo?",
            "Rozumím, co říkáš. Co se stalo potom?",
        ),
        (Italian, Advanced | Native) => (
            "È un punto interessante. Come difenderesti l'opinione opposta?",
            "To je zajímavá myšlenka. Jak bys obhájil opačný názor?",
        ),
    };

    CannedUtterance { text, czech }
}

/// Coaching strings, in English when the learner asked for target-language-only
/// mode and in Czech (the UI language) otherwise.
struct CannedCoaching {
    positive: &'static str,
    suggestion: &'static str,
    strength: &'static str,
    improvement: &'static str,
    progress: &'static str,
}

fn canned_coaching(options: &TutorOptions) -> CannedCoaching {
    if options.target_language_only_mode {
        CannedCoaching {
            positive: "Good communication!",
            suggestion: "Keep practicing!",
            strength: "Clear expression",
            improvement: "Keep going!",
            progress: "Making progress!",
        }
    } else {
        CannedCoaching {
            positive: "Dobrá komunikace!",
            suggestion: "Pokračujte v procvičování!",
            strength: "Jasné vyjadřování",
            improvement: "Pokračujte!",
            progress: "Děláte pokroky!",
        }
    }
}

/// The reply used whenever no usable upstream reply exists.
pub fn fallback_reply(message: &str, options: &TutorOptions) -> TutorReply {
    let utterance = canned_utterance(options.selected_language, options.proficiency_level);
    let coaching = canned_coaching(options);

    TutorReply {
        tutor_response: utterance.text.to_owned(),
        czech_translation: (!options.target_language_only_mode)
            .then(|| utterance.czech.to_owned()),
        feedback: Feedback {
            positive: vec![coaching.positive.to_owned()],
            corrections: Vec::new(),
            suggestions: vec![coaching.suggestion.to_owned()],
        },
        grammar_analysis: GrammarAnalysis {
            accuracy: FALLBACK_ACCURACY,
            detected_level: options.proficiency_level.to_string(),
            strengths: vec![coaching.strength.to_owned()],
            improvements: vec![coaching.improvement.to_owned()],
        },
        vocabulary_used: derive_vocabulary(message),
        progress_notes: coaching.progress.to_owned(),
    }
}

/// Distinct lowercase words longer than two characters, first five.
pub fn derive_vocabulary(message: &str) -> Vec<String> {
    normalize_tokens(message.split_whitespace())
}

fn normalize_tokens<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::with_capacity(MAX_VOCABULARY);
    for word in words {
        let token = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if token.chars().count() > 2 && !tokens.contains(&token) {
            tokens.push(token);
            if tokens.len() == MAX_VOCABULARY {
                break;
            }
        }
    }
    tokens
}

/// Finds a JSON object in upstream text, which may wrap it in prose or a code fence.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    if let Ok(Value::Object(object)) = serde_json::from_str(trimmed) {
        return Some(object);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&trimmed[start..=end]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Builds a reply from upstream text, or `None` when the text has no usable utterance.
pub fn parse_reply(raw: &str, message: &str, options: &TutorOptions) -> Option<TutorReply> {
    let object = extract_json_object(raw)?;
    let tutor_response = non_empty_str(object.get("tutorResponse"))?;
    let defaults = fallback_reply(message, options);

    let czech_translation = if options.target_language_only_mode {
        None
    } else {
        non_empty_str(object.get("czechTranslation"))
            .or_else(|| non_empty_str(object.get("englishTranslation")))
    };

    let feedback = match object.get("feedback") {
        Some(Value::Object(feedback)) => Feedback {
            positive: string_list(feedback.get("positive")).unwrap_or(defaults.feedback.positive),
            corrections: string_list(feedback.get("corrections")).unwrap_or_default(),
            suggestions: string_list(feedback.get("suggestions"))
                .unwrap_or(defaults.feedback.suggestions),
        },
        _ => defaults.feedback,
    };

    let grammar_analysis = match object.get("grammarAnalysis") {
        Some(Value::Object(grammar)) => GrammarAnalysis {
            accuracy: percentage(grammar.get("accuracy"))
                .unwrap_or(defaults.grammar_analysis.accuracy),
            detected_level: non_empty_str(grammar.get("detectedLevel"))
                .unwrap_or(defaults.grammar_analysis.detected_level),
            strengths: string_list(grammar.get("strengths"))
                .unwrap_or(defaults.grammar_analysis.strengths),
            improvements: string_list(grammar.get("improvements"))
                .unwrap_or(defaults.grammar_analysis.improvements),
        },
        _ => defaults.grammar_analysis,
    };

    let vocabulary_used = string_list(object.get("vocabularyUsed"))
        .map(|words| normalize_tokens(words.iter().map(String::as_str)))
        .filter(|words| !words.is_empty())
        .unwrap_or(defaults.vocabulary_used);

    Some(TutorReply {
        tutor_response,
        czech_translation,
        feedback,
        grammar_analysis,
        vocabulary_used,
        progress_notes: non_empty_str(object.get("progressNotes"))
            .unwrap_or(defaults.progress_notes),
    })
}

pub(crate) fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

pub(crate) fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
    )
}

/// A number clamped into 0..=100. Strings such as `"85"` or `"85%"` are accepted.
pub(crate) fn percentage(value: Option<&Value>) -> Option<u8> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    Some(number.round().clamp(0.0, 100.0) as u8)
}
