//! Learning goals: default seed, per-level catalogue and completion toggling.

use crate::core::models::{Language, ProficiencyLevel};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

/// Goals generated for a language/level pair.
pub const GENERATED_GOALS: usize = 3;
/// Generated goals start with progress in `0..MAX_INITIAL_PROGRESS`.
const MAX_INITIAL_PROGRESS: u8 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningGoal {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    pub progress: u8,
}

impl LearningGoal {
    pub fn new(text: impl Into<String>, progress: u8) -> Self {
        LearningGoal {
            id: Uuid::now_v7(),
            text: text.into(),
            completed: false,
            progress: progress.min(100),
        }
    }

    /// Flips completion. Completing forces progress to 100; un-completing keeps it.
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
        if self.completed {
            self.progress = 100;
        }
    }
}

/// The goals a fresh session starts with.
pub fn default_goals() -> Vec<LearningGoal> {
    vec![
        LearningGoal::new("Master basic greetings", 20),
        LearningGoal::new("Learn present tense verbs", 10),
        LearningGoal::new("Expand food vocabulary", 0),
    ]
}

fn catalogue(level: ProficiencyLevel, language: Language) -> [&'static str; GENERATED_GOALS] {
    use Language::*;
    use ProficiencyLevel::*;

    match (level, language) {
        (Beginner, English) => [
            "Master basic greetings and introductions",
            "Learn present tense regular verbs",
            "Build everyday vocabulary",
        ],
        (Beginner, Swedish) => [
            "Master basic greetings (hej, hejdå)",
            "Learn present tense verbs",
            "Build family and home vocabulary",
        ],
        (Beginner, Italian) => [
            "Master basic greetings (ciao, buongiorno)",
            "Learn present tense essere and avere",
            "Build food and family vocabulary",
        ],
        (Intermediate, English) => [
            "Master past tenses",
            "Learn conditional mood",
            "Expand professional vocabulary",
        ],
        (Intermediate, Swedish) => [
            "Master past tenses (preteritum and perfekt)",
            "Learn Swedish word order",
            "Expand professional vocabulary",
        ],
        (Intermediate, Italian) => [
            "Master past tenses (passato prossimo and imperfetto)",
            "Learn subjunctive mood basics",
            "Expand professional vocabulary",
        ],
        (Advanced, English) => [
            "Master all verb tenses",
            "Learn advanced conditional sentences",
            "Expand idiomatic expressions",
        ],
        (Advanced, Swedish) => [
            "Master all verb tenses (futurum and konjunktiv)",
            "Learn advanced Swedish syntax",
            "Expand idiomatic expressions",
        ],
        (Advanced, Italian) => [
            "Master all verb tenses (futuro anteriore and congiuntivo)",
            "Learn advanced Italian syntax",
            "Expand idiomatic expressions",
        ],
        (Native, English) => [
            "Maintain fluency in all tenses",
            "Use idiomatic expressions naturally",
            "Engage in complex discussions",
        ],
        (Native, Swedish) => [
            "Maintain fluency in all Swedish tenses",
            "Use idiomatic expressions naturally",
            "Engage in complex discussions",
        ],
        (Native, Italian) => [
            "Maintain fluency in all Italian tenses",
            "Use idiomatic expressions naturally",
            "Engage in complex discussions",
        ],
    }
}

/// Three fresh goals for `language` at `level`, with small random starting progress.
pub fn generate_goals<R: Rng>(
    level: ProficiencyLevel,
    language: Language,
    rng: &mut R,
) -> Vec<LearningGoal> {
    catalogue(level, language)
        .into_iter()
        .map(|text| LearningGoal::new(text, rng.random_range(0..MAX_INITIAL_PROGRESS)))
        .collect()
}
