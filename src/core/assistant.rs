//! Prompt construction for the upstream tutor model.
//!

use crate::core::models::{HistoryEntry, Language, Sender, TutorOptions};
use crate::infrastructure::entities::{ChatMessage, Role};
use minijinja::{Environment, context};

/// Number of trailing history entries embedded in a tutor prompt.
pub const HISTORY_WINDOW: usize = 5;

const TUTOR_TEMPLATE: &str = r#"You are a friendly, encouraging language tutor helping someone learn {{ language }}. The user interface is in Czech, but you respond in the language they are learning.

Conversation history:
{% for m in history %}{{ m.role }}: {{ m.content }}
{% endfor %}
Current user message: "{{ message }}"
User's proficiency level: {{ level }}
{% if goals %}Learning goals: {{ goals | join(", ") }}
{% endif %}Lesson mode: {{ lesson_mode }}
Target language only mode: {{ target_only }}

Important instructions:
- Respond ONLY in {{ language }}
- Be encouraging and supportive
{% if lesson_mode %}- Lesson mode is ON: focus on teaching one specific grammar point or vocabulary set
{% else %}- Chat mode is ON: keep the conversation natural and flowing
{% endif %}- Ask engaging questions to continue the conversation
- Provide gentle corrections when needed

Respond with a JSON object in this exact format:
{
  "tutorResponse": "Your encouraging response in {{ language }}",
  "czechTranslation": {% if target_only %}null{% else %}"The same response translated to Czech"{% endif %},
  "feedback": {
    "positive": ["Positive aspects of their language use"],
    "corrections": ["Gentle corrections if needed"],
    "suggestions": ["Helpful suggestions for improvement"]
  },
  "grammarAnalysis": {
    "accuracy": 85,
    "detectedLevel": "{{ level }}",
    "strengths": ["Areas they did well"],
    "improvements": ["Areas to work on"]
  },
  "vocabularyUsed": ["words", "they", "used"],
  "progressNotes": "Brief encouraging note about their progress"
}

Your entire response MUST be valid JSON only."#;

const ASSESSMENT_TEMPLATE: &str = r#"You are an expert language assessment specialist. Analyze the following messages from a language learner and determine their proficiency level in {{ language }}.

User messages to analyze:
{% for text in messages %}{{ loop.index }}. "{{ text }}"
{% endfor %}
Consider grammar accuracy, vocabulary level, sentence complexity, language consistency, fluency indicators and error patterns.

Assign ONE of these levels:
- Beginner: basic words, simple present tense, frequent errors, very short sentences
- Intermediate: mix of tenses, longer sentences, some complex vocabulary, occasional errors
- Advanced: complex structures, sophisticated vocabulary, rare errors, natural expression
- Native: near-perfect grammar, idioms, cultural references, effortless expression

Respond with a JSON object in this exact format:
{
  "level": "Beginner|Intermediate|Advanced|Native",
  "confidence": 0.85,
  "reasoning": "Why you assigned this level",
  "details": {
    "grammarAccuracy": 85,
    "vocabularyLevel": "Intermediate",
    "sentenceComplexity": "Complex",
    "languageConsistency": "Excellent",
    "strongPoints": ["Good use of past tense"],
    "improvementAreas": ["Article usage"],
    "errorCount": 3,
    "averageSentenceLength": 8.5
  },
  "levelProgression": {
    "currentStage": "Early Intermediate",
    "nextMilestone": "Master subjunctive mood",
    "estimatedProgress": "65%"
  }
}

Your response must be valid JSON only. No additional text."#;

/// Everything the tutor prompt is rendered from.
pub struct TutorPrompt<'a> {
    pub message: &'a str,
    pub history: Vec<ChatMessage>,
    pub options: &'a TutorOptions,
    pub goals: &'a [String],
}

impl<'a> TutorPrompt<'a> {
    pub fn new(
        message: &'a str,
        history: &[HistoryEntry],
        options: &'a TutorOptions,
        goals: &'a [String],
    ) -> Self {
        let skip = history.len().saturating_sub(HISTORY_WINDOW);
        TutorPrompt {
            message,
            history: history[skip..].iter().map(ChatMessage::from).collect(),
            options,
            goals,
        }
    }

    pub fn as_jinja_input(&self) -> minijinja::Value {
        let history: Vec<minijinja::Value> =
            self.history.iter().map(|m| m.as_jinja_value()).collect();

        context! {
            language => self.options.selected_language.display_name(),
            history => history,
            message => self.message,
            level => self.options.proficiency_level.as_str(),
            goals => self.goals,
            lesson_mode => self.options.show_lesson_mode,
            target_only => self.options.target_language_only_mode,
        }
    }

    pub fn render(&self) -> Result<String, minijinja::Error> {
        render("tutor", TUTOR_TEMPLATE, self.as_jinja_input())
    }
}

pub fn render_assessment(
    messages: &[String],
    language: Language,
) -> Result<String, minijinja::Error> {
    render(
        "assessment",
        ASSESSMENT_TEMPLATE,
        context! {
            language => language.display_name(),
            messages => messages,
        },
    )
}

fn render(name: &str, source: &str, input: minijinja::Value) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(name, source)?;
    env.get_template(name)?.render(input)
}

impl ChatMessage {
    pub fn as_jinja_value(&self) -> minijinja::Value {
        context! {
            role => match self.role {
                Role::User => "user",
                Role::Assistant => "tutor",
            },
            content => self.content
        }
    }
}

impl From<&HistoryEntry> for ChatMessage {
    fn from(entry: &HistoryEntry) -> Self {
        ChatMessage {
            role: match entry.sender {
                Sender::User => Role::User,
                Sender::Tutor => Role::Assistant,
            },
            content: entry.text.clone(),
        }
    }
}
