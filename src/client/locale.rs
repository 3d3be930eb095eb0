//! UI locale and the strings the session itself emits.

/// Locales the session can speak to the learner in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    EnUs,
    CsCz,
}

pub struct Strings {
    pub sorry_trouble_responding: &'static str,
    pub tutor_thinking: &'static str,
    pub translation_label: &'static str,
    pub ready_to_practice: &'static str,
    pub enter_learning_goal: &'static str,
}

const EN_US: Strings = Strings {
    sorry_trouble_responding: "I'm sorry, I'm having trouble responding right now. Let's continue practicing!",
    tutor_thinking: "Tutor is thinking...",
    translation_label: "English translation",
    ready_to_practice: "Start a conversation and I'll help you learn with personalized feedback!",
    enter_learning_goal: "Enter your learning goal:",
};

const CS_CZ: Strings = Strings {
    sorry_trouble_responding: "Omlouvám se, mám potíže s odpovědí. Pokračujme v procvičování!",
    tutor_thinking: "Tutor přemýšlí...",
    translation_label: "Český překlad",
    ready_to_practice: "Začněte konverzaci a já vám pomohu se učit s personalizovanou zpětnou vazbou!",
    enter_learning_goal: "Zadejte svůj výukový cíl:",
};

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::CsCz => "cs-CZ",
        }
    }

    /// Resolves a BCP-47 tag: exact match, then language prefix, then `en-US`.
    pub fn resolve(tag: &str) -> Locale {
        const ALL: [Locale; 2] = [Locale::EnUs, Locale::CsCz];

        let tag = tag.trim();
        if let Some(locale) = ALL.iter().find(|l| l.tag().eq_ignore_ascii_case(tag)) {
            return *locale;
        }

        let language = tag.split(['-', '_']).next().unwrap_or_default();
        ALL.iter()
            .find(|l| {
                l.tag()
                    .split('-')
                    .next()
                    .is_some_and(|prefix| !language.is_empty() && prefix.eq_ignore_ascii_case(language))
            })
            .copied()
            .unwrap_or_default()
    }

    pub fn strings(&self) -> &'static Strings {
        match self {
            Locale::EnUs => &EN_US,
            Locale::CsCz => &CS_CZ,
        }
    }
}
