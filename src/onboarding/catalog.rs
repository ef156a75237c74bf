//! The scripted onboarding questions, in the order they are asked.

use serde::{Deserialize, Serialize};

use super::answers::AnswerStore;

/// Stable identifier for an answer slot.
///
/// `ChurchName` belongs to the church follow-up form, not to a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKey {
    Start,
    Name,
    Tone,
    Pronouns,
    Age,
    Location,
    SpiritualContext,
    DatingSeason,
    ChurchAffiliation,
    ChurchName,
}

impl std::fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Name => "name",
            Self::Tone => "tone",
            Self::Pronouns => "pronouns",
            Self::Age => "age",
            Self::Location => "location",
            Self::SpiritualContext => "spiritual_context",
            Self::DatingSeason => "dating_season",
            Self::ChurchAffiliation => "church_affiliation",
            Self::ChurchName => "church_name",
        };
        write!(f, "{s}")
    }
}

/// How the user answers a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    FreeText,
    Numeric,
    SingleSelect,
}

impl InputKind {
    /// Filter text as it is typed. Numeric input keeps digits only.
    pub fn sanitize(&self, typed: &str) -> String {
        match self {
            Self::Numeric => typed.chars().filter(|c| c.is_ascii_digit()).collect(),
            Self::FreeText | Self::SingleSelect => typed.to_string(),
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FreeText => write!(f, "free_text"),
            Self::Numeric => write!(f, "numeric"),
            Self::SingleSelect => write!(f, "single_select"),
        }
    }
}

/// Control-flow branch attached to an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionTag {
    /// Later gendered questions show their male option set.
    MaleVariant,
    /// Opens the church follow-up form instead of advancing.
    OpensSubForm,
}

/// A selectable pill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub id: &'static str,
    pub label: &'static str,
    pub tag: Option<OptionTag>,
}

impl SelectOption {
    const fn plain(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            tag: None,
        }
    }

    const fn tagged(id: &'static str, label: &'static str, tag: OptionTag) -> Self {
        Self {
            id,
            label,
            tag: Some(tag),
        }
    }
}

/// Which half of a gendered option pair is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionVariant {
    Male,
    #[default]
    Female,
}

/// Options offered by a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Options {
    None,
    Single(&'static [SelectOption]),
    Gendered {
        male: &'static [SelectOption],
        female: &'static [SelectOption],
    },
}

impl Options {
    /// The option list to display for the given variant.
    pub fn for_variant(&self, variant: OptionVariant) -> &'static [SelectOption] {
        match (self, variant) {
            (Self::None, _) => &[],
            (Self::Single(options), _) => *options,
            (Self::Gendered { male, .. }, OptionVariant::Male) => *male,
            (Self::Gendered { female, .. }, OptionVariant::Female) => *female,
        }
    }
}

/// Prompt text, optionally with the user's name spliced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Plain(&'static str),
    WithName {
        before: &'static str,
        after: &'static str,
    },
}

impl Prompt {
    /// Render against the answers collected so far. A missing name renders
    /// as an empty segment.
    pub fn render(&self, answers: &AnswerStore) -> String {
        match self {
            Self::Plain(text) => (*text).to_string(),
            Self::WithName { before, after } => {
                let name = answers.get(QuestionKey::Name).unwrap_or_default();
                format!("{before}{name}{after}")
            }
        }
    }
}

/// One scripted onboarding question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub key: QuestionKey,
    pub prompt: Prompt,
    pub kind: InputKind,
    pub options: Options,
    /// Empty answers are accepted without the retry escalation.
    pub optional: bool,
    pub placeholder: &'static str,
}

/// Prompt shown when an attending option opens the church follow-up.
pub const CHURCH_FORM_PROMPT: &str = "Wanna tell me the name of your church or group?\n\
Sometimes I connect people with meetups, SparkCircles, or clarity events.";

const START_OPTIONS: &[SelectOption] = &[
    SelectOption::plain("lets_go", "✅ Yep, let’s go"),
    SelectOption::plain("tell_me_more", "🤔 Tell me more first"),
];

const TONE_OPTIONS: &[SelectOption] = &[
    SelectOption::plain(
        "keep_it_real",
        "🧢 Keep it real — light on fluff. I'm here to get clarity and take action",
    ),
    SelectOption::plain(
        "fun_and_faith",
        "💬 Mix of fun + faith — coach me, but don’t make it boring",
    ),
    SelectOption::plain(
        "gentle",
        "❤️ Gentle and encouraging — I’m healing or easing back in",
    ),
];

const PRONOUN_OPTIONS: &[SelectOption] = &[
    SelectOption::tagged("he_him", "He/Him", OptionTag::MaleVariant),
    SelectOption::plain("she_her", "She/Her"),
    SelectOption::plain("they_them", "They/Them"),
    SelectOption::plain("prefer_not_to_say", "Prefer not to say"),
];

const SPIRITUAL_OPTIONS_MALE: &[SelectOption] = &[
    SelectOption::plain("solid", "🛡 Solid — just want to stop dating on autopilot."),
    SelectOption::plain(
        "hear_god_clearly",
        "📖 Trying to hear God more clearly in relationships.",
    ),
    SelectOption::plain("faith_is_core", "🔥 Faith is core. Clarity is mission."),
    SelectOption::plain("still_figuring", "🤷 Still figuring it out. But I’m open."),
];

const SPIRITUAL_OPTIONS_FEMALE: &[SelectOption] = &[
    SelectOption::plain("learning_to_trust", "🌱 Learning to trust God again."),
    SelectOption::plain("healing", "🕊 Healing. Taking it one prayer at a time."),
    SelectOption::plain(
        "distant_lately",
        "🙏 Faith is important, but I’ve been distant lately.",
    ),
    SelectOption::plain("prefer_not_to_say", "😶 Prefer not to say right now."),
];

const DATING_SEASON_OPTIONS: &[SelectOption] = &[
    SelectOption::plain(
        "dating_differently",
        "👀 I’m dating, but I want to do it differently this time.",
    ),
    SelectOption::plain("taking_a_break", "🔁 Taking a break, but still curious."),
    SelectOption::plain(
        "recently_hurt",
        "💔 Recently ghosted, divorced, or disappointed.",
    ),
    SelectOption::plain(
        "god_first",
        "✝️ Focused on God first — open to whatever’s next.",
    ),
];

const CHURCH_OPTIONS: &[SelectOption] = &[
    SelectOption::tagged("active", "🙌 Yes, and I’m active", OptionTag::OpensSubForm),
    SelectOption::tagged(
        "attends_sometimes",
        "🪑 I attend sometimes",
        OptionTag::OpensSubForm,
    ),
    SelectOption::plain("not_right_now", "😶 Not right now"),
    SelectOption::plain("still_figuring", "🤔 Still figuring that part out"),
    SelectOption::plain("prefer_not_to_say", "❌ Prefer not to say"),
];

/// The onboarding script.
pub static QUESTIONS: &[Question] = &[
    Question {
        key: QuestionKey::Start,
        prompt: Prompt::Plain("You ready to walk this out together?"),
        kind: InputKind::SingleSelect,
        options: Options::Single(START_OPTIONS),
        optional: false,
        placeholder: "",
    },
    Question {
        key: QuestionKey::Name,
        prompt: Prompt::Plain(
            "First up… what should I call you?\n\
(No pressure. Could be your real name, middle name, or just 'yo.')",
        ),
        kind: InputKind::FreeText,
        options: Options::None,
        optional: false,
        placeholder: "Your name please",
    },
    Question {
        key: QuestionKey::Tone,
        prompt: Prompt::WithName {
            before: "Nice to meet you, ",
            after: "🐾\nNow, I talk to a lot of humans… how do you want me to show up for you?",
        },
        kind: InputKind::SingleSelect,
        options: Options::Single(TONE_OPTIONS),
        optional: false,
        placeholder: "",
    },
    Question {
        key: QuestionKey::Pronouns,
        prompt: Prompt::Plain(
            "Want me to refer to you a certain way when I reflect things back?",
        ),
        kind: InputKind::SingleSelect,
        options: Options::Single(PRONOUN_OPTIONS),
        optional: false,
        placeholder: "",
    },
    Question {
        key: QuestionKey::Age,
        prompt: Prompt::Plain("How young is your soul these days?"),
        kind: InputKind::Numeric,
        options: Options::None,
        optional: false,
        placeholder: "Your age please",
    },
    Question {
        key: QuestionKey::Location,
        prompt: Prompt::Plain("And where in the world are you walking this thing out?"),
        kind: InputKind::FreeText,
        options: Options::None,
        optional: false,
        placeholder: "City, state or country",
    },
    Question {
        key: QuestionKey::SpiritualContext,
        prompt: Prompt::Plain(
            "Spiritual checkpoint time — where would you say you’re at in your walk?",
        ),
        kind: InputKind::SingleSelect,
        options: Options::Gendered {
            male: SPIRITUAL_OPTIONS_MALE,
            female: SPIRITUAL_OPTIONS_FEMALE,
        },
        optional: false,
        placeholder: "",
    },
    Question {
        key: QuestionKey::DatingSeason,
        prompt: Prompt::Plain("What season are you in right now?"),
        kind: InputKind::SingleSelect,
        options: Options::Single(DATING_SEASON_OPTIONS),
        optional: false,
        placeholder: "",
    },
    Question {
        key: QuestionKey::ChurchAffiliation,
        prompt: Prompt::Plain(
            "Totally optional — but helpful for how I support you:\n\
Are you connected to a local church or faith community?",
        ),
        kind: InputKind::SingleSelect,
        options: Options::Single(CHURCH_OPTIONS),
        optional: true,
        placeholder: "",
    },
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn keys_are_unique() {
        let keys: HashSet<_> = QUESTIONS.iter().map(|q| q.key).collect();
        assert_eq!(keys.len(), QUESTIONS.len());
        assert!(!keys.contains(&QuestionKey::ChurchName));
    }

    #[test]
    fn option_ids_unique_within_each_list() {
        for q in QUESTIONS {
            for variant in [OptionVariant::Male, OptionVariant::Female] {
                let options = q.options.for_variant(variant);
                let ids: HashSet<_> = options.iter().map(|o| o.id).collect();
                assert_eq!(ids.len(), options.len(), "duplicate option id in {}", q.key);
            }
        }
    }

    #[test]
    fn select_questions_have_options_and_text_questions_do_not() {
        for q in QUESTIONS {
            let has_options = !q.options.for_variant(OptionVariant::Female).is_empty();
            assert_eq!(q.kind == InputKind::SingleSelect, has_options, "{}", q.key);
        }
    }

    #[test]
    fn only_church_affiliation_is_optional() {
        let optional: Vec<_> = QUESTIONS.iter().filter(|q| q.optional).map(|q| q.key).collect();
        assert_eq!(optional, vec![QuestionKey::ChurchAffiliation]);
    }

    #[test]
    fn sub_form_tags_are_on_attending_options() {
        let church = QUESTIONS
            .iter()
            .find(|q| q.key == QuestionKey::ChurchAffiliation)
            .unwrap();
        let opening: Vec<_> = church
            .options
            .for_variant(OptionVariant::Female)
            .iter()
            .filter(|o| o.tag == Some(OptionTag::OpensSubForm))
            .map(|o| o.id)
            .collect();
        assert_eq!(opening, vec!["active", "attends_sometimes"]);
    }

    #[test]
    fn gendered_options_pick_one_set() {
        let spiritual = QUESTIONS
            .iter()
            .find(|q| q.key == QuestionKey::SpiritualContext)
            .unwrap();
        let male = spiritual.options.for_variant(OptionVariant::Male);
        let female = spiritual.options.for_variant(OptionVariant::Female);
        assert_eq!(male[0].id, "solid");
        assert_eq!(female[0].id, "learning_to_trust");
    }

    #[test]
    fn numeric_sanitize_drops_non_digits() {
        assert_eq!(InputKind::Numeric.sanitize("3a4 yrs"), "34");
        assert_eq!(InputKind::Numeric.sanitize("-12.5"), "125");
        assert_eq!(InputKind::FreeText.sanitize(" Sam 3 "), " Sam 3 ");
    }

    #[test]
    fn prompt_interpolates_name() {
        let prompt = Prompt::WithName {
            before: "Hi ",
            after: "!",
        };
        let mut answers = AnswerStore::default();
        assert_eq!(prompt.render(&answers), "Hi !");
        answers.record(QuestionKey::Name, "Sam");
        assert_eq!(prompt.render(&answers), "Hi Sam!");
    }

    #[test]
    fn tone_prompt_greets_by_name() {
        let tone = QUESTIONS.iter().find(|q| q.key == QuestionKey::Tone).unwrap();
        let mut answers = AnswerStore::default();
        answers.record(QuestionKey::Name, "Sam");
        assert!(tone.prompt.render(&answers).starts_with("Nice to meet you, Sam🐾\n"));
    }

    /// Labels are stored and sent as profile values, so they carry no
    /// padding or unbalanced quotes.
    #[test]
    fn labels_are_clean_profile_values() {
        for q in QUESTIONS {
            for variant in [OptionVariant::Male, OptionVariant::Female] {
                for option in q.options.for_variant(variant) {
                    assert_eq!(option.label, option.label.trim(), "{}: {}", q.key, option.id);
                    assert!(
                        !option.label.contains('“') || option.label.contains('”'),
                        "{}: {}",
                        q.key,
                        option.id
                    );
                }
            }
        }
    }

    #[test]
    fn question_key_display_matches_serde() {
        for key in QUESTIONS.iter().map(|q| q.key).chain([QuestionKey::ChurchName]) {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(format!("\"{key}\""), json);
        }
    }
}
