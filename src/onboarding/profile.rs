//! Profile payload sent once the scripted questions are exhausted.

use serde::{Deserialize, Serialize};

use super::answers::AnswerStore;
use super::catalog::QuestionKey;

/// Body of `PUT /user/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spiritual_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dating_season: Option<String>,
    /// Church name from the follow-up form; empty when it was never shown.
    pub church_affiliation: String,
}

impl ProfileUpdate {
    pub fn from_answers(answers: &AnswerStore) -> Self {
        Self {
            age: parse_age(answers.get(QuestionKey::Age).unwrap_or_default()),
            tone: answers.get_owned(QuestionKey::Tone),
            pronouns: answers.get_owned(QuestionKey::Pronouns),
            location: answers.get_owned(QuestionKey::Location),
            spiritual_context: answers.get_owned(QuestionKey::SpiritualContext),
            dating_season: answers.get_owned(QuestionKey::DatingSeason),
            church_affiliation: answers.get_owned(QuestionKey::ChurchName).unwrap_or_default(),
        }
    }
}

/// Parse the stored digit string; anything unparseable is 0.
///
/// The input is digits only, so the one failure besides empty is a value
/// past `u32::MAX`. That is not an age and is sent as 0 too.
pub fn parse_age(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_parsing() {
        assert_eq!(parse_age("34"), 34);
        assert_eq!(parse_age(""), 0);
        assert_eq!(parse_age("thirty"), 0);
    }

    #[test]
    fn overflowing_age_is_zero() {
        assert_eq!(parse_age("4294967295"), u32::MAX);
        assert_eq!(parse_age("4294967296"), 0);
        assert_eq!(parse_age("99999999999999"), 0);
    }

    #[test]
    fn builds_from_full_answers() {
        let mut answers = AnswerStore::default();
        answers.record(QuestionKey::Name, "Sam");
        answers.record(QuestionKey::Age, "34");
        answers.record(QuestionKey::Tone, "gentle");
        answers.record(QuestionKey::Pronouns, "He/Him");
        answers.record(QuestionKey::Location, "Austin, TX");
        answers.record(QuestionKey::SpiritualContext, "solid");
        answers.record(QuestionKey::DatingSeason, "taking a break");
        answers.record(QuestionKey::ChurchAffiliation, "🙌 Yes, and I’m active");
        answers.record(QuestionKey::ChurchName, "Grace Fellowship");

        let profile = ProfileUpdate::from_answers(&answers);
        assert_eq!(profile.age, 34);
        assert_eq!(profile.pronouns.as_deref(), Some("He/Him"));
        assert_eq!(profile.location.as_deref(), Some("Austin, TX"));
        assert_eq!(profile.church_affiliation, "Grace Fellowship");
    }

    #[test]
    fn missing_answers_default() {
        let profile = ProfileUpdate::from_answers(&AnswerStore::default());
        assert_eq!(profile.age, 0);
        assert!(profile.tone.is_none());
        assert_eq!(profile.church_affiliation, "");
    }

    #[test]
    fn church_selection_alone_does_not_fill_church_name() {
        let mut answers = AnswerStore::default();
        answers.record(QuestionKey::ChurchAffiliation, "😶 Not right now");
        let profile = ProfileUpdate::from_answers(&answers);
        assert_eq!(profile.church_affiliation, "");
    }

    #[test]
    fn json_omits_missing_selects() {
        let mut answers = AnswerStore::default();
        answers.record(QuestionKey::Age, "41");
        let json = serde_json::to_value(ProfileUpdate::from_answers(&answers)).unwrap();
        assert_eq!(json["age"], 41);
        assert_eq!(json["church_affiliation"], "");
        assert!(json.get("tone").is_none());
    }
}
