//! Answers collected during the scripted flow.

use std::collections::HashMap;

use serde::Serialize;

use super::catalog::QuestionKey;

/// Validated answers keyed by question. Last write wins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnswerStore {
    values: HashMap<QuestionKey, String>,
}

impl AnswerStore {
    /// Record (or overwrite) the answer for `key`.
    pub fn record(&mut self, key: QuestionKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: QuestionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Owned copy of an answer, for building outbound payloads.
    pub fn get_owned(&self, key: QuestionKey) -> Option<String> {
        self.values.get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut answers = AnswerStore::default();
        answers.record(QuestionKey::Location, "Austin");
        answers.record(QuestionKey::Location, "Dallas");
        assert_eq!(answers.get(QuestionKey::Location), Some("Dallas"));
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let answers = AnswerStore::default();
        assert!(answers.is_empty());
        assert!(answers.get(QuestionKey::Name).is_none());
        assert!(answers.get_owned(QuestionKey::Name).is_none());
    }

    #[test]
    fn empty_answer_is_still_recorded() {
        let mut answers = AnswerStore::default();
        answers.record(QuestionKey::Age, "");
        assert_eq!(answers.get(QuestionKey::Age), Some(""));
    }

    #[test]
    fn serializes_with_snake_case_keys() {
        let mut answers = AnswerStore::default();
        answers.record(QuestionKey::SpiritualContext, "healing");
        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json["values"]["spiritual_context"], "healing");
    }
}
