//! Flow controller: drives the scripted questions, retries and branches.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::answers::AnswerStore;
use super::catalog::{
    CHURCH_FORM_PROMPT, InputKind, OptionTag, OptionVariant, QUESTIONS, Question, QuestionKey,
};
use super::profile::ProfileUpdate;
use super::state::{Escalation, FlowState};
use super::transcript::Transcript;
use crate::error::FlowError;

/// First nudge after an empty required answer.
pub const FIRST_RETRY_PROMPT: &str = "I didn’t catch that — could you try again?";
/// Second, stronger nudge.
pub const SECOND_RETRY_PROMPT: &str =
    "Still didn’t get that. Would you mind giving it one more shot?";

/// Result of a single user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to the next question, which still has to be revealed.
    Advanced,
    /// Empty answer; a nudge was appended and the question is held.
    Clarify { attempt: u8 },
    /// The church follow-up form is open.
    SubFormOpened,
    /// Every question is answered; the profile is ready to submit.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOption {
    pub id: &'static str,
    pub label: &'static str,
}

/// A question as the client should display it right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedQuestion {
    pub key: QuestionKey,
    pub prompt: String,
    pub kind: InputKind,
    pub options: Vec<RenderedOption>,
    pub optional: bool,
    pub placeholder: &'static str,
}

/// Owns the flow state, answers and transcript for one onboarding session.
#[derive(Debug, Clone)]
pub struct FlowController {
    catalog: &'static [Question],
    state: FlowState,
    answers: AnswerStore,
    transcript: Transcript,
    variant: OptionVariant,
    /// Position whose question bubble has been shown.
    revealed: Option<usize>,
    profile_taken: bool,
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowController {
    pub fn new() -> Self {
        Self::with_catalog(QUESTIONS)
    }

    pub fn with_catalog(catalog: &'static [Question]) -> Self {
        let state = if catalog.is_empty() {
            FlowState::Exhausted
        } else {
            FlowState::default()
        };
        Self {
            catalog,
            state,
            answers: AnswerStore::default(),
            transcript: Transcript::default(),
            variant: OptionVariant::default(),
            revealed: None,
            profile_taken: false,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.state.position(self.catalog.len())
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn variant(&self) -> OptionVariant {
        self.variant
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_sub_form_open(&self) -> bool {
        matches!(self.state, FlowState::SubFormPending { .. })
    }

    /// The question at the cursor, or `None` once exhausted.
    pub fn current_question(&self) -> Option<&'static Question> {
        match self.state {
            FlowState::Active { position, .. } | FlowState::SubFormPending { position } => {
                self.catalog.get(position)
            }
            FlowState::Exhausted => None,
        }
    }

    /// Whether the current question bubble has been shown.
    pub fn is_revealed(&self) -> bool {
        match self.state {
            FlowState::Active { position, .. } => self.revealed == Some(position),
            FlowState::SubFormPending { .. } => true,
            FlowState::Exhausted => false,
        }
    }

    /// Render the current question for the active gender variant.
    pub fn render_current(&self) -> Option<RenderedQuestion> {
        let question = self.current_question()?;
        Some(RenderedQuestion {
            key: question.key,
            prompt: question.prompt.render(&self.answers),
            kind: question.kind,
            options: question
                .options
                .for_variant(self.variant)
                .iter()
                .map(|o| RenderedOption {
                    id: o.id,
                    label: o.label,
                })
                .collect(),
            optional: question.optional,
            placeholder: question.placeholder,
        })
    }

    /// Show the current question once the typing delay is over.
    ///
    /// Appends the question bubble at most once per position.
    pub fn reveal(&mut self) -> Option<RenderedQuestion> {
        let FlowState::Active { position, .. } = self.state else {
            return None;
        };
        let rendered = self.render_current()?;
        if self.revealed != Some(position) {
            self.transcript.push_question(rendered.prompt.clone());
            self.revealed = Some(position);
            debug!(key = %rendered.key, position, "Question revealed");
        }
        Some(rendered)
    }

    /// Per-keystroke filter for the current question's input box.
    pub fn sanitize_input(&self, typed: &str) -> String {
        match self.current_question() {
            Some(question) => question.kind.sanitize(typed),
            None => typed.to_string(),
        }
    }

    /// Submit a free-text or numeric answer.
    pub fn submit_text(&mut self, raw: &str) -> Result<Step, FlowError> {
        let question = self.answerable_question()?;
        if question.kind == InputKind::SingleSelect {
            return Err(FlowError::WrongInputKind {
                key: question.key,
                expected: question.kind,
            });
        }

        let value = question.kind.sanitize(raw.trim());
        if !value.is_empty() || question.optional {
            if !value.is_empty() {
                self.transcript.push_answer(&value);
            }
            return self.advance(question.key, value);
        }

        match self.state.record_empty(self.catalog.len())? {
            Escalation::Clarify { attempt } => {
                let nudge = if attempt == 0 {
                    FIRST_RETRY_PROMPT
                } else {
                    SECOND_RETRY_PROMPT
                };
                self.transcript.push_clarification(nudge);
                info!(key = %question.key, attempt, "Empty answer, asking again");
                Ok(Step::Clarify { attempt })
            }
            Escalation::Skip => {
                warn!(key = %question.key, "No answer after retries, skipping question");
                self.advance(question.key, String::new())
            }
        }
    }

    /// Pick one of the displayed options by id.
    pub fn select_option(&mut self, option_id: &str) -> Result<Step, FlowError> {
        let question = self.answerable_question()?;
        if question.kind != InputKind::SingleSelect {
            return Err(FlowError::WrongInputKind {
                key: question.key,
                expected: question.kind,
            });
        }

        let options = question.options.for_variant(self.variant);
        let option = options
            .iter()
            .find(|o| o.id == option_id)
            .ok_or_else(|| FlowError::UnknownOption {
                key: question.key,
                option: option_id.to_string(),
            })?;

        if options.iter().any(|o| o.tag == Some(OptionTag::MaleVariant)) {
            self.variant = if option.tag == Some(OptionTag::MaleVariant) {
                OptionVariant::Male
            } else {
                OptionVariant::Female
            };
            debug!(variant = ?self.variant, "Option variant chosen");
        }

        if option.tag == Some(OptionTag::OpensSubForm) {
            self.state.open_sub_form(self.catalog.len())?;
            self.answers.record(question.key, option.label);
            self.transcript.push_question(CHURCH_FORM_PROMPT);
            info!(key = %question.key, option = option.id, "Church follow-up opened");
            return Ok(Step::SubFormOpened);
        }

        self.transcript.push_answer(option.label);
        self.advance(question.key, option.label)
    }

    /// Submit the church follow-up. Any text, including empty, is accepted.
    pub fn submit_sub_form(&mut self, text: &str) -> Result<Step, FlowError> {
        if !self.is_sub_form_open() {
            return Err(FlowError::SubFormNotActive);
        }
        let value = text.trim();
        if !value.is_empty() {
            self.transcript.push_answer(value);
        }
        self.advance(QuestionKey::ChurchName, value)
    }

    /// Hand out the profile payload the first time the flow is exhausted.
    pub fn take_profile_submission(&mut self) -> Option<ProfileUpdate> {
        if !self.is_exhausted() || self.profile_taken {
            return None;
        }
        self.profile_taken = true;
        Some(ProfileUpdate::from_answers(&self.answers))
    }

    fn answerable_question(&self) -> Result<&'static Question, FlowError> {
        match self.state {
            FlowState::Exhausted => Err(FlowError::Exhausted),
            FlowState::SubFormPending { .. } => Err(FlowError::SubFormPending),
            FlowState::Active { position, .. } => {
                let question = self.catalog.get(position).ok_or(FlowError::Exhausted)?;
                if self.revealed != Some(position) {
                    return Err(FlowError::NotRevealed { key: question.key });
                }
                Ok(question)
            }
        }
    }

    fn advance(&mut self, key: QuestionKey, value: impl Into<String>) -> Result<Step, FlowError> {
        self.answers.record(key, value);
        let next = self.state.advance(self.catalog.len())?;
        info!(key = %key, next = %next, "Answer recorded");
        if next.is_terminal() {
            Ok(Step::Exhausted)
        } else {
            Ok(Step::Advanced)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::catalog::{Options, Prompt, SelectOption};

    static OPTIONAL_TEXT: &[Question] = &[
        Question {
            key: QuestionKey::Location,
            prompt: Prompt::Plain("Where?"),
            kind: InputKind::FreeText,
            options: Options::None,
            optional: true,
            placeholder: "",
        },
        Question {
            key: QuestionKey::Age,
            prompt: Prompt::Plain("Age?"),
            kind: InputKind::Numeric,
            options: Options::None,
            optional: false,
            placeholder: "",
        },
    ];

    static NAME_FIRST_GREETING: &[Question] = &[Question {
        key: QuestionKey::Tone,
        prompt: Prompt::WithName {
            before: "Nice to meet you, ",
            after: "!",
        },
        kind: InputKind::SingleSelect,
        options: Options::Single(&[SelectOption {
            id: "ok",
            label: "OK",
            tag: None,
        }]),
        optional: false,
        placeholder: "",
    }];

    fn revealed(mut c: FlowController) -> FlowController {
        c.reveal();
        c
    }

    /// Walk the real catalog until `key` is current and revealed.
    fn walk_to(key: QuestionKey, pronoun: &str) -> FlowController {
        let mut c = revealed(FlowController::new());
        while c.current_question().map(|q| q.key) != Some(key) {
            let q = c.current_question().unwrap();
            let step = match q.key {
                QuestionKey::Start => c.select_option("lets_go"),
                QuestionKey::Name => c.submit_text("Sam"),
                QuestionKey::Tone => c.select_option("gentle"),
                QuestionKey::Pronouns => c.select_option(pronoun),
                QuestionKey::Age => c.submit_text("34"),
                QuestionKey::Location => c.submit_text("Austin"),
                QuestionKey::SpiritualContext => {
                    let id = c.render_current().unwrap().options[0].id;
                    c.select_option(id)
                }
                QuestionKey::DatingSeason => c.select_option("god_first"),
                other => panic!("unexpected question {other}"),
            };
            assert_eq!(step.unwrap(), Step::Advanced);
            c.reveal();
        }
        c
    }

    #[test]
    fn starts_on_first_question_unrevealed() {
        let mut c = FlowController::new();
        assert_eq!(c.state(), FlowState::Active { position: 0, retries: 0 });
        assert!(!c.is_revealed());
        assert!(c.transcript().is_empty());
        assert_eq!(
            c.select_option("lets_go"),
            Err(FlowError::NotRevealed {
                key: QuestionKey::Start
            })
        );
    }

    #[test]
    fn reveal_appends_question_once() {
        let mut c = FlowController::new();
        let first = c.reveal().unwrap();
        assert_eq!(first.key, QuestionKey::Start);
        c.reveal();
        assert_eq!(c.transcript().len(), 1);
        assert_eq!(c.transcript().entries()[0].text(), "You ready to walk this out together?");
    }

    #[test]
    fn three_empty_answers_advance_once_after_two_nudges() {
        for key in [QuestionKey::Name, QuestionKey::Age, QuestionKey::Location] {
            let mut c = walk_to(key, "she_her");
            let before = c.position();
            let nudges_before = c.transcript().clarification_count();

            assert_eq!(c.submit_text("   ").unwrap(), Step::Clarify { attempt: 0 });
            assert_eq!(c.position(), before);
            assert_eq!(c.transcript().last().unwrap().text(), FIRST_RETRY_PROMPT);

            assert_eq!(c.submit_text("").unwrap(), Step::Clarify { attempt: 1 });
            assert_eq!(c.position(), before);
            assert_eq!(c.transcript().last().unwrap().text(), SECOND_RETRY_PROMPT);

            assert_eq!(c.submit_text("").unwrap(), Step::Advanced);
            assert_eq!(c.position(), before + 1);
            assert_eq!(c.transcript().clarification_count() - nudges_before, 2);
            assert_eq!(c.answers().get(key), Some(""));
            assert_eq!(c.state(), FlowState::Active { position: before + 1, retries: 0 });
        }
    }

    #[test]
    fn retry_counter_resets_on_advance() {
        let mut c = walk_to(QuestionKey::Name, "she_her");
        c.submit_text("").unwrap();
        assert_eq!(c.submit_text("Sam").unwrap(), Step::Advanced);
        c.reveal();
        c.select_option("gentle").unwrap();
        c.reveal();
        c.select_option("she_her").unwrap();
        c.reveal();
        // Age: fresh escalation starts at attempt 0 again.
        assert_eq!(c.submit_text("").unwrap(), Step::Clarify { attempt: 0 });
    }

    #[test]
    fn optional_question_advances_on_single_empty() {
        let mut c = revealed(FlowController::with_catalog(OPTIONAL_TEXT));
        assert_eq!(c.submit_text("  ").unwrap(), Step::Advanced);
        assert_eq!(c.position(), 1);
        assert_eq!(c.transcript().clarification_count(), 0);
        assert_eq!(c.answers().get(QuestionKey::Location), Some(""));
    }

    #[test]
    fn numeric_input_keeps_digits() {
        let mut c = revealed(FlowController::with_catalog(OPTIONAL_TEXT));
        c.submit_text("").unwrap();
        c.reveal();
        assert_eq!(c.sanitize_input("3a4"), "34");
        assert_eq!(c.submit_text(" 3a4 ").unwrap(), Step::Exhausted);
        assert_eq!(c.answers().get(QuestionKey::Age), Some("34"));
    }

    #[test]
    fn non_digit_only_numeric_counts_as_empty() {
        let mut c = walk_to(QuestionKey::Age, "she_her");
        assert_eq!(c.submit_text("abc").unwrap(), Step::Clarify { attempt: 0 });
    }

    #[test]
    fn he_him_shows_male_spiritual_options() {
        let c = walk_to(QuestionKey::SpiritualContext, "he_him");
        assert_eq!(c.variant(), OptionVariant::Male);
        let ids: Vec<_> = c.render_current().unwrap().options.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["solid", "hear_god_clearly", "faith_is_core", "still_figuring"]);
    }

    #[test]
    fn other_pronouns_show_female_spiritual_options() {
        for pronoun in ["she_her", "they_them", "prefer_not_to_say"] {
            let c = walk_to(QuestionKey::SpiritualContext, pronoun);
            assert_eq!(c.variant(), OptionVariant::Female);
            assert_eq!(c.render_current().unwrap().options[0].id, "learning_to_trust");
        }
    }

    #[test]
    fn hidden_variant_option_is_rejected() {
        let mut c = walk_to(QuestionKey::SpiritualContext, "she_her");
        assert_eq!(
            c.select_option("solid"),
            Err(FlowError::UnknownOption {
                key: QuestionKey::SpiritualContext,
                option: "solid".to_string()
            })
        );
    }

    #[test]
    fn pronoun_answer_stores_label() {
        let c = walk_to(QuestionKey::Age, "he_him");
        assert_eq!(c.answers().get(QuestionKey::Pronouns), Some("He/Him"));
    }

    #[test]
    fn attending_church_opens_sub_form_without_advancing() {
        for option in ["active", "attends_sometimes"] {
            let mut c = walk_to(QuestionKey::ChurchAffiliation, "she_her");
            let position = c.position();
            let bubbles = c.transcript().len();

            assert_eq!(c.select_option(option).unwrap(), Step::SubFormOpened);
            assert_eq!(c.position(), position);
            assert!(c.is_sub_form_open());
            assert!(!c.is_exhausted());
            assert_eq!(c.transcript().len(), bubbles + 1);
            assert_eq!(c.transcript().last().unwrap().text(), CHURCH_FORM_PROMPT);

            // Main-sequence actions are blocked while the form is open.
            assert_eq!(c.select_option("not_right_now"), Err(FlowError::SubFormPending));
            assert_eq!(c.submit_text("x"), Err(FlowError::SubFormPending));
            assert!(c.take_profile_submission().is_none());

            assert_eq!(c.submit_sub_form("  Grace Fellowship ").unwrap(), Step::Exhausted);
            assert_eq!(c.answers().get(QuestionKey::ChurchName), Some("Grace Fellowship"));
            assert_eq!(c.submit_sub_form("again"), Err(FlowError::SubFormNotActive));
        }
    }

    #[test]
    fn empty_sub_form_still_advances_once() {
        let mut c = walk_to(QuestionKey::ChurchAffiliation, "she_her");
        c.select_option("active").unwrap();
        assert_eq!(c.submit_sub_form("").unwrap(), Step::Exhausted);
        assert_eq!(c.answers().get(QuestionKey::ChurchName), Some(""));
        assert_eq!(c.position(), QUESTIONS.len());
    }

    #[test]
    fn sub_form_requires_open_form() {
        let mut c = walk_to(QuestionKey::Name, "she_her");
        assert_eq!(c.submit_sub_form("Grace"), Err(FlowError::SubFormNotActive));
    }

    #[test]
    fn not_attending_advances_directly() {
        let mut c = walk_to(QuestionKey::ChurchAffiliation, "she_her");
        assert_eq!(c.select_option("not_right_now").unwrap(), Step::Exhausted);
        assert!(c.answers().get(QuestionKey::ChurchName).is_none());
        assert_eq!(c.transcript().last().unwrap().text(), "😶 Not right now");
    }

    #[test]
    fn name_is_interpolated_into_next_prompt() {
        let mut c = walk_to(QuestionKey::Name, "she_her");
        c.submit_text("Sam").unwrap();
        let rendered = c.reveal().unwrap();
        assert_eq!(rendered.key, QuestionKey::Tone);
        assert!(rendered.prompt.contains("Sam"));
        assert!(c.transcript().last().unwrap().text().contains("Sam"));
    }

    #[test]
    fn missing_name_renders_empty_segment() {
        let c = revealed(FlowController::with_catalog(NAME_FIRST_GREETING));
        let rendered = c.render_current().unwrap();
        assert_eq!(rendered.prompt, "Nice to meet you, !");
        assert!(!rendered.prompt.contains('{'));
    }

    #[test]
    fn wrong_input_kind_is_rejected() {
        let mut c = revealed(FlowController::new());
        assert_eq!(
            c.submit_text("yes"),
            Err(FlowError::WrongInputKind {
                key: QuestionKey::Start,
                expected: InputKind::SingleSelect
            })
        );
        let mut c = walk_to(QuestionKey::Name, "she_her");
        assert!(matches!(
            c.select_option("lets_go"),
            Err(FlowError::WrongInputKind { .. })
        ));
    }

    #[test]
    fn profile_submission_is_taken_once() {
        let mut c = walk_to(QuestionKey::ChurchAffiliation, "he_him");
        assert!(c.take_profile_submission().is_none());
        c.select_option("prefer_not_to_say").unwrap();
        let profile = c.take_profile_submission().unwrap();
        assert_eq!(profile.age, 34);
        assert_eq!(profile.location.as_deref(), Some("Austin"));
        assert_eq!(profile.church_affiliation, "");
        assert!(c.take_profile_submission().is_none());
    }

    #[test]
    fn exhausted_rejects_everything() {
        let mut c = walk_to(QuestionKey::ChurchAffiliation, "she_her");
        c.select_option("not_right_now").unwrap();
        assert!(c.current_question().is_none());
        assert!(c.reveal().is_none());
        assert_eq!(c.submit_text("x"), Err(FlowError::Exhausted));
        assert_eq!(c.select_option("active"), Err(FlowError::Exhausted));
    }

    #[test]
    fn empty_catalog_starts_exhausted() {
        let mut c = FlowController::with_catalog(&[]);
        assert!(c.is_exhausted());
        assert!(c.take_profile_submission().is_some());
    }
}
