//! The onboarding session drives the flow controller and the clarification
//! search against the backend, and paces questions with a typing delay.
//!
//! All state lives behind one mutex. A backend call claims the in-flight
//! slot under the same lock that checked it was free, then runs with the
//! lock released; while it is outstanding every mutating call is rejected.
//! A search response that arrives after the user navigated away is
//! dropped. Profile and completion results are always applied.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::catalog::CHURCH_FORM_PROMPT;
use super::clarification::{
    ClarificationLoop, ClarificationOutcome, SearchRequest, SearchResponse,
};
use super::controller::{FIRST_RETRY_PROMPT, FlowController, RenderedQuestion, Step};
use super::profile::ProfileUpdate;
use super::state::FlowState;
use super::transcript::TranscriptEntry;
use crate::api::OnboardingApi;
use crate::error::{ApiError, SessionError};

/// Default pause before a question appears.
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(1200);

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Simulated typing latency before each question is revealed.
    pub typing_delay: Duration,
    /// Zip code forwarded to the clarification search.
    pub zip_code: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing_delay: DEFAULT_TYPING_DELAY,
            zip_code: None,
        }
    }
}

/// Identifies an outstanding backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestTag {
    id: Uuid,
    epoch: u64,
}

/// A backend call that can be re-run after it failed.
#[derive(Debug, Clone)]
enum PendingAction {
    SubmitProfile(ProfileUpdate),
    Clarify(SearchRequest),
    MarkComplete(Vec<serde_json::Value>),
}

impl PendingAction {
    /// Whether the result still matters after the user left the screen.
    fn outlives_navigation(&self) -> bool {
        matches!(self, Self::SubmitProfile(_) | Self::MarkComplete(_))
    }

    fn name(&self) -> &'static str {
        match self {
            Self::SubmitProfile(_) => "submit_profile",
            Self::Clarify(_) => "clarify",
            Self::MarkComplete(_) => "mark_complete",
        }
    }
}

enum ActionResult {
    ProfileSaved,
    Searched(SearchResponse),
    Marked,
}

/// Dismissible error banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub message: String,
    pub retryable: bool,
}

/// Snapshot of the session for the client.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub state: FlowState,
    pub transcript: Vec<TranscriptEntry>,
    /// The question awaiting input; absent while typing or when none is left.
    pub current: Option<RenderedQuestion>,
    pub typing: bool,
    pub sub_form_prompt: Option<&'static str>,
    pub clarification_active: bool,
    pub in_flight: bool,
    pub exhausted: bool,
    pub show_completion: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Option<Vec<serde_json::Value>>,
    pub error: Option<ErrorView>,
}

struct SessionState {
    flow: FlowController,
    clarification: ClarificationLoop,
    /// Bumped on navigation; older responses and timers are ignored.
    epoch: u64,
    in_flight: Option<RequestTag>,
    error: Option<ErrorView>,
    retry_action: Option<PendingAction>,
    show_completion: bool,
    completed_at: Option<DateTime<Utc>>,
    results: Option<Vec<serde_json::Value>>,
}

impl SessionState {
    fn new(flow: FlowController) -> Self {
        Self {
            flow,
            clarification: ClarificationLoop::default(),
            epoch: 0,
            in_flight: None,
            error: None,
            retry_action: None,
            show_completion: false,
            completed_at: None,
            results: None,
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::RequestInFlight);
        }
        Ok(())
    }

    /// Take the in-flight slot for a backend call.
    fn claim(&mut self) -> Result<RequestTag, SessionError> {
        self.ensure_idle()?;
        let tag = RequestTag {
            id: Uuid::new_v4(),
            epoch: self.epoch,
        };
        self.in_flight = Some(tag);
        Ok(tag)
    }

    /// Fold a backend result into the session. Returns the follow-up call,
    /// if any.
    fn apply(
        &mut self,
        tag: RequestTag,
        action: PendingAction,
        outcome: Result<ActionResult, ApiError>,
    ) -> Option<PendingAction> {
        match outcome {
            Err(e) => self.record_failure(action, &e),
            Ok(ActionResult::ProfileSaved) => {
                self.show_completion = true;
                self.completed_at = Some(Utc::now());
                info!(request_id = %tag.id, "Profile saved");
            }
            Ok(ActionResult::Searched(response)) => {
                let Self {
                    flow, clarification, ..
                } = self;
                match clarification.apply(response, flow.transcript_mut()) {
                    ClarificationOutcome::Completed { results } => {
                        return Some(PendingAction::MarkComplete(results));
                    }
                    ClarificationOutcome::FollowUp { .. } => {}
                    ClarificationOutcome::NoProgress => {
                        warn!(
                            request_id = %tag.id,
                            "Search returned neither questions nor results"
                        );
                    }
                }
            }
            Ok(ActionResult::Marked) => {
                if let PendingAction::MarkComplete(results) = action {
                    self.results = Some(results);
                }
                self.completed_at = Some(Utc::now());
                info!(request_id = %tag.id, "Onboarding marked complete");
            }
        }
        None
    }

    fn record_failure(&mut self, action: PendingAction, error: &ApiError) {
        let retryable = error.is_retryable();
        warn!(action = action.name(), retryable, "Backend call failed: {}", error);
        self.error = Some(ErrorView {
            message: error.user_message(),
            retryable,
        });
        self.retry_action = retryable.then_some(action);
    }

    fn view(&self) -> SessionView {
        let flow = &self.flow;
        let awaiting_reveal =
            matches!(flow.state(), FlowState::Active { .. }) && !flow.is_revealed();
        SessionView {
            state: flow.state(),
            transcript: flow.transcript().entries().to_vec(),
            current: if flow.is_revealed() && !flow.is_sub_form_open() {
                flow.render_current()
            } else {
                None
            },
            typing: awaiting_reveal || self.in_flight.is_some(),
            sub_form_prompt: flow.is_sub_form_open().then_some(CHURCH_FORM_PROMPT),
            clarification_active: self.clarification.is_active(),
            in_flight: self.in_flight.is_some(),
            exhausted: flow.is_exhausted(),
            show_completion: self.show_completion,
            completed_at: self.completed_at,
            results: self.results.clone(),
            error: self.error.clone(),
        }
    }
}

/// Clonable handle to the single onboarding session.
#[derive(Clone)]
pub struct OnboardingSession {
    state: Arc<Mutex<SessionState>>,
    api: Arc<dyn OnboardingApi>,
    config: SessionConfig,
}

impl OnboardingSession {
    pub fn new(api: Arc<dyn OnboardingApi>, config: SessionConfig) -> Self {
        Self::with_flow(api, config, FlowController::new())
    }

    /// Build a session around an existing controller (custom catalogs).
    pub fn with_flow(
        api: Arc<dyn OnboardingApi>,
        config: SessionConfig,
        flow: FlowController,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new(flow))),
            api,
            config,
        }
    }

    pub async fn view(&self) -> SessionView {
        self.state.lock().await.view()
    }

    /// Schedule the reveal of the current question if it is still hidden.
    ///
    /// Also used to resume after `navigate_away`.
    pub async fn start(&self) -> SessionView {
        let state = self.state.lock().await;
        if matches!(state.flow.state(), FlowState::Active { .. }) && !state.flow.is_revealed() {
            self.schedule_reveal(&state);
        }
        state.view()
    }

    /// Per-keystroke input filter for the current question.
    pub async fn sanitize_input(&self, typed: &str) -> String {
        self.state.lock().await.flow.sanitize_input(typed)
    }

    pub async fn submit_text(&self, raw: &str) -> Result<SessionView, SessionError> {
        let mut state = self.state.lock().await;
        state.ensure_idle()?;
        let step = state.flow.submit_text(raw)?;
        self.after_step(state, step).await
    }

    pub async fn select_option(&self, option_id: &str) -> Result<SessionView, SessionError> {
        let mut state = self.state.lock().await;
        state.ensure_idle()?;
        let step = state.flow.select_option(option_id)?;
        self.after_step(state, step).await
    }

    /// Submit the church follow-up form.
    pub async fn submit_church(&self, name: &str) -> Result<SessionView, SessionError> {
        let mut state = self.state.lock().await;
        state.ensure_idle()?;
        let step = state.flow.submit_sub_form(name)?;
        self.after_step(state, step).await
    }

    /// Enter the open-ended clarification search.
    pub async fn begin_search(&self) -> Result<SessionView, SessionError> {
        let mut state = self.state.lock().await;
        state.ensure_idle()?;
        state.clarification.begin();
        state.results = None;
        Ok(state.view())
    }

    /// Send one free-text turn to the clarification search.
    pub async fn send_clarification(&self, text: &str) -> Result<SessionView, SessionError> {
        let (tag, request) = {
            let mut state = self.state.lock().await;
            state.ensure_idle()?;
            if !state.clarification.is_active() {
                return Err(SessionError::ClarificationInactive);
            }
            let text = text.trim();
            if text.is_empty() {
                state.flow.transcript_mut().push_clarification(FIRST_RETRY_PROMPT);
                return Ok(state.view());
            }
            let tag = state.claim()?;
            state.flow.transcript_mut().push_answer(text);
            state.retry_action = None;
            state.error = None;
            (tag, state.clarification.request(text, self.config.zip_code.as_deref()))
        };
        Ok(self.run(tag, PendingAction::Clarify(request)).await)
    }

    /// Re-run the last failed backend call.
    pub async fn retry(&self) -> Result<SessionView, SessionError> {
        let (tag, action) = {
            let mut state = self.state.lock().await;
            state.ensure_idle()?;
            let action = state.retry_action.take().ok_or(SessionError::NothingToRetry)?;
            state.error = None;
            (state.claim()?, action)
        };
        info!(action = action.name(), "Retrying failed request");
        Ok(self.run(tag, action).await)
    }

    /// Hide the error banner. A retryable action stays available.
    pub async fn dismiss_error(&self) -> SessionView {
        let mut state = self.state.lock().await;
        state.error = None;
        state.view()
    }

    /// The user left the screen: outstanding responses and timers are void.
    pub async fn navigate_away(&self) -> SessionView {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        if let Some(tag) = state.in_flight.take() {
            debug!(request_id = %tag.id, "Abandoning in-flight request");
        }
        state.clarification.deactivate();
        info!(epoch = state.epoch, "Left onboarding");
        state.view()
    }

    async fn after_step(
        &self,
        mut state: MutexGuard<'_, SessionState>,
        step: Step,
    ) -> Result<SessionView, SessionError> {
        match step {
            Step::Advanced => {
                self.schedule_reveal(&state);
                Ok(state.view())
            }
            Step::Clarify { .. } | Step::SubFormOpened => Ok(state.view()),
            Step::Exhausted => {
                let tag = state.claim()?;
                match state.flow.take_profile_submission() {
                    Some(profile) => {
                        drop(state);
                        Ok(self.run(tag, PendingAction::SubmitProfile(profile)).await)
                    }
                    None => {
                        state.in_flight = None;
                        Ok(state.view())
                    }
                }
            }
        }
    }

    /// Reveal the current question after the typing delay, unless the flow
    /// moved on or the user navigated away first.
    fn schedule_reveal(&self, state: &SessionState) {
        let position = state.flow.position();
        let epoch = state.epoch;
        let shared = Arc::clone(&self.state);
        let delay = self.config.typing_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.lock().await;
            if state.epoch != epoch || state.flow.position() != position {
                debug!(position, "Dropping stale reveal");
                return;
            }
            state.flow.reveal();
        });
    }

    /// Perform a backend call, and any follow-up it triggers, under a slot
    /// the caller already claimed. The slot is released after the last call.
    async fn run(&self, tag: RequestTag, action: PendingAction) -> SessionView {
        let mut action = action;
        loop {
            info!(request_id = %tag.id, action = action.name(), "Backend call started");

            let outcome = match &action {
                PendingAction::SubmitProfile(profile) => {
                    self.api.update_profile(profile).await.map(|()| ActionResult::ProfileSaved)
                }
                PendingAction::Clarify(request) => {
                    self.api.search(request).await.map(ActionResult::Searched)
                }
                PendingAction::MarkComplete(_) => self
                    .api
                    .mark_onboarding_complete()
                    .await
                    .map(|()| ActionResult::Marked),
            };

            let mut state = self.state.lock().await;
            let current = state.in_flight == Some(tag);
            if !current && !action.outlives_navigation() {
                debug!(request_id = %tag.id, epoch = tag.epoch, "Discarding stale response");
                return state.view();
            }

            match state.apply(tag, action, outcome) {
                Some(next) if current => action = next,
                _ => {
                    if current {
                        state.in_flight = None;
                    }
                    return state.view();
                }
            }
        }
    }
}
