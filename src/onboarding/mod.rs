//! Onboarding: a scripted first-launch chat followed by a clarification search.
//!
//! The onboarding is a fixed sequence of questions presented as a
//! conversation. The controller walks the catalog, retries empty answers,
//! branches on selected options and, once every question is answered,
//! submits the collected profile. A separate clarification search shares
//! the same chat transcript.

pub mod answers;
pub mod catalog;
pub mod clarification;
pub mod controller;
pub mod profile;
pub mod routes;
pub mod session;
pub mod state;
pub mod transcript;

pub use answers::AnswerStore;
pub use catalog::{InputKind, OptionVariant, QUESTIONS, Question, QuestionKey};
pub use clarification::{ClarificationLoop, ClarificationOutcome, SearchRequest, SearchResponse};
pub use controller::{FlowController, RenderedQuestion, Step};
pub use profile::ProfileUpdate;
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use session::{OnboardingSession, SessionConfig, SessionView};
pub use state::FlowState;
pub use transcript::{Transcript, TranscriptEntry};
