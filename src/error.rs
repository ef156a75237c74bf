//! Error types for the onboarding engine.

use crate::onboarding::catalog::{InputKind, QuestionKey};
use crate::onboarding::state::FlowState;

/// Startup error: everything that can stop the service from being built.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the backend REST collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No user token available for {endpoint}")]
    MissingToken { endpoint: String },

    #[error("Unauthorized request to {endpoint}")]
    Unauthorized { endpoint: String },

    #[error("{endpoint} returned {status}: {detail}")]
    Status {
        endpoint: String,
        status: u16,
        detail: String,
    },

    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl ApiError {
    /// Whether re-sending the same request could succeed.
    ///
    /// Auth failures need a fresh sign-in, which is outside this crate.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unauthorized { .. } | Self::MissingToken { .. })
    }

    /// Message shown to the user in the error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } | Self::MissingToken { .. } => {
                "Session expired. Please sign in again.".to_string()
            }
            Self::Status { detail, .. } => detail.clone(),
            Self::RequestFailed { .. } | Self::InvalidResponse { .. } => {
                "Something went wrong reaching the server. Please try again.".to_string()
            }
        }
    }
}

/// Misuse of the scripted flow (wrong operation for the current state).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("All questions have been answered")]
    Exhausted,

    #[error("Question {key} has not been shown yet")]
    NotRevealed { key: QuestionKey },

    #[error("Question {key} expects {expected} input")]
    WrongInputKind { key: QuestionKey, expected: InputKind },

    #[error("Option {option} is not offered for question {key}")]
    UnknownOption { key: QuestionKey, option: String },

    #[error("The church follow-up must be answered first")]
    SubFormPending,

    #[error("No follow-up form is open")]
    SubFormNotActive,

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: FlowState, to: FlowState },
}

/// Errors from the async session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("A request is already in flight")]
    RequestInFlight,

    #[error("The clarification search has not been started")]
    ClarificationInactive,

    #[error("There is no failed request to retry")]
    NothingToRetry,
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
