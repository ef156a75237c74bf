//! Flow state machine: which question is current and how it is being answered.

use serde::Serialize;

use crate::error::FlowError;

/// Empty answers tolerated on a required question before it is skipped.
pub const MAX_EMPTY_RETRIES: u8 = 2;

/// Where the scripted flow is.
///
/// Progresses Active(0,0) → … → Active(len-1, _) → Exhausted, with a detour
/// through SubFormPending when the church follow-up is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Active { position: usize, retries: u8 },
    SubFormPending { position: usize },
    Exhausted,
}

impl Default for FlowState {
    fn default() -> Self {
        Self::Active {
            position: 0,
            retries: 0,
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active { position, retries } => write!(f, "active({position}, {retries})"),
            Self::SubFormPending { position } => write!(f, "sub_form_pending({position})"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// What to do with an empty answer to a required question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Ask again; `attempt` is the number of empties before this one.
    Clarify { attempt: u8 },
    /// Give up and move on with an empty answer.
    Skip,
}

impl FlowState {
    /// Cursor into the catalog. Exhausted reports `len`.
    pub fn position(&self, len: usize) -> usize {
        match self {
            Self::Active { position, .. } | Self::SubFormPending { position } => *position,
            Self::Exhausted => len,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Check if a transition from `self` to `target` is valid for a catalog
    /// of `len` questions.
    pub fn can_transition_to(&self, target: FlowState, len: usize) -> bool {
        use FlowState::*;
        match (*self, target) {
            (Active { position: p, .. }, Active { position: q, retries: 0 })
            | (SubFormPending { position: p }, Active { position: q, retries: 0 }) => {
                q == p + 1 && q < len
            }
            (Active { position: p, retries: r }, Active { position: q, retries: s }) => {
                p == q && s == r + 1 && s <= MAX_EMPTY_RETRIES
            }
            (Active { position: p, .. }, SubFormPending { position: q }) => p == q,
            (Active { position: p, .. }, Exhausted) | (SubFormPending { position: p }, Exhausted) => {
                p + 1 == len
            }
            _ => false,
        }
    }

    /// Transition to `target`, rejecting moves the machine does not allow.
    fn transition_to(&mut self, target: FlowState, len: usize) -> Result<FlowState, FlowError> {
        if !self.can_transition_to(target, len) {
            return Err(FlowError::InvalidTransition {
                from: *self,
                to: target,
            });
        }
        *self = target;
        Ok(target)
    }

    /// Move to the next question, resetting the retry counter.
    pub fn advance(&mut self, len: usize) -> Result<FlowState, FlowError> {
        let position = match *self {
            Self::Active { position, .. } | Self::SubFormPending { position } => position,
            Self::Exhausted => return Err(FlowError::Exhausted),
        };
        let next = if position + 1 >= len {
            Self::Exhausted
        } else {
            Self::Active {
                position: position + 1,
                retries: 0,
            }
        };
        self.transition_to(next, len)
    }

    /// Register an empty answer on a required question.
    ///
    /// Holds the cursor for the first two empties and returns `Skip` on the
    /// third; the caller then advances.
    pub fn record_empty(&mut self, len: usize) -> Result<Escalation, FlowError> {
        match *self {
            Self::Active { position, retries } if retries < MAX_EMPTY_RETRIES => {
                let next = Self::Active {
                    position,
                    retries: retries + 1,
                };
                self.transition_to(next, len)?;
                Ok(Escalation::Clarify { attempt: retries })
            }
            Self::Active { .. } => Ok(Escalation::Skip),
            Self::SubFormPending { .. } => Err(FlowError::SubFormPending),
            Self::Exhausted => Err(FlowError::Exhausted),
        }
    }

    /// Suspend the main sequence on the current question.
    pub fn open_sub_form(&mut self, len: usize) -> Result<(), FlowError> {
        match *self {
            Self::Active { position, .. } => {
                self.transition_to(Self::SubFormPending { position }, len)?;
                Ok(())
            }
            Self::SubFormPending { .. } => Err(FlowError::SubFormPending),
            Self::Exhausted => Err(FlowError::Exhausted),
        }
    }
}
