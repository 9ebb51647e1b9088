//! Session lifecycle state machine
//!
//! `Idle → Active → Finalizing → Idle`, plus `Active → Idle` when a recipe
//! fails or its result is rejected.

use crate::error::{DraftError, DraftResult};
use std::fmt::{self, Display, Formatter};

/// Phase of an edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No edit in progress
    Idle,
    /// Recipe is running against drafts
    Active,
    /// Drafts are being converted into the result graph
    Finalizing,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Finalizing => write!(f, "finalizing"),
        }
    }
}

/// Validates a phase transition.
///
/// # Errors
/// Returns [`DraftError::InternalInvariantViolation`] for illegal transitions
pub fn validate_transition(from: Phase, to: Phase) -> DraftResult<()> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(DraftError::invariant(format!(
            "illegal session transition {from} -> {to}"
        )))
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: Phase) -> &'static [Phase] {
    use Phase::*;
    match from {
        Idle => &[Active],
        Active => &[Finalizing, Idle],
        Finalizing => &[Idle],
    }
}
