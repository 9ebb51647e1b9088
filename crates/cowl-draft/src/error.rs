//! Error types for draft sessions
//!
//! Provides error handling for:
//! - Bookkeeping bugs inside the session (never caller-recoverable)
//! - Operations a draft cannot express
//! - Ambiguous recipe results
//! - Caller-initiated aborts

use cowl_graph::GraphError;

/// Main draft session error type
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// Registry or draft bookkeeping is inconsistent (a bug in this crate)
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// The draft model cannot express this operation
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Recipe both modified the draft and returned a replacement
    #[error("recipe modified its draft and also returned a different value")]
    ConflictingResult,

    /// Base value is not a node
    #[error("cannot draft a non-node value: {0}")]
    NotDraftable(String),

    /// Recipe gave up; the base is left untouched
    #[error("recipe aborted: {0}")]
    Aborted(String),

    /// Heap error not covered by the kinds above
    #[error("graph error: {0}")]
    Graph(GraphError),
}

impl DraftError {
    /// Create an abort error from a recipe
    pub fn abort(message: impl Into<String>) -> Self {
        Self::Aborted(message.into())
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::InternalInvariantViolation(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }

    /// Check if the caller can reasonably retry with different input
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !self.is_internal()
    }

    /// Check if this error signals a bug in the session bookkeeping
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalInvariantViolation(_))
    }
}

impl From<GraphError> for DraftError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::KindMismatch { .. }
            | GraphError::IndexOutOfBounds { .. }
            | GraphError::NotAList
            | GraphError::KindChanged { .. } => Self::UnsupportedOperation(err.to_string()),
            GraphError::UnknownNode(_) => Self::InternalInvariantViolation(err.to_string()),
            other => Self::Graph(other),
        }
    }
}

/// Result type alias for draft operations
pub type DraftResult<T> = Result<T, DraftError>;
