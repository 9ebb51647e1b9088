//! Produce entry points
//!
//! Provides [`Producer`] and the [`produce`] shorthand. A producer opens a
//! [`Session`] over the base node, runs the recipe, and turns the recipe's
//! outcome into the result value:
//!
//! - `Ok(None)` or the root draft itself: the finalized root draft
//! - any other value: that value, finalized, unless the root draft was
//!   modified too ([`DraftError::ConflictingResult`])
//! - `Err(_)`: the session is discarded and the heap keeps only unreachable
//!   scratch nodes

use crate::config::ProduceConfig;
use crate::error::{DraftError, DraftResult};
use crate::session::Session;
use crate::state::Draft;
use cowl_graph::{Heap, Value};

/// Runs recipes against drafts of a base graph
#[derive(Debug, Clone, Copy, Default)]
pub struct Producer {
    config: ProduceConfig,
}

impl Producer {
    /// Create producer with configuration
    #[inline]
    #[must_use]
    pub fn new(config: ProduceConfig) -> Self {
        Self { config }
    }

    /// Configuration in effect
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProduceConfig {
        &self.config
    }

    /// Run `recipe` against a draft of `base` and build the result
    ///
    /// # Errors
    /// - [`DraftError::NotDraftable`] if `base` is not a node
    /// - [`DraftError::UnsupportedOperation`] if `base` is a draft outside
    ///   an active session (use [`Session::produce`] to re-enter)
    /// - [`DraftError::ConflictingResult`] if the recipe modified its draft
    ///   and returned a different value
    /// - any error the recipe returns
    pub fn produce<F>(&self, heap: &mut Heap, base: Value, recipe: F) -> DraftResult<Value>
    where
        F: FnOnce(&mut Session<'_>, Draft) -> DraftResult<Option<Value>>,
    {
        let root = match base {
            Value::Node(root) => root,
            Value::Draft(draft) => {
                return Err(DraftError::unsupported(format!(
                    "{draft} is not part of an active session"
                )))
            }
            other => return Err(DraftError::NotDraftable(format!("{other:?}"))),
        };

        let mut session = Session::open(heap, root, self.config)?;
        let draft = session.root();
        match recipe(&mut session, draft) {
            Ok(outcome) => session.finish(outcome),
            Err(err) => {
                session.abort(&err);
                Err(err)
            }
        }
    }
}

/// Run `recipe` against a draft of `base` with default configuration
///
/// # Errors
/// See [`Producer::produce`]
pub fn produce<F>(heap: &mut Heap, base: Value, recipe: F) -> DraftResult<Value>
where
    F: FnOnce(&mut Session<'_>, Draft) -> DraftResult<Option<Value>>,
{
    Producer::default().produce(heap, base, recipe)
}
