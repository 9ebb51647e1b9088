//! Per-node draft state

use cowl_graph::{DraftId, Key, NodeBody, NodeId};
use std::collections::HashMap;

/// Handle through which a recipe reads and writes one node
///
/// Copyable and only meaningful inside the session that minted it; all
/// reads and writes go through [`Session`](crate::Session) methods.
pub type Draft = DraftId;

/// Copy-on-write state behind a [`Draft`]
///
/// # Invariants
/// - `modified` implies `copy` is populated
/// - `overlay` is authoritative only while unmodified; marking the state
///   modified merges it into `copy`
/// - `finalized` is set at most once, by the materializer
#[derive(Debug, Clone)]
pub struct DraftState {
    pub(crate) base: NodeId,
    pub(crate) copy: Option<NodeBody>,
    pub(crate) modified: bool,
    pub(crate) parent: Option<Draft>,
    pub(crate) overlay: HashMap<Key, Draft>,
    pub(crate) finalized: Option<NodeId>,
}

impl DraftState {
    pub(crate) fn new(base: NodeId, parent: Option<Draft>) -> Self {
        Self {
            base,
            copy: None,
            modified: false,
            parent,
            overlay: HashMap::new(),
            finalized: None,
        }
    }

    /// Node this draft stands in for
    #[inline]
    #[must_use]
    pub fn base(&self) -> NodeId {
        self.base
    }

    /// Whether a private copy exists
    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Draft through which this one was first reached or propagated to
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Draft> {
        self.parent
    }

    /// Private copy, once modified
    #[inline]
    #[must_use]
    pub fn copy(&self) -> Option<&NodeBody> {
        self.copy.as_ref()
    }

    /// Child drafts read but not yet merged into a copy
    #[inline]
    #[must_use]
    pub fn overlay(&self) -> &HashMap<Key, Draft> {
        &self.overlay
    }
}
