//! Shared-reference registry
//!
//! Provides [`ReferenceRegistry`], the single source of truth for "who points
//! at me" during one edit session. Every node reachable from the session root
//! has one entry holding its back-references and, once drafted, its draft.

use crate::error::{DraftError, DraftResult};
use cowl_graph::{DraftId, Heap, Key, NodeId, Value};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// How a child is reachable from a parent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackReference {
    /// Node holding the reference
    pub parent: NodeId,
    /// Slot of `parent` holding the reference
    pub key: Key,
}

/// Per-node bookkeeping
#[derive(Debug, Clone, Default)]
pub struct RegistryEntry {
    parents: IndexMap<NodeId, SmallVec<[Key; 2]>>,
    draft: Option<DraftId>,
}

impl RegistryEntry {
    /// Live draft for this node, if drafted
    #[inline]
    #[must_use]
    pub fn draft(&self) -> Option<DraftId> {
        self.draft
    }

    /// Nodes holding a reference to this node
    pub fn parents(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.parents.keys().copied()
    }

    /// All recorded back-references
    pub fn back_references(&self) -> impl Iterator<Item = BackReference> + '_ {
        self.parents.iter().flat_map(|(parent, keys)| {
            keys.iter().map(|key| BackReference {
                parent: *parent,
                key: key.clone(),
            })
        })
    }

    /// Check if nothing refers to this node
    #[inline]
    #[must_use]
    pub fn is_orphan(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Back-reference registry for one edit session
///
/// # Invariants
/// - One entry per node identity, shared by every path reaching it
/// - At most one draft per node
/// - A drafted node keeps its entry even when its last parent is removed
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    entries: HashMap<NodeId, RegistryEntry>,
}

impl ReferenceRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the graph under `root` once, recording every back-reference
    ///
    /// A node reached a second time (shared child or cycle) is not walked
    /// again, but the new back-reference is still recorded.
    ///
    /// # Errors
    /// Returns error if the walk reaches a handle the heap does not own
    pub fn build(heap: &Heap, root: NodeId) -> DraftResult<Self> {
        let mut registry = Self::new();
        registry.entries.insert(root, RegistryEntry::default());

        let mut visited = HashSet::from([root]);
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for (key, value) in heap.body(node)?.entries() {
                if let Value::Node(child) = value {
                    registry.add(node, key, *child);
                    if visited.insert(*child) {
                        stack.push(*child);
                    }
                }
            }
        }

        Ok(registry)
    }

    /// Record that `parent[key]` refers to `child` (idempotent)
    pub fn add(&mut self, parent: NodeId, key: Key, child: NodeId) {
        let keys = self
            .entries
            .entry(child)
            .or_default()
            .parents
            .entry(parent)
            .or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    /// Forget that `parent[key]` refers to `child`
    ///
    /// Returns `true` if the back-reference existed. An entry left with no
    /// parents and no draft is dropped.
    pub fn remove(&mut self, parent: NodeId, key: &Key, child: NodeId) -> bool {
        let Some(entry) = self.entries.get_mut(&child) else {
            return false;
        };
        let Some(keys) = entry.parents.get_mut(&parent) else {
            return false;
        };
        let Some(pos) = keys.iter().position(|k| k == key) else {
            return false;
        };
        keys.remove(pos);
        if keys.is_empty() {
            entry.parents.shift_remove(&parent);
        }
        if entry.parents.is_empty() && entry.draft.is_none() {
            self.entries.remove(&child);
        }
        true
    }

    /// Install the live draft for `base`
    ///
    /// # Errors
    /// Returns [`DraftError::InternalInvariantViolation`] if `base` is unknown
    /// or already drafted
    pub fn register(&mut self, base: NodeId, draft: DraftId) -> DraftResult<()> {
        let entry = self
            .entries
            .get_mut(&base)
            .ok_or_else(|| DraftError::invariant(format!("no registry entry for {base}")))?;
        if let Some(existing) = entry.draft {
            return Err(DraftError::invariant(format!(
                "{base} already drafted as {existing}"
            )));
        }
        entry.draft = Some(draft);
        Ok(())
    }

    /// Live draft for `base`, if drafted
    #[inline]
    #[must_use]
    pub fn draft(&self, base: NodeId) -> Option<DraftId> {
        self.entries.get(&base).and_then(RegistryEntry::draft)
    }

    /// Entry for `base`
    #[inline]
    #[must_use]
    pub fn entry(&self, base: NodeId) -> Option<&RegistryEntry> {
        self.entries.get(&base)
    }

    /// Check if `base` has an entry
    #[inline]
    #[must_use]
    pub fn contains(&self, base: NodeId) -> bool {
        self.entries.contains_key(&base)
    }

    /// All back-references of `base`
    ///
    /// # Errors
    /// Returns [`DraftError::InternalInvariantViolation`] if `base` is unknown
    pub fn back_references(&self, base: NodeId) -> DraftResult<Vec<BackReference>> {
        self.entries
            .get(&base)
            .map(|entry| entry.back_references().collect())
            .ok_or_else(|| DraftError::invariant(format!("no registry entry for {base}")))
    }

    /// Distinct parents of `base` (empty if unknown)
    #[must_use]
    pub fn parents(&self, base: NodeId) -> Vec<NodeId> {
        self.entries
            .get(&base)
            .map(|entry| entry.parents().collect())
            .unwrap_or_default()
    }

    /// Number of tracked nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no nodes are tracked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
