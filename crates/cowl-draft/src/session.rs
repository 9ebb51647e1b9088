//! Edit sessions
//!
//! Provides [`Session`], which owns the [`ReferenceRegistry`] and every
//! [`DraftState`] of one `produce` call. Recipes read and write the graph
//! exclusively through session methods; the base nodes in the heap are
//! never written, only copied.
//!
//! # Copy-on-write
//!
//! A draft starts out reading straight from its base node. The first write
//! anywhere below a node gives that node a private shallow copy, and the
//! fact "this node changed" is pushed to *every* recorded parent, not only
//! the one the recipe came through, so shared children look the same from
//! every path in the result.

use crate::config::ProduceConfig;
use crate::error::{DraftError, DraftResult};
use crate::finalize::Materializer;
use crate::lifecycle::{validate_transition, Phase};
use crate::produce::Producer;
use crate::registry::{BackReference, ReferenceRegistry};
use crate::state::{Draft, DraftState};
use cowl_graph::{same_value, DraftId, GraphError, Heap, Key, KeyPath, NodeBody, NodeId, NodeKind, Value};

/// One edit session over a [`Heap`]
///
/// Created by [`Producer::produce`](crate::Producer::produce) and handed to
/// the recipe. Holds the heap exclusively for its whole lifetime, so a
/// session and its drafts are confined to one thread of control.
#[derive(Debug)]
pub struct Session<'h> {
    heap: &'h mut Heap,
    config: ProduceConfig,
    tag: u32,
    registry: ReferenceRegistry,
    states: Vec<DraftState>,
    watermark: usize,
    phase: Phase,
    root: Draft,
}

impl<'h> Session<'h> {
    pub(crate) fn open(heap: &'h mut Heap, root: NodeId, config: ProduceConfig) -> DraftResult<Self> {
        if !heap.contains(root) {
            return Err(DraftError::NotDraftable(format!("unknown node {root}")));
        }
        let registry = ReferenceRegistry::build(heap, root)?;
        let tag = heap.open_session();
        let watermark = heap.len();

        let mut session = Self {
            heap,
            config,
            tag,
            registry,
            states: Vec::new(),
            watermark,
            phase: Phase::Idle,
            root: DraftId::new(tag, 0),
        };
        session.root = session.create_draft(root, None)?;
        session.transition(Phase::Active)?;

        tracing::debug!(
            session = tag,
            root = %root,
            tracked = session.registry.len(),
            "opened edit session"
        );
        Ok(session)
    }

    /// Draft of the node the session was opened on
    #[inline]
    #[must_use]
    pub fn root(&self) -> Draft {
        self.root
    }

    /// Tag shared by every draft of this session
    #[inline]
    #[must_use]
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Current lifecycle phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Configuration in effect
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProduceConfig {
        &self.config
    }

    /// Read-only view of the heap
    #[inline]
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &*self.heap
    }

    /// Back-reference registry of this session
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    /// Number of drafts created so far
    #[inline]
    #[must_use]
    pub fn draft_count(&self) -> usize {
        self.states.len()
    }

    /// State behind a draft
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for drafts of other sessions
    pub fn state(&self, draft: Draft) -> DraftResult<&DraftState> {
        let idx = self.resolve(draft)?;
        Ok(&self.states[idx])
    }

    /// Check if `value` is a draft of this session
    #[must_use]
    pub fn is_draft(&self, value: &Value) -> bool {
        value.as_draft().is_some_and(|draft| self.resolve(draft).is_ok())
    }

    /// Base node a draft stands in for
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for drafts of other sessions
    pub fn original(&self, draft: Draft) -> DraftResult<NodeId> {
        self.state(draft).map(DraftState::base)
    }

    /// Whether a draft has a private copy
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for drafts of other sessions
    pub fn is_modified(&self, draft: Draft) -> DraftResult<bool> {
        self.state(draft).map(DraftState::is_modified)
    }

    /// Kind of the drafted node
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for drafts of other sessions
    pub fn kind(&self, draft: Draft) -> DraftResult<NodeKind> {
        let idx = self.resolve(draft)?;
        Ok(self.source(idx)?.kind())
    }

    /// Number of slots currently visible through a draft
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for drafts of other sessions
    pub fn len(&self, draft: Draft) -> DraftResult<usize> {
        let idx = self.resolve(draft)?;
        Ok(self.source(idx)?.len())
    }

    /// Keys currently visible through a draft, in slot order
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for drafts of other sessions
    pub fn keys(&self, draft: Draft) -> DraftResult<Vec<Key>> {
        let idx = self.resolve(draft)?;
        Ok(self.source(idx)?.keys())
    }

    /// Check if a slot exists
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for drafts of other sessions
    pub fn has(&self, draft: Draft, key: impl Into<Key>) -> DraftResult<bool> {
        let idx = self.resolve(draft)?;
        Ok(self.source(idx)?.contains_key(&key.into()))
    }

    /// Read a slot
    ///
    /// Node-valued slots come back as drafts; a node reachable from several
    /// parents always yields the same draft. Missing slots read as
    /// [`Value::Null`].
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for key/kind mismatch or
    /// drafts of other sessions
    pub fn get(&mut self, draft: Draft, key: impl Into<Key>) -> DraftResult<Value> {
        self.ensure_active()?;
        let idx = self.resolve(draft)?;
        let key = key.into();

        let state = &self.states[idx];
        let base = state.base;
        let modified = state.modified;
        if !modified {
            if let Some(child) = state.overlay.get(&key) {
                return Ok(Value::Draft(*child));
            }
        }

        let value = self.source(idx)?.get(&key)?.cloned().unwrap_or_default();
        let Value::Node(child) = value else {
            return Ok(value);
        };

        let child_draft = self.adopt(draft, base, &key, child)?;
        if modified {
            self.copy_mut(idx)?.set(key, Value::Draft(child_draft))?;
        } else {
            self.states[idx].overlay.insert(key, child_draft);
        }
        Ok(Value::Draft(child_draft))
    }

    /// Read a node-valued slot as a draft
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] if the slot does not hold a node
    pub fn child(&mut self, draft: Draft, key: impl Into<Key>) -> DraftResult<Draft> {
        let key = key.into();
        self.get(draft, key.clone())?
            .as_draft()
            .ok_or_else(|| DraftError::unsupported(format!("slot '{key}' does not hold a node")))
    }

    /// Follow a path of keys starting at `draft`
    ///
    /// # Errors
    /// Returns error if an intermediate slot does not hold a node
    pub fn get_path(&mut self, draft: Draft, path: &KeyPath) -> DraftResult<Value> {
        let mut current = Value::Draft(draft);
        let mut walked = KeyPath::root();
        for key in path.iter() {
            let Value::Draft(node) = current else {
                return Err(GraphError::NotComposite {
                    path: walked.to_string(),
                }
                .into());
            };
            let key = key.for_kind(self.kind(node)?);
            walked = walked.child(key.clone());
            current = self.get(node, key)?;
        }
        Ok(current)
    }

    /// Write a slot
    ///
    /// Writing a value equal to what the slot already holds (or the draft
    /// already read from it) is a no-op and forces no copy. Otherwise the
    /// draft and every ancestor recorded for it get private copies.
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for key/kind mismatch, a
    /// list index past the end, or values referring to foreign drafts or
    /// nodes; nothing is modified in that case
    pub fn set(&mut self, draft: Draft, key: impl Into<Key>, value: Value) -> DraftResult<()> {
        self.ensure_active()?;
        let idx = self.resolve(draft)?;
        let key = key.into();
        let new_child = self.child_base(&value)?;

        let current = {
            let source = self.source(idx)?;
            let current = source.get(&key)?.cloned();
            check_writable(source, &key)?;
            current
        };

        let state = &self.states[idx];
        let base = state.base;
        if !state.modified {
            let same_as_base = current
                .as_ref()
                .is_some_and(|c| same_value(c, &value, self.config.equality));
            let same_as_overlay =
                value.as_draft().is_some() && state.overlay.get(&key).copied() == value.as_draft();
            if same_as_base || same_as_overlay {
                return Ok(());
            }
        }

        let old_child = match &current {
            Some(old) => self.child_base(old)?,
            None => None,
        };
        let value = self.canonicalize(value);

        if let Some(child) = new_child {
            self.registry.add(base, key.clone(), child);
        }
        self.mark_modified(draft)?;
        self.copy_mut(idx)?.set(key.clone(), value)?;

        if let Some(old) = old_child {
            if Some(old) != new_child {
                self.registry.remove(base, &key, old);
            }
        }
        Ok(())
    }

    /// Remove a slot
    ///
    /// On lists, removing the last element truncates; any other index is
    /// left as a [`Value::Null`] hole so sibling indices do not shift.
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for key/kind mismatch or
    /// drafts of other sessions
    pub fn delete(&mut self, draft: Draft, key: impl Into<Key>) -> DraftResult<()> {
        self.ensure_active()?;
        let idx = self.resolve(draft)?;
        let key = key.into();

        let base = self.states[idx].base;
        let current = self.source(idx)?.get(&key)?.cloned();
        let old_child = match &current {
            Some(old) => self.child_base(old)?,
            None => None,
        };

        self.mark_modified(draft)?;
        self.copy_mut(idx)?.remove(&key)?;

        if let Some(old) = old_child {
            self.registry.remove(base, &key, old);
        }
        Ok(())
    }

    /// Append to a list draft, returning the new element's key
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] on records
    pub fn push(&mut self, draft: Draft, value: Value) -> DraftResult<Key> {
        let idx = self.resolve(draft)?;
        let len = match self.source(idx)? {
            NodeBody::List(items) => items.len(),
            NodeBody::Record(_) => return Err(GraphError::NotAList.into()),
        };
        let key = Key::Index(len);
        self.set(draft, key.clone(), value)?;
        Ok(key)
    }

    /// Remove and return the last element of a list draft
    ///
    /// Returns [`Value::Null`] for an empty list without modifying it.
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] on records
    pub fn pop(&mut self, draft: Draft) -> DraftResult<Value> {
        let idx = self.resolve(draft)?;
        let len = match self.source(idx)? {
            NodeBody::List(items) => items.len(),
            NodeBody::Record(_) => return Err(GraphError::NotAList.into()),
        };
        if len == 0 {
            return Ok(Value::Null);
        }
        let key = Key::Index(len - 1);
        let value = self.get(draft, key.clone())?;
        self.delete(draft, key)?;
        Ok(value)
    }

    /// Allocate a new node for use inside this edit
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] if `body` refers to
    /// foreign drafts or nodes
    pub fn alloc(&mut self, body: NodeBody) -> DraftResult<NodeId> {
        self.ensure_active()?;
        let mut children = Vec::new();
        for (key, value) in body.entries() {
            if let Some(child) = self.child_base(value)? {
                children.push((key, child));
            }
        }
        let node = self.heap.alloc(body)?;
        for (key, child) in children {
            self.registry.add(node, key, child);
        }
        Ok(node)
    }

    /// Allocate an empty record for use inside this edit
    ///
    /// # Errors
    /// Returns error if the session is no longer active
    pub fn alloc_record(&mut self) -> DraftResult<NodeId> {
        self.alloc(NodeBody::record())
    }

    /// Allocate an empty list for use inside this edit
    ///
    /// # Errors
    /// Returns error if the session is no longer active
    pub fn alloc_list(&mut self) -> DraftResult<NodeId> {
        self.alloc(NodeBody::list())
    }

    /// Give a draft its private copy and propagate to every recorded ancestor
    ///
    /// Every back-reference of the node is followed, including parents the
    /// recipe never read; those are drafted on the spot. Each parent's copy
    /// is then pointed at the child's draft so the result shares one
    /// realized child across all paths. Parents that were unlinked from the
    /// graph and never drafted no longer have an entry and are skipped.
    ///
    /// # Errors
    /// Returns error if a copy strategy changes the node kind
    pub fn mark_modified(&mut self, draft: Draft) -> DraftResult<()> {
        self.resolve(draft)?;
        let mut pending = vec![draft];
        let mut rewires: Vec<(Draft, Key, NodeId, Draft)> = Vec::new();

        while let Some(current) = pending.pop() {
            let idx = current.index();
            if self.states[idx].modified {
                continue;
            }

            let base = self.states[idx].base;
            let mut copy = self.heap.shallow_copy(base)?;
            for (key, child) in std::mem::take(&mut self.states[idx].overlay) {
                copy.set(key, Value::Draft(child))?;
            }
            let state = &mut self.states[idx];
            state.copy = Some(copy);
            state.modified = true;
            tracing::trace!(session = self.tag, base = %base, "materialized private copy");

            for BackReference { parent, key } in self.registry.back_references(base)? {
                if !self.registry.contains(parent) {
                    // Detached from the graph earlier in this edit
                    tracing::trace!(session = self.tag, parent = %parent, child = %base, "skipped detached parent");
                    continue;
                }
                let parent_draft = match self.registry.draft(parent) {
                    Some(existing) => existing,
                    None => self.create_draft(parent, None)?,
                };
                if parent_draft != current {
                    self.states[idx].parent.get_or_insert(parent_draft);
                }
                rewires.push((parent_draft, key, base, current));
                pending.push(parent_draft);
            }
        }

        for (parent, key, child_base, child_draft) in rewires {
            let copy = self.copy_mut(parent.index())?;
            if matches!(copy.get(&key), Ok(Some(Value::Node(n))) if *n == child_base) {
                copy.set(key, Value::Draft(child_draft))?;
            }
        }
        Ok(())
    }

    /// Run a nested recipe
    ///
    /// With a draft of this session the recipe runs directly against it; no
    /// second registry is opened and `Ok(None)` yields the same draft. With
    /// a plain node a nested session is opened over the same heap.
    ///
    /// # Errors
    /// Returns [`DraftError::UnsupportedOperation`] for drafts of other
    /// sessions and [`DraftError::NotDraftable`] for primitives
    pub fn produce<F>(&mut self, base: Value, recipe: F) -> DraftResult<Value>
    where
        F: FnOnce(&mut Session<'_>, Draft) -> DraftResult<Option<Value>>,
    {
        self.ensure_active()?;
        match base {
            Value::Draft(draft) => {
                self.resolve(draft)?;
                tracing::trace!(session = self.tag, draft = %draft, "re-entered active session");
                Ok(recipe(self, draft)?.unwrap_or(Value::Draft(draft)))
            }
            Value::Node(node) => Producer::new(self.config).produce(&mut *self.heap, Value::Node(node), recipe),
            other => Err(DraftError::NotDraftable(format!("{other:?}"))),
        }
    }

    /// Resolve the recipe's outcome and build the result graph
    pub(crate) fn finish(mut self, outcome: Option<Value>) -> DraftResult<Value> {
        let root = self.root;
        let value = match outcome {
            None => Value::Draft(root),
            Some(Value::Draft(draft)) if draft == root => Value::Draft(root),
            Some(replacement) => {
                if self.config.check_conflicting_result && self.states[root.index()].modified {
                    tracing::warn!(
                        session = self.tag,
                        "recipe modified its draft and returned a replacement"
                    );
                    self.abort(&DraftError::ConflictingResult);
                    return Err(DraftError::ConflictingResult);
                }
                replacement
            }
        };

        self.transition(Phase::Finalizing)?;
        let result = Materializer::new(
            &mut *self.heap,
            &mut self.states,
            &self.registry,
            self.tag,
            self.watermark,
            self.config.auto_freeze,
        )
        .finalize(value)?;
        self.transition(Phase::Idle)?;

        tracing::debug!(
            session = self.tag,
            drafts = self.states.len(),
            modified = self.states.iter().filter(|s| s.modified).count(),
            "finalized edit session"
        );
        Ok(result)
    }

    /// Discard the session without producing a result
    pub(crate) fn abort(mut self, reason: &DraftError) {
        if validate_transition(self.phase, Phase::Idle).is_ok() {
            self.phase = Phase::Idle;
        }
        tracing::debug!(session = self.tag, error = %reason, "aborted edit session");
    }

    fn transition(&mut self, to: Phase) -> DraftResult<()> {
        validate_transition(self.phase, to)?;
        self.phase = to;
        Ok(())
    }

    fn ensure_active(&self) -> DraftResult<()> {
        if self.phase == Phase::Active {
            Ok(())
        } else {
            Err(DraftError::unsupported(format!(
                "session {} is {}",
                self.tag, self.phase
            )))
        }
    }

    fn resolve(&self, draft: Draft) -> DraftResult<usize> {
        if draft.session() != self.tag || draft.index() >= self.states.len() {
            return Err(DraftError::unsupported(format!(
                "{draft} does not belong to session {}",
                self.tag
            )));
        }
        Ok(draft.index())
    }

    fn create_draft(&mut self, base: NodeId, parent: Option<Draft>) -> DraftResult<Draft> {
        let index = u32::try_from(self.states.len())
            .map_err(|_| DraftError::invariant("draft arena exhausted"))?;
        let draft = DraftId::new(self.tag, index);
        self.registry.register(base, draft)?;
        self.states.push(DraftState::new(base, parent));
        Ok(draft)
    }

    /// Draft for `child` reached through `parent_base[key]`
    fn adopt(&mut self, parent: Draft, parent_base: NodeId, key: &Key, child: NodeId) -> DraftResult<Draft> {
        self.registry.add(parent_base, key.clone(), child);
        match self.registry.draft(child) {
            Some(existing) => Ok(existing),
            None => self.create_draft(child, Some(parent)),
        }
    }

    fn source(&self, idx: usize) -> DraftResult<&NodeBody> {
        let state = &self.states[idx];
        if state.modified {
            state
                .copy
                .as_ref()
                .ok_or_else(|| DraftError::invariant(format!("modified draft of {} has no copy", state.base)))
        } else {
            Ok(self.heap.body(state.base)?)
        }
    }

    fn copy_mut(&mut self, idx: usize) -> DraftResult<&mut NodeBody> {
        let state = &mut self.states[idx];
        let base = state.base;
        state
            .copy
            .as_mut()
            .ok_or_else(|| DraftError::invariant(format!("draft of {base} has no copy")))
    }

    /// Base node referred to by a slot value
    fn child_base(&self, value: &Value) -> DraftResult<Option<NodeId>> {
        match value {
            Value::Node(node) if self.heap.contains(*node) => Ok(Some(*node)),
            Value::Node(node) => Err(DraftError::unsupported(format!("unknown node {node}"))),
            Value::Draft(draft) => Ok(Some(self.states[self.resolve(*draft)?].base)),
            _ => Ok(None),
        }
    }

    /// Store drafted nodes as their draft so later edits stay visible
    fn canonicalize(&self, value: Value) -> Value {
        match value {
            Value::Node(node) => self.registry.draft(node).map_or(Value::Node(node), Value::Draft),
            other => other,
        }
    }
}

fn check_writable(body: &NodeBody, key: &Key) -> DraftResult<()> {
    if let (NodeBody::List(items), Key::Index(i)) = (body, key) {
        if *i > items.len() {
            return Err(GraphError::IndexOutOfBounds {
                index: *i,
                len: items.len(),
            }
            .into());
        }
    }
    Ok(())
}
