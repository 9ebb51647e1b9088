//! Result materialization
//!
//! Converts the drafts of a finished session into plain nodes. Unmodified
//! drafts resolve to their base node, so untouched subtrees are shared with
//! the input. Every modified draft becomes exactly one new node: the node id
//! is reserved before the slots are walked, which lets cycles and shared
//! children resolve to the same result node from every path.
//!
//! Because every result id is known as soon as a node is first reached, the
//! walk needs no recursion: reaching a node yields its id and queues its body,
//! and queued bodies are filled in from an explicit stack.

use crate::error::{DraftError, DraftResult};
use crate::registry::ReferenceRegistry;
use crate::state::{Draft, DraftState};
use cowl_graph::{Heap, NodeBody, NodeId, Value};
use std::collections::HashSet;

pub(crate) struct Materializer<'a> {
    heap: &'a mut Heap,
    states: &'a mut [DraftState],
    registry: &'a ReferenceRegistry,
    tag: u32,
    /// Nodes at or above this index were allocated during the session
    watermark: usize,
    auto_freeze: bool,
    visited: HashSet<NodeId>,
    pending: Vec<Job>,
}

/// Body whose slots still have to be finalized before it is installed
struct Job {
    target: NodeId,
    body: NodeBody,
}

impl<'a> Materializer<'a> {
    pub(crate) fn new(
        heap: &'a mut Heap,
        states: &'a mut [DraftState],
        registry: &'a ReferenceRegistry,
        tag: u32,
        watermark: usize,
        auto_freeze: bool,
    ) -> Self {
        Self {
            heap,
            states,
            registry,
            tag,
            watermark,
            auto_freeze,
            visited: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Replace every draft reachable from `value` with its final node
    pub(crate) fn finalize(&mut self, value: Value) -> DraftResult<Value> {
        let result = self.reach(value)?;
        while let Some(Job { target, mut body }) = self.pending.pop() {
            for slot in body.values_mut() {
                let value = std::mem::take(slot);
                *slot = self.reach(value)?;
            }
            self.heap.install(target, body)?;
            if self.auto_freeze {
                self.heap.freeze(target)?;
            }
        }
        Ok(result)
    }

    /// Final value for `value`, queueing any body that still needs filling
    fn reach(&mut self, value: Value) -> DraftResult<Value> {
        match value {
            Value::Draft(draft) => self.reach_draft(draft).map(Value::Node),
            Value::Node(node) => match self.registry.draft(node) {
                Some(draft) => self.reach_draft(draft).map(Value::Node),
                None if self.is_fresh(node) => self.reach_fresh(node).map(Value::Node),
                None => Ok(Value::Node(node)),
            },
            other => Ok(other),
        }
    }

    fn reach_draft(&mut self, draft: Draft) -> DraftResult<NodeId> {
        if draft.session() != self.tag || draft.index() >= self.states.len() {
            return Err(DraftError::unsupported(format!(
                "{draft} does not belong to session {}",
                self.tag
            )));
        }

        let state = &mut self.states[draft.index()];
        let base = state.base;
        if !state.modified {
            return if self.is_fresh(base) {
                self.reach_fresh(base)
            } else {
                Ok(base)
            };
        }
        if let Some(done) = state.finalized {
            return Ok(done);
        }

        let body = state
            .copy
            .take()
            .ok_or_else(|| DraftError::invariant(format!("modified draft of {base} has no copy")))?;
        let copier = self.heap.node(base)?.copier().cloned();
        let result = self.heap.reserve(body.kind(), copier)?;
        self.states[draft.index()].finalized = Some(result);
        self.pending.push(Job { target: result, body });

        tracing::trace!(session = self.tag, base = %base, result = %result, "finalized draft");
        Ok(result)
    }

    /// Nodes allocated by the recipe are rewritten in place
    fn reach_fresh(&mut self, node: NodeId) -> DraftResult<NodeId> {
        if !self.visited.insert(node) || self.heap.is_frozen(node) {
            return Ok(node);
        }
        let body = self.heap.body(node)?.clone();
        self.pending.push(Job { target: node, body });
        Ok(node)
    }

    fn is_fresh(&self, node: NodeId) -> bool {
        node.index() >= self.watermark
    }
}
