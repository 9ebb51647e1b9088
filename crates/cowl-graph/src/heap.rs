//! Node arena
//!
//! Provides [`Heap`], the arena that owns every node of a graph. Nodes are
//! addressed by [`NodeId`] and never move or disappear, so ids stay valid for
//! the lifetime of the heap and shared children or cycles need no owning
//! pointers.

use crate::copy::ShallowCopy;
use crate::id::NodeId;
use crate::node::{Node, NodeBody, NodeKind};
use crate::path::{KeyPath, PathError};
use crate::value::{Key, Value};
use std::sync::Arc;

/// Errors related to heap operations
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Handle does not belong to this heap
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Key cannot address a node of this kind
    #[error("key '{key}' cannot address a {kind}")]
    KindMismatch { kind: NodeKind, key: Key },

    /// List write past the end
    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// List-only operation on a record
    #[error("operation requires a list")]
    NotAList,

    /// Node was frozen by a finished edit
    #[error("node {0} is frozen")]
    Frozen(NodeId),

    /// Copy strategy changed the node kind
    #[error("copy changed node kind: expected {expected}, got {actual}")]
    KindChanged { expected: NodeKind, actual: NodeKind },

    /// Node id space is used up
    #[error("heap exhausted: no node ids left")]
    Exhausted,

    /// Path walked through a non-node value
    #[error("'{path}' does not refer to a node")]
    NotComposite { path: String },

    /// Malformed path
    #[error("path error: {0}")]
    Path(#[from] PathError),
}

/// Result type alias for heap operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Arena owning every node of one or more graphs
///
/// # Invariants
/// - A `NodeId` handed out by this heap stays valid until the heap is dropped
/// - A node's kind never changes after allocation
/// - Frozen nodes reject writes
#[derive(Debug, Default)]
pub struct Heap {
    nodes: Vec<Node>,
    sessions: u32,
}

impl Heap {
    /// Create empty heap
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create heap with room for `capacity` nodes
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            sessions: 0,
        }
    }

    /// Number of nodes ever allocated
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if heap holds no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node
    ///
    /// # Errors
    /// Returns [`GraphError::Exhausted`] once every `u32` id is in use
    pub fn alloc_node(&mut self, node: Node) -> GraphResult<NodeId> {
        let id = next_id(self.nodes.len())?;
        self.nodes.push(node);
        Ok(id)
    }

    /// Allocate a node with default copy behavior
    ///
    /// # Errors
    /// Returns [`GraphError::Exhausted`] once every `u32` id is in use
    #[inline]
    pub fn alloc(&mut self, body: NodeBody) -> GraphResult<NodeId> {
        self.alloc_node(Node::new(body))
    }

    /// Allocate an empty record
    ///
    /// # Errors
    /// Returns [`GraphError::Exhausted`] once every `u32` id is in use
    #[inline]
    pub fn alloc_record(&mut self) -> GraphResult<NodeId> {
        self.alloc(NodeBody::record())
    }

    /// Allocate an empty list
    ///
    /// # Errors
    /// Returns [`GraphError::Exhausted`] once every `u32` id is in use
    #[inline]
    pub fn alloc_list(&mut self) -> GraphResult<NodeId> {
        self.alloc(NodeBody::list())
    }

    /// Allocate a node whose copies are produced by `copier`
    ///
    /// # Errors
    /// Returns [`GraphError::Exhausted`] once every `u32` id is in use
    #[inline]
    pub fn alloc_with_copier(&mut self, body: NodeBody, copier: Arc<dyn ShallowCopy>) -> GraphResult<NodeId> {
        self.alloc_node(Node::new(body).with_copier(copier))
    }

    /// Allocate an empty node to be filled later with [`Heap::install`]
    ///
    /// Lets a graph that refers to itself be built before its slots are known.
    ///
    /// # Errors
    /// Returns [`GraphError::Exhausted`] once every `u32` id is in use
    pub fn reserve(&mut self, kind: NodeKind, copier: Option<Arc<dyn ShallowCopy>>) -> GraphResult<NodeId> {
        let mut node = Node::new(NodeBody::empty(kind));
        node.copier = copier;
        self.alloc_node(node)
    }

    /// Check if a handle belongs to this heap
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Look up a node
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownNode`] for foreign handles
    #[inline]
    pub fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(id.index()).ok_or(GraphError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownNode(id))?;
        if node.frozen {
            return Err(GraphError::Frozen(id));
        }
        Ok(node)
    }

    /// Slots of a node
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownNode`] for foreign handles
    #[inline]
    pub fn body(&self, id: NodeId) -> GraphResult<&NodeBody> {
        self.node(id).map(Node::body)
    }

    /// Mutable slots of an unfrozen node
    ///
    /// # Errors
    /// Returns error for foreign handles or frozen nodes
    #[inline]
    pub fn body_mut(&mut self, id: NodeId) -> GraphResult<&mut NodeBody> {
        self.node_mut(id).map(|node| &mut node.body)
    }

    /// Kind of a node
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownNode`] for foreign handles
    #[inline]
    pub fn kind(&self, id: NodeId) -> GraphResult<NodeKind> {
        self.node(id).map(Node::kind)
    }

    /// Check if a node is a list (`false` for foreign handles)
    #[inline]
    #[must_use]
    pub fn is_list(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Ok(NodeKind::List))
    }

    /// Read a slot; missing slots read as [`Value::Null`]
    ///
    /// # Errors
    /// Returns error for foreign handles or key/kind mismatch
    pub fn get(&self, id: NodeId, key: impl Into<Key>) -> GraphResult<Value> {
        let key = key.into();
        Ok(self.body(id)?.get(&key)?.cloned().unwrap_or_default())
    }

    /// Write a slot, returning the previous value
    ///
    /// # Errors
    /// Returns error for foreign handles, frozen nodes, key/kind mismatch,
    /// or list writes past the end
    pub fn set(&mut self, id: NodeId, key: impl Into<Key>, value: Value) -> GraphResult<Option<Value>> {
        self.body_mut(id)?.set(key.into(), value)
    }

    /// Append to a list node
    ///
    /// # Errors
    /// Returns error for foreign handles, frozen nodes, or records
    pub fn push(&mut self, id: NodeId, value: Value) -> GraphResult<Key> {
        self.body_mut(id)?.push(value)
    }

    /// Remove a slot, returning the previous value
    ///
    /// # Errors
    /// Returns error for foreign handles, frozen nodes, or key/kind mismatch
    pub fn remove(&mut self, id: NodeId, key: impl Into<Key>) -> GraphResult<Option<Value>> {
        let key = key.into();
        self.body_mut(id)?.remove(&key)
    }

    /// Replace the slots of an unfrozen node
    ///
    /// # Errors
    /// Returns error for foreign handles, frozen nodes, or a body of a
    /// different kind
    pub fn install(&mut self, id: NodeId, body: NodeBody) -> GraphResult<()> {
        let node = self.node_mut(id)?;
        if node.kind() != body.kind() {
            return Err(GraphError::KindChanged {
                expected: node.kind(),
                actual: body.kind(),
            });
        }
        node.body = body;
        Ok(())
    }

    /// Follow a path of keys starting at `id`
    ///
    /// # Errors
    /// Returns error if an intermediate slot is not a node reference
    pub fn get_path(&self, id: NodeId, path: &KeyPath) -> GraphResult<Value> {
        let mut current = Value::Node(id);
        let mut walked = KeyPath::root();
        for key in path.iter() {
            let Value::Node(node) = current else {
                return Err(GraphError::NotComposite {
                    path: walked.to_string(),
                });
            };
            current = self.get(node, key.for_kind(self.kind(node)?))?;
            walked = walked.child(key.clone());
        }
        Ok(current)
    }

    /// One-level duplicate of a node's slots
    ///
    /// Uses the node's [`ShallowCopy`] strategy when it has one; child
    /// references are carried over unchanged.
    ///
    /// # Errors
    /// Returns [`GraphError::KindChanged`] if a strategy alters the kind
    pub fn shallow_copy(&self, id: NodeId) -> GraphResult<NodeBody> {
        let node = self.node(id)?;
        match &node.copier {
            None => Ok(node.body.clone()),
            Some(copier) => {
                let copy = copier.shallow_copy(&node.body);
                if copy.kind() == node.kind() {
                    Ok(copy)
                } else {
                    Err(GraphError::KindChanged {
                        expected: node.kind(),
                        actual: copy.kind(),
                    })
                }
            }
        }
    }

    /// Reject further writes to a node
    ///
    /// # Errors
    /// Returns [`GraphError::UnknownNode`] for foreign handles
    pub fn freeze(&mut self, id: NodeId) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownNode(id))?;
        node.frozen = true;
        Ok(())
    }

    /// Check if a node is frozen (`false` for foreign handles)
    #[inline]
    #[must_use]
    pub fn is_frozen(&self, id: NodeId) -> bool {
        self.node(id).is_ok_and(Node::is_frozen)
    }

    /// Hand out a fresh tag for an edit session
    pub fn open_session(&mut self) -> u32 {
        self.sessions = self.sessions.wrapping_add(1);
        self.sessions
    }
}

/// Id for the node stored at position `len`
fn next_id(len: usize) -> GraphResult<NodeId> {
    u32::try_from(len).map(NodeId::new).map_err(|_| GraphError::Exhausted)
}
