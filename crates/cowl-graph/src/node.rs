//! Node storage
//!
//! A node is either a record (ordered field map) or a list. The variant is
//! fixed when the node is allocated and never changes afterwards.

use crate::copy::ShallowCopy;
use crate::heap::GraphError;
use crate::value::{Key, Value};
use indexmap::IndexMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Fundamental kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Field map, addressed by [`Key::Field`]
    Record,

    /// Ordered sequence, addressed by [`Key::Index`]
    List,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => write!(f, "record"),
            Self::List => write!(f, "list"),
        }
    }
}

/// Slots of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    /// Record fields in insertion order
    Record(IndexMap<Arc<str>, Value>),

    /// List elements
    List(Vec<Value>),
}

impl NodeBody {
    /// Empty record
    #[inline]
    #[must_use]
    pub fn record() -> Self {
        Self::Record(IndexMap::new())
    }

    /// Empty list
    #[inline]
    #[must_use]
    pub fn list() -> Self {
        Self::List(Vec::new())
    }

    /// Empty body of the given kind
    #[inline]
    #[must_use]
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Record => Self::record(),
            NodeKind::List => Self::list(),
        }
    }

    /// Kind of this body
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Record(_) => NodeKind::Record,
            Self::List(_) => NodeKind::List,
        }
    }

    /// Number of slots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Record(fields) => fields.len(),
            Self::List(items) => items.len(),
        }
    }

    /// Check if there are no slots
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a slot
    ///
    /// Returns `Ok(None)` when the slot does not exist.
    ///
    /// # Errors
    /// Returns [`GraphError::KindMismatch`] if the key does not address this kind
    pub fn get(&self, key: &Key) -> Result<Option<&Value>, GraphError> {
        match (self, key) {
            (Self::Record(fields), Key::Field(name)) => Ok(fields.get(name)),
            (Self::List(items), Key::Index(i)) => Ok(items.get(*i)),
            _ => Err(self.mismatch(key)),
        }
    }

    /// Check if a slot exists
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }

    /// Write a slot, returning the previous value
    ///
    /// Lists accept an index up to `len`; writing at `len` appends.
    ///
    /// # Errors
    /// Returns error on key/kind mismatch or a list index past the end
    pub fn set(&mut self, key: Key, value: Value) -> Result<Option<Value>, GraphError> {
        match (self, key) {
            (Self::Record(fields), Key::Field(name)) => Ok(fields.insert(name, value)),
            (Self::List(items), Key::Index(i)) => {
                let len = items.len();
                if i < len {
                    Ok(Some(std::mem::replace(&mut items[i], value)))
                } else if i == len {
                    items.push(value);
                    Ok(None)
                } else {
                    Err(GraphError::IndexOutOfBounds { index: i, len })
                }
            }
            (body, key) => Err(body.mismatch(&key)),
        }
    }

    /// Remove a slot, returning the previous value
    ///
    /// Records drop the field and keep the order of the rest. Lists truncate
    /// when the last element is removed and otherwise leave a
    /// [`Value::Null`] hole so later indices do not shift.
    ///
    /// # Errors
    /// Returns [`GraphError::KindMismatch`] if the key does not address this kind
    pub fn remove(&mut self, key: &Key) -> Result<Option<Value>, GraphError> {
        match (self, key) {
            (Self::Record(fields), Key::Field(name)) => Ok(fields.shift_remove(name)),
            (Self::List(items), Key::Index(i)) => {
                let i = *i;
                if i + 1 == items.len() {
                    Ok(items.pop())
                } else if i < items.len() {
                    Ok(Some(std::mem::take(&mut items[i])))
                } else {
                    Ok(None)
                }
            }
            (body, key) => Err(body.mismatch(key)),
        }
    }

    /// Append to a list
    ///
    /// # Errors
    /// Returns [`GraphError::NotAList`] on records
    pub fn push(&mut self, value: Value) -> Result<Key, GraphError> {
        match self {
            Self::List(items) => {
                items.push(value);
                Ok(Key::Index(items.len() - 1))
            }
            Self::Record(_) => Err(GraphError::NotAList),
        }
    }

    /// All keys in slot order
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Self::Record(fields) => fields.keys().cloned().map(Key::Field).collect(),
            Self::List(items) => (0..items.len()).map(Key::Index).collect(),
        }
    }

    /// Iterate over `(key, value)` pairs in slot order
    pub fn entries(&self) -> Box<dyn Iterator<Item = (Key, &Value)> + '_> {
        match self {
            Self::Record(fields) => {
                Box::new(fields.iter().map(|(k, v)| (Key::Field(Arc::clone(k)), v)))
            }
            Self::List(items) => Box::new(items.iter().enumerate().map(|(i, v)| (Key::Index(i), v))),
        }
    }

    /// Iterate mutably over slot values
    pub fn values_mut(&mut self) -> Box<dyn Iterator<Item = &mut Value> + '_> {
        match self {
            Self::Record(fields) => Box::new(fields.values_mut()),
            Self::List(items) => Box::new(items.iter_mut()),
        }
    }

    fn mismatch(&self, key: &Key) -> GraphError {
        GraphError::KindMismatch {
            kind: self.kind(),
            key: key.clone(),
        }
    }
}

/// Node stored in a [`Heap`](crate::Heap)
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) body: NodeBody,
    pub(crate) copier: Option<Arc<dyn ShallowCopy>>,
    pub(crate) frozen: bool,
}

impl Node {
    /// Create an unfrozen node with default copy behavior
    #[inline]
    #[must_use]
    pub fn new(body: NodeBody) -> Self {
        Self {
            body,
            copier: None,
            frozen: false,
        }
    }

    /// Attach a custom copy strategy
    #[inline]
    #[must_use]
    pub fn with_copier(mut self, copier: Arc<dyn ShallowCopy>) -> Self {
        self.copier = Some(copier);
        self
    }

    /// Slots of this node
    #[inline]
    #[must_use]
    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    /// Kind of this node
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    /// Custom copy strategy, if any
    #[inline]
    #[must_use]
    pub fn copier(&self) -> Option<&Arc<dyn ShallowCopy>> {
        self.copier.as_ref()
    }

    /// Whether writes through the heap are rejected
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
