//! Slot values and keys
//!
//! Provides [`Value`], the contents of a record field or list element, and
//! [`Key`], the address of a slot within a node.

use crate::id::{DraftId, NodeId};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Contents of one slot
///
/// `Node` and `Draft` are the composite variants: they refer to another
/// node (or to the draft standing in for one) rather than carrying data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / hole
    #[default]
    Null,

    /// Boolean
    Bool(bool),

    /// IEEE-754 double
    Number(f64),

    /// Immutable string
    Str(Arc<str>),

    /// Reference to a heap node
    Node(NodeId),

    /// Reference to a draft of the active edit session
    Draft(DraftId),
}

impl Value {
    /// Check if value refers to a node or draft
    #[inline]
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Node(_) | Self::Draft(_))
    }

    /// Check if value is [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Node handle, if this is a node reference
    #[inline]
    #[must_use]
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Draft handle, if this is a draft reference
    #[inline]
    #[must_use]
    pub fn as_draft(&self) -> Option<DraftId> {
        match self {
            Self::Draft(id) => Some(*id),
            _ => None,
        }
    }

    /// Numeric payload
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean payload
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<DraftId> for Value {
    fn from(id: DraftId) -> Self {
        Self::Draft(id)
    }
}

/// Address of a slot within a node
///
/// Records are addressed by [`Key::Field`], lists by [`Key::Index`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Record field name
    Field(Arc<str>),

    /// List position
    Index(usize),
}

impl Key {
    /// Field name, if this is a record key
    #[inline]
    #[must_use]
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// List position, if this is a list key
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Field(_) => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Field(Arc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Field(Arc::from(name))
    }
}

impl From<Arc<str>> for Key {
    fn from(name: Arc<str>) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}
