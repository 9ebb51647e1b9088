//! Key paths for addressing nested slots
//!
//! Provides [`KeyPath`] for walking from a node to a nested slot, e.g.
//! `all.2.value` → field `all`, element `2`, field `value`.

use crate::node::NodeKind;
use crate::value::Key;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Path from a node to a nested slot
///
/// Segments made only of ASCII digits parse as [`Key::Index`], everything
/// else as [`Key::Field`]. Navigation coerces a segment to the kind of the
/// node it is applied to (see [`Key::for_kind`]), so `"0"` can address both
/// a list element and a record field literally named `0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyPath(Vec<Key>);

impl KeyPath {
    /// Create new path from keys
    #[inline]
    #[must_use]
    pub fn new(keys: Vec<Key>) -> Self {
        Self(keys)
    }

    /// Empty path (the node itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path keys
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a key, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut new = self.clone();
        new.0.push(key.into());
        new
    }

    /// Iterator over keys from the start node outwards
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.0.iter()
    }
}

impl Key {
    /// Reinterpret this key for a node of the given kind
    ///
    /// An index addressing a record becomes the field of the same name; a
    /// numeric field addressing a list becomes an index. Other keys are
    /// returned unchanged (and will be rejected by the node).
    #[must_use]
    pub fn for_kind(&self, kind: NodeKind) -> Key {
        match (self, kind) {
            (Key::Index(i), NodeKind::Record) => Key::Field(Arc::from(i.to_string())),
            (Key::Field(name), NodeKind::List) => match name.parse::<usize>() {
                Ok(i) => Key::Index(i),
                Err(_) => self.clone(),
            },
            _ => self.clone(),
        }
    }
}

impl Display for KeyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for key in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{key}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let keys: Vec<Key> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment)
                } else if seg.bytes().all(|b| b.is_ascii_digit()) {
                    seg.parse::<usize>()
                        .map(Key::Index)
                        .map_err(|_| PathError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(Key::from(seg))
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(keys))
    }
}

impl From<Vec<Key>> for KeyPath {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys)
    }
}

/// Errors related to key paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Segment that cannot be represented as a key
    #[error("invalid segment: {0}")]
    InvalidSegment(String),
}
