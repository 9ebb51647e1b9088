//! Node and draft handles
//!
//! Provides [`NodeId`], the identity of a node inside a [`Heap`](crate::Heap),
//! and [`DraftId`], the identity of a draft inside one edit session.

use std::fmt::{self, Display, Formatter};

/// Handle to a node stored in a [`Heap`](crate::Heap)
///
/// Non-owning and `Copy`. Two slots hold "the same node" exactly when they
/// hold equal `NodeId`s, which is what structural sharing is measured by.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a handle from a raw arena index
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw arena index
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Raw arena index as `usize`
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a draft minted by one edit session
///
/// The session tag lets a session reject drafts that belong to another
/// (finished or unrelated) session instead of misreading its own arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DraftId {
    session: u32,
    index: u32,
}

impl DraftId {
    /// Create a draft handle
    #[inline]
    #[must_use]
    pub const fn new(session: u32, index: u32) -> Self {
        Self { session, index }
    }

    /// Tag of the session that minted this draft
    #[inline]
    #[must_use]
    pub const fn session(self) -> u32 {
        self.session
    }

    /// Index into the owning session's draft arena
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl Display for DraftId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "draft({}:{})", self.session, self.index)
    }
}
