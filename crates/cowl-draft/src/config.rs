//! Produce configuration

use cowl_graph::Equality;

/// Configuration for [`Producer`](crate::Producer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProduceConfig {
    /// Freeze every node created while finalizing
    pub auto_freeze: bool,
    /// Equality used by the write no-op guard
    pub equality: Equality,
    /// Reject recipes that modify the draft and return a replacement
    pub check_conflicting_result: bool,
}

impl ProduceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With auto-freeze
    #[inline]
    #[must_use]
    pub fn with_auto_freeze(mut self, auto_freeze: bool) -> Self {
        self.auto_freeze = auto_freeze;
        self
    }

    /// With no-op guard equality
    #[inline]
    #[must_use]
    pub fn with_equality(mut self, equality: Equality) -> Self {
        self.equality = equality;
        self
    }

    /// With conflicting-result check
    #[inline]
    #[must_use]
    pub fn with_conflict_check(mut self, check: bool) -> Self {
        self.check_conflicting_result = check;
        self
    }
}

impl Default for ProduceConfig {
    fn default() -> Self {
        Self {
            auto_freeze: true,
            equality: Equality::SameValueZero,
            check_conflicting_result: true,
        }
    }
}
