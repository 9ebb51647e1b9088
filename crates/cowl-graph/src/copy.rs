//! Copy and equality primitives
//!
//! Provides [`ShallowCopy`], the extension point for nodes that need a custom
//! one-level duplicate, and [`same_value`], the equality that decides whether
//! a write actually changes anything.

use crate::node::NodeBody;
use crate::value::Value;
use std::fmt::Debug;

/// Custom one-level copy strategy
///
/// Attach one to a node with [`Heap::alloc_with_copier`](crate::Heap::alloc_with_copier).
/// Whenever an edit session needs a private copy of that node, the strategy
/// is asked for the new body instead of a plain slot-by-slot clone.
///
/// # Contract
/// - Must return a body of the same [`NodeKind`](crate::NodeKind) as its input
/// - Must not deep-copy: child references are carried over as-is
///
/// # Example
/// ```rust
/// use cowl_graph::{NodeBody, ShallowCopy};
///
/// #[derive(Debug)]
/// struct Stamped;
///
/// impl ShallowCopy for Stamped {
///     fn shallow_copy(&self, body: &NodeBody) -> NodeBody {
///         let mut copy = body.clone();
///         let _ = copy.set("copied".into(), true.into());
///         copy
///     }
/// }
/// ```
pub trait ShallowCopy: Send + Sync + Debug {
    /// Produce the body of the copy
    fn shallow_copy(&self, body: &NodeBody) -> NodeBody;
}

/// Equality used by the write no-op guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Equality {
    /// `NaN` equals `NaN`, `+0` equals `-0`
    #[default]
    SameValueZero,

    /// `NaN` equals `NaN`, `+0` and `-0` differ
    SameValue,
}

/// Compare two slot values
///
/// Composite values compare by identity. Numbers follow `equality`.
#[must_use]
pub fn same_value(a: &Value, b: &Value, equality: Equality) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                return true;
            }
            match equality {
                Equality::SameValueZero => x == y,
                Equality::SameValue => x == y && x.is_sign_negative() == y.is_sign_negative(),
            }
        }
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Node(x), Value::Node(y)) => x == y,
        (Value::Draft(x), Value::Draft(y)) => x == y,
        _ => false,
    }
}
