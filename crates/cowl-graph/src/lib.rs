//! cowl Graph Model
//!
//! Arena-backed graphs of records and lists whose nodes may be shared by
//! several parents and may form reference cycles.
//!
//! # Core Concepts
//!
//! - [`Heap`]: Arena that owns every node; the single place nodes are created
//! - [`NodeId`]: Opaque, copyable handle; node identity is handle identity
//! - [`NodeBody`]: Closed `Record`/`List` variant holding a node's slots
//! - [`Value`]: Slot contents (primitives, node handles, draft handles)
//! - [`Key`]: Field name or list index addressing a slot
//! - [`ShallowCopy`]: Extension point for custom one-level copies
//! - [`same_value`]: Equality used to detect no-op writes
//!
//! # Example
//!
//! ```rust
//! use cowl_graph::{Heap, Value};
//!
//! let mut heap = Heap::new();
//! let shared = heap.alloc_record().unwrap();
//! heap.set(shared, "value", Value::from(1.0)).unwrap();
//!
//! let root = heap.alloc_record().unwrap();
//! heap.set(root, "a", Value::Node(shared)).unwrap();
//! heap.set(root, "b", Value::Node(shared)).unwrap();
//!
//! // Both slots hold the same node
//! assert_eq!(heap.get(root, "a").unwrap(), heap.get(root, "b").unwrap());
//! ```

#![warn(unreachable_pub)]

mod copy;
mod heap;
mod id;
mod node;
mod path;
mod value;

// Re-exports
pub use copy::{same_value, Equality, ShallowCopy};
pub use heap::{GraphError, GraphResult, Heap};
pub use id::{DraftId, NodeId};
pub use node::{Node, NodeBody, NodeKind};
pub use path::{KeyPath, PathError};
pub use value::{Key, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
