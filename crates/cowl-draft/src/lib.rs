//! cowl Draft Sessions
//!
//! Copy-on-write editing of graphs whose nodes may be shared by several
//! parents and may form cycles. A recipe edits *drafts*; the base graph is
//! never written, and the result shares every untouched subtree with it.
//!
//! # Core Concepts
//!
//! - [`produce`] / [`Producer`]: Run a recipe and build the result
//! - [`Session`]: Read/write interception for the drafts of one edit
//! - [`ReferenceRegistry`]: Every recorded parent of every reachable node
//! - [`DraftState`]: Base node, private copy and modified flag of one draft
//! - [`ProduceConfig`]: Auto-freeze, no-op equality and conflict checking
//!
//! Unlike a tree-shaped copy-on-write scheme, a change to a shared node is
//! propagated to *all* of its recorded parents, so every path to it in the
//! result reaches the same new node.
//!
//! # Example
//!
//! ```rust
//! use cowl_draft::produce;
//! use cowl_graph::{Heap, Value};
//!
//! let mut heap = Heap::new();
//! let shared = heap.alloc_record().unwrap();
//! heap.set(shared, "text", Value::from("draft")).unwrap();
//! let a = heap.alloc_record().unwrap();
//! let b = heap.alloc_record().unwrap();
//! heap.set(a, "child", Value::Node(shared)).unwrap();
//! heap.set(b, "child", Value::Node(shared)).unwrap();
//! let root = heap.alloc_record().unwrap();
//! heap.set(root, "a", Value::Node(a)).unwrap();
//! heap.set(root, "b", Value::Node(b)).unwrap();
//!
//! let result = produce(&mut heap, Value::Node(root), |session, draft| {
//!     let a = session.child(draft, "a")?;
//!     let child = session.child(a, "child")?;
//!     session.set(child, "text", Value::from("final"))?;
//!     Ok(None)
//! })
//! .unwrap();
//!
//! let result = result.as_node().unwrap();
//! let via_a = heap.get(heap.get(result, "a").unwrap().as_node().unwrap(), "child").unwrap();
//! let via_b = heap.get(heap.get(result, "b").unwrap().as_node().unwrap(), "child").unwrap();
//! assert_eq!(via_a, via_b);
//! assert_ne!(via_a, Value::Node(shared));
//! ```

#![warn(unreachable_pub)]

mod config;
mod error;
mod finalize;
mod lifecycle;
mod produce;
mod registry;
mod session;
mod state;

// Re-exports
pub use config::ProduceConfig;
pub use error::{DraftError, DraftResult};
pub use lifecycle::{allowed_transitions, validate_transition, Phase};
pub use produce::{produce, Producer};
pub use registry::{BackReference, ReferenceRegistry, RegistryEntry};
pub use session::Session;
pub use state::{Draft, DraftState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
