//! Content-addressed object storage for Arbor.
//!
//! Three kinds of immutable objects live in the store, each keyed by the
//! domain-separated BLAKE3 hash of its serialized form:
//!
//! - contents: leaf values
//! - nodes: a tree level, holding optional contents plus named children
//! - commits: a root node, parent commits, and provenance
//!
//! # Layers
//!
//! - [`ObjectStore`] is the raw backend seam: read and write opaque
//!   [`StoredObject`]s. [`InMemoryObjectStore`] is the reference backend.
//! - [`ObjectDb`] is the typed view the branch store uses. It decodes
//!   objects for a value type `V` and implements the copy-on-write tree
//!   operations (`find`, `update`, `remove`, `sub`, `successors`, `valid`).
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; writing the same object twice is a
//!    no-op returning the same key.
//! 2. A tree mutation writes only the nodes on the touched path. Everything
//!    else is shared with the previous tree.
//! 3. Empty nodes are pruned from their parent, so equal logical trees have
//!    equal keys and structural equality is key equality.
//! 4. All backend errors are propagated, never silently ignored.

pub mod db;
pub mod error;
pub mod memory;
pub mod object;
pub mod traits;
pub mod tree;

pub use db::{Contents, ObjectDb};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{CommitObject, NodeObject, ObjectKind, StoredObject};
pub use traits::ObjectStore;
