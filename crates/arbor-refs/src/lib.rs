//! Tag store for Arbor.
//!
//! A tag store maps branch names to commit keys. It is the only mutable
//! state in an Arbor repository: objects are immutable, and a branch
//! "moves" by pointing its tag at a newer commit.
//!
//! # Architecture
//!
//! - **Pointers** are plain `BranchName -> ObjectId` entries. A branch with
//!   no entry is unborn and reads as the empty tree.
//! - **Compare-and-set** is the linearization point for concurrent writers
//!   on one branch. Blind `update` exists for overwrite semantics.
//! - **Watches** deliver a [`TagEvent`] each time a branch pointer actually
//!   changes value.
//!
//! # Modules
//!
//! - [`error`]: error types for tag operations
//! - [`types`]: [`TagEvent`] and the [`TagWatch`] receiver
//! - [`traits`]: the [`TagStore`] trait
//! - [`memory`]: in-memory [`InMemoryTagStore`]

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use memory::InMemoryTagStore;
pub use traits::TagStore;
pub use types::{TagEvent, TagWatch};
