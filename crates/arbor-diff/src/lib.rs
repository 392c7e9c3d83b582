//! Diff engine for Arbor.
//!
//! Compares two tree snapshots and lists the paths whose stored value was
//! added, removed, or replaced. Identical subtrees are skipped by key, so
//! the cost is proportional to what changed.
//!
//! # Key Types
//!
//! - [`NodeDiff`] / [`NodeChange`]: path-level changes between two nodes

pub mod error;
pub mod node_diff;

pub use error::{DiffError, DiffResult};
pub use node_diff::{diff_nodes, NodeChange, NodeDiff};
