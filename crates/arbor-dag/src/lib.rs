//! Commit graph for Arbor.
//!
//! Loads the history reachable from one or more commits out of an object
//! store and answers the questions merges and history listings need:
//! lowest common ancestors, ancestry tests, and newest-first ordering.

pub mod dag;
pub mod error;
pub mod node;

pub use dag::CommitGraph;
pub use error::{DagError, DagResult};
pub use node::CommitInfo;
