//! Merge engine for Arbor.
//!
//! Implements three-way merge of tree snapshots and of commits. Leaf values
//! are reconciled by an injected [`ContentMerge`] strategy; everything above
//! the leaves is structural.
//!
//! A merge that cannot be completed is not an error: it yields a
//! [`Conflict`] inside a [`MergeResult`]. [`MergeError`] is reserved for
//! store and graph failures.
//!
//! # Modules
//!
//! - [`conflict`]: [`Conflict`] and [`MergeResult`]
//! - [`contents`]: the [`ContentMerge`] trait and stock strategies
//! - [`tree`]: recursive three-way merge of nodes
//! - [`commit`]: the [`CommitMerge`] operator and [`ThreeWayMerge`]

pub mod commit;
pub mod conflict;
pub mod contents;
pub mod error;
pub mod tree;

pub use commit::{CommitMerge, ThreeWayMerge};
pub use conflict::{Conflict, MergeResult};
pub use contents::{
    merge_contents_option, ContentMerge, Counter, MergeFn, PreferLeft, PreferRight, Strict,
};
pub use error::MergeError;
pub use tree::merge_nodes;
