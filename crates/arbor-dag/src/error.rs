//! Error types for the commit graph.

use arbor_store::StoreError;
use arbor_types::ObjectId;

/// Errors that can occur during commit graph operations.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A referenced commit is not in the object store.
    #[error("commit not found: {0:?}")]
    CommitNotFound(ObjectId),

    /// A parent reference points to a commit that is not in the graph.
    #[error("dangling parent reference: commit {commit:?} references missing parent {parent:?}")]
    DanglingParent {
        /// The commit containing the bad reference.
        commit: ObjectId,
        /// The missing parent.
        parent: ObjectId,
    },

    /// Object store failure while loading commits.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
