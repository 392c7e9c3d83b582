use arbor_dag::DagError;
use arbor_diff::DiffError;
use arbor_merge::{Conflict, MergeError};
use arbor_refs::RefError;
use arbor_store::StoreError;
use arbor_types::{BranchName, Path};
use thiserror::Error;

/// Errors raised by branch store operations.
///
/// Merge conflicts are normally returned as values; only
/// [`merge_exn`](crate::BranchStore::merge_exn) turns them into
/// [`BranchError::Conflict`].
#[derive(Debug, Error)]
pub enum BranchError {
    /// No value is stored at the path.
    #[error("no value at {0}")]
    NotFound(Path),

    #[error(transparent)]
    Conflict(Conflict),

    /// The branch pointer kept moving under a head update.
    #[error("branch {branch} changed concurrently on each of {attempts} attempts")]
    RetriesExhausted { branch: BranchName, attempts: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("tag store error: {0}")]
    Ref(#[from] RefError),

    #[error("commit graph error: {0}")]
    Dag(#[from] DagError),

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
}

pub type BranchResult<T> = Result<T, BranchError>;
