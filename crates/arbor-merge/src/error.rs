use arbor_dag::DagError;
use arbor_store::StoreError;

/// Failures that prevent a merge from being attempted at all.
///
/// Conflicts are not errors; see [`crate::Conflict`].
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("commit graph error: {0}")]
    Dag(#[from] DagError),
}
