//! Error types for tag store operations.

use arbor_types::TypeError;
use thiserror::Error;

/// Errors that can occur during tag store operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The branch has no pointer.
    #[error("branch not found: {name}")]
    NotFound { name: String },

    /// A backend handed back a name that is not a valid branch name.
    #[error(transparent)]
    InvalidBranchName(#[from] TypeError),

    /// A backend lock was poisoned by a panicking writer.
    #[error("tag store lock poisoned")]
    LockPoisoned,
}

/// Convenience type alias for tag store operations.
pub type Result<T> = std::result::Result<T, RefError>;
