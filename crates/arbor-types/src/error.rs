use thiserror::Error;

/// Errors produced when constructing or parsing foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid branch name {name:?}: {reason}")]
    InvalidBranchName { name: String, reason: String },
}
