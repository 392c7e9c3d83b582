use std::fmt;

use arbor_types::Path;
use serde::{Deserialize, Serialize};

/// A merge that could not be completed.
///
/// Conflicts are ordinary values, carried in [`MergeResult`], so callers
/// decide whether to abort, retry with another strategy, or surface them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("merge conflict: {message}")]
pub struct Conflict {
    message: String,
}

impl Conflict {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// A conflict located at `path`.
    pub fn at(path: &Path, reason: impl fmt::Display) -> Self {
        Self::new(format!("{path}: {reason}"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of a merge: the merged value or the conflict that stopped it.
pub type MergeResult<T> = Result<T, Conflict>;
