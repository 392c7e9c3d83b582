//! Commit entries in the graph.

use arbor_store::CommitObject;
use arbor_types::{ObjectId, Origin, Timestamp};
use serde::{Deserialize, Serialize};

/// A commit as seen by the graph: its key, parents, tree and provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: ObjectId,
    /// Parent commits, in the order they were recorded.
    pub parents: Vec<ObjectId>,
    /// Root node of the snapshot, `None` for the empty tree.
    pub node: Option<ObjectId>,
    pub origin: Origin,
}

impl CommitInfo {
    pub fn new(id: ObjectId, commit: CommitObject) -> Self {
        Self {
            id,
            parents: commit.parents,
            node: commit.node,
            origin: commit.origin,
        }
    }

    /// Returns `true` if this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn timestamp(&self) -> Timestamp {
        self.origin.date
    }
}
