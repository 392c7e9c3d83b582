//! Node-level diff: compare two trees and list changed values by path.
//!
//! Walks both trees together. Where the child keys on both sides match the
//! subtree is identical and skipped; everywhere else the value stored at
//! the node and the child maps are compared.

use std::collections::BTreeSet;

use arbor_store::{Contents, NodeObject, ObjectDb};
use arbor_types::{ObjectId, Path};
use serde::{Deserialize, Serialize};

use crate::error::DiffResult;

/// The result of comparing two trees.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDiff {
    /// Changes, sorted by path.
    pub changes: Vec<NodeChange>,
}

impl NodeDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Paths touched by the diff, in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.changes.iter().map(NodeChange::path)
    }
}

/// A single change between two trees.
///
/// Ids are contents keys: the value itself stays in the object store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeChange {
    /// A value now exists where there was none.
    Added { path: Path, new_id: ObjectId },
    /// A value was dropped.
    Removed { path: Path, old_id: ObjectId },
    /// The value at the path was replaced.
    Modified {
        path: Path,
        old_id: ObjectId,
        new_id: ObjectId,
    },
}

impl NodeChange {
    pub fn path(&self) -> &Path {
        match self {
            Self::Added { path, .. } | Self::Removed { path, .. } | Self::Modified { path, .. } => {
                path
            }
        }
    }
}

/// Compare two trees read from `db`.
///
/// `None` on either side stands for the empty tree.
pub async fn diff_nodes<V: Contents>(
    db: &ObjectDb<V>,
    old: Option<&ObjectId>,
    new: Option<&ObjectId>,
) -> DiffResult<NodeDiff> {
    let mut changes = Vec::new();
    let mut stack: Vec<(Path, Option<ObjectId>, Option<ObjectId>)> =
        vec![(Path::root(), old.copied(), new.copied())];

    while let Some((path, old_id, new_id)) = stack.pop() {
        if old_id == new_id {
            continue;
        }
        let old_node = load(db, old_id.as_ref()).await?;
        let new_node = load(db, new_id.as_ref()).await?;

        match (old_node.contents, new_node.contents) {
            (None, Some(new_id)) => changes.push(NodeChange::Added {
                path: path.clone(),
                new_id,
            }),
            (Some(old_id), None) => changes.push(NodeChange::Removed {
                path: path.clone(),
                old_id,
            }),
            (Some(old_id), Some(new_id)) if old_id != new_id => {
                changes.push(NodeChange::Modified {
                    path: path.clone(),
                    old_id,
                    new_id,
                })
            }
            _ => {}
        }

        let segments: BTreeSet<&String> =
            old_node.succ.keys().chain(new_node.succ.keys()).collect();
        for segment in segments {
            stack.push((
                path.child(segment.as_str()),
                old_node.succ.get(segment).copied(),
                new_node.succ.get(segment).copied(),
            ));
        }
    }

    changes.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(NodeDiff { changes })
}

async fn load<V: Contents>(db: &ObjectDb<V>, id: Option<&ObjectId>) -> DiffResult<NodeObject> {
    match id {
        Some(id) => Ok(db.read_node_exn(id).await?),
        None => Ok(NodeObject::empty()),
    }
}
