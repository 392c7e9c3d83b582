//! Recursive three-way merge of tree nodes.
//!
//! The merge zips through the child maps of the ancestor and both sides.
//! Subtrees whose keys show that at most one side changed are taken
//! wholesale without being read; only paths changed on both sides are
//! descended into.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

use arbor_store::{Contents, NodeObject, ObjectDb, StoreResult};
use arbor_types::{ObjectId, Path};

use crate::conflict::MergeResult;
use crate::contents::{merge_contents_option, ContentMerge};

type NodeMerge<'a> =
    Pin<Box<dyn Future<Output = StoreResult<MergeResult<Option<ObjectId>>>> + Send + 'a>>;

/// Merge the subtrees `left` and `right` against their ancestor `old`.
///
/// `None` stands for an absent subtree. The merged subtree is written to
/// `db`; `Ok(Ok(None))` means it came out empty. Store failures are the
/// outer error, the first conflict found is the inner one.
pub fn merge_nodes<'a, V: Contents>(
    db: &'a ObjectDb<V>,
    strategy: &'a dyn ContentMerge<V>,
    path: Path,
    old: Option<ObjectId>,
    left: Option<ObjectId>,
    right: Option<ObjectId>,
) -> NodeMerge<'a> {
    Box::pin(async move {
        if left == right || right == old {
            return Ok(Ok(left));
        }
        if left == old {
            return Ok(Ok(right));
        }

        let old_node = load(db, old).await?;
        let left_node = load(db, left).await?;
        let right_node = load(db, right).await?;

        let mut merged = NodeObject::empty();
        merged.contents = match merge_contents_key(
            db,
            strategy,
            &path,
            old_node.contents,
            left_node.contents,
            right_node.contents,
        )
        .await?
        {
            Ok(key) => key,
            Err(conflict) => return Ok(Err(conflict)),
        };

        let segments: BTreeSet<&String> = old_node
            .succ
            .keys()
            .chain(left_node.succ.keys())
            .chain(right_node.succ.keys())
            .collect();
        for segment in segments {
            let child = merge_nodes(
                db,
                strategy,
                path.child(segment.as_str()),
                old_node.child(segment).copied(),
                left_node.child(segment).copied(),
                right_node.child(segment).copied(),
            )
            .await?;
            match child {
                Ok(Some(key)) => {
                    merged.succ.insert(segment.clone(), key);
                }
                Ok(None) => {}
                Err(conflict) => return Ok(Err(conflict)),
            }
        }

        if merged.is_empty() {
            Ok(Ok(None))
        } else {
            Ok(Ok(Some(db.create_node(&merged).await?)))
        }
    })
}

async fn load<V: Contents>(db: &ObjectDb<V>, id: Option<ObjectId>) -> StoreResult<NodeObject> {
    match id {
        Some(id) => db.read_node_exn(&id).await,
        None => Ok(NodeObject::empty()),
    }
}

/// Merge the contents keys of one node, decoding values only when both
/// sides changed them.
async fn merge_contents_key<V: Contents>(
    db: &ObjectDb<V>,
    strategy: &dyn ContentMerge<V>,
    path: &Path,
    old: Option<ObjectId>,
    left: Option<ObjectId>,
    right: Option<ObjectId>,
) -> StoreResult<MergeResult<Option<ObjectId>>> {
    if left == right || right == old {
        return Ok(Ok(left));
    }
    if left == old {
        return Ok(Ok(right));
    }

    let old_value = read_value(db, old).await?;
    let left_value = read_value(db, left).await?;
    let right_value = read_value(db, right).await?;
    let merged = merge_contents_option(
        strategy,
        path,
        old_value.as_ref(),
        left_value.as_ref(),
        right_value.as_ref(),
    );
    match merged {
        Ok(Some(value)) => Ok(Ok(Some(db.create_contents(&value).await?))),
        Ok(None) => Ok(Ok(None)),
        Err(conflict) => Ok(Err(conflict)),
    }
}

async fn read_value<V: Contents>(db: &ObjectDb<V>, id: Option<ObjectId>) -> StoreResult<Option<V>> {
    match id {
        Some(id) => db.read_contents_exn(&id).await.map(Some),
        None => Ok(None),
    }
}
