//! Change streams over a path of the branch.
//!
//! The tag store only says "the branch moved". A watch turns that into
//! "the subtree at this path changed" by carrying the last seen subtree key
//! from event to event and dropping events that leave it untouched.
//!
//! Each stream is a spawned producer task feeding a bounded channel.
//! Dropping the stream aborts its producer.

use arbor_refs::TagEvent;
use arbor_store::{Contents, ObjectDb};
use arbor_types::{ObjectId, Path};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::BranchResult;
use crate::store::BranchStore;

/// The subtree at `path` changed in `commit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEvent {
    pub path: Path,
    pub commit: ObjectId,
}

/// The value at `path` changed in `commit`. `None` means it was removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueEvent<V> {
    pub path: Path,
    pub commit: ObjectId,
    pub value: Option<V>,
}

/// Receiving end of a watch.
#[derive(Debug)]
pub struct Watch<T> {
    rx: mpsc::Receiver<T>,
    task: JoinHandle<()>,
}

pub type NodeWatch = Watch<NodeEvent>;
pub type ValueWatch<V> = Watch<ValueEvent<V>>;

impl<T> Watch<T> {
    /// Next event, or `None` once the producer has stopped.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

impl<T> Drop for Watch<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<V: Contents> BranchStore<V> {
    /// Stream of commits that changed the subtree at `path`.
    ///
    /// Only head moves after this call returns are reported. Consecutive
    /// heads with the same subtree produce a single event. When the branch
    /// is deleted the stream emits nothing, but it compares the next head
    /// against the empty tree.
    pub async fn watch_nodes(&self, path: Path) -> BranchResult<NodeWatch> {
        self.spawn_node_watch(path).await.map(|(watch, _)| watch)
    }

    /// Stream of changes to the value stored exactly at `path`.
    ///
    /// Changes confined to paths below `path` are not reported.
    pub async fn watch(&self, path: Path) -> BranchResult<ValueWatch<V>> {
        let (mut nodes, initial) = self.spawn_node_watch(path.clone()).await?;
        let mut last = self.db.find(&initial, &Path::root()).await?;
        let db = self.db.clone();
        let (tx, rx) = mpsc::channel(self.config.watch_buffer.max(1));

        let task = tokio::spawn(async move {
            while let Some(event) = nodes.recv().await {
                if event.path != path {
                    continue;
                }
                let value = match value_at(&db, &event.commit, &path).await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(%path, commit = %event.commit.short_hex(), %err, "value watch stopped");
                        break;
                    }
                };
                if value == last {
                    continue;
                }
                last = value.clone();
                let event = ValueEvent {
                    path: event.path,
                    commit: event.commit,
                    value,
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(Watch { rx, task })
    }

    /// Start a node watch and return the subtree key it started from.
    async fn spawn_node_watch(&self, path: Path) -> BranchResult<(NodeWatch, ObjectId)> {
        // Subscribe before reading the head so no move is missed.
        let mut upstream = self.tags.watch(&self.branch).await?;
        let empty = self.db.empty_node().await?;
        let head = self.head_node().await?;
        let initial = self.db.sub(&head, &path).await?.unwrap_or(empty);

        let db = self.db.clone();
        let branch = self.branch.clone();
        let (tx, rx) = mpsc::channel(self.config.watch_buffer.max(1));

        let task = tokio::spawn(async move {
            let mut last = initial;
            loop {
                let commit = match upstream.recv().await {
                    Ok(TagEvent::Updated(commit)) => commit,
                    Ok(TagEvent::Removed) => {
                        last = empty;
                        continue;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(%branch, skipped, "watch lagged behind branch");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let subtree = match subtree_at(&db, &commit, &path, empty).await {
                    Ok(subtree) => subtree,
                    Err(err) => {
                        warn!(%branch, %path, commit = %commit.short_hex(), %err, "node watch stopped");
                        break;
                    }
                };
                if ObjectDb::<V>::node_equal(&subtree, &last) {
                    continue;
                }
                last = subtree;
                debug!(%branch, %path, commit = %commit.short_hex(), "subtree changed");
                if tx.send(NodeEvent { path: path.clone(), commit }).await.is_err() {
                    break;
                }
            }
        });
        Ok((Watch { rx, task }, initial))
    }
}

/// Key of the subtree at `path` in `commit`, `empty` where there is none.
async fn subtree_at<V: Contents>(
    db: &ObjectDb<V>,
    commit: &ObjectId,
    path: &Path,
    empty: ObjectId,
) -> BranchResult<ObjectId> {
    let commit = db.read_commit_exn(commit).await?;
    let Some(root) = ObjectDb::<V>::commit_node(&commit) else {
        return Ok(empty);
    };
    Ok(db.sub(&root, path).await?.unwrap_or(empty))
}

async fn value_at<V: Contents>(
    db: &ObjectDb<V>,
    commit: &ObjectId,
    path: &Path,
) -> BranchResult<Option<V>> {
    let commit = db.read_commit_exn(commit).await?;
    match ObjectDb::<V>::commit_node(&commit) {
        Some(root) => Ok(db.find(&root, path).await?),
        None => Ok(None),
    }
}
