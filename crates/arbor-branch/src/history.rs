//! Branch pointers and history inspection.

use arbor_dag::{CommitGraph, CommitInfo};
use arbor_diff::{diff_nodes, NodeDiff};
use arbor_store::{Contents, ObjectDb};
use arbor_types::{BranchName, ObjectId};
use tracing::debug;

use crate::error::BranchResult;
use crate::store::BranchStore;

impl<V: Contents> BranchStore<V> {
    /// The commit this branch points at.
    pub async fn head(&self) -> BranchResult<Option<ObjectId>> {
        Ok(self.tags.read(&self.branch).await?)
    }

    /// Point this branch at `commit` unconditionally.
    pub async fn set_head(&self, commit: ObjectId) -> BranchResult<()> {
        self.db.read_commit_exn(&commit).await?;
        self.tags.update(&self.branch, commit).await?;
        debug!(branch = %self.branch, commit = %commit.short_hex(), "head set");
        Ok(())
    }

    /// Every branch in the tag store, sorted.
    pub async fn branches(&self) -> BranchResult<Vec<BranchName>> {
        Ok(self.tags.list().await?)
    }

    /// Commits reachable from the head, newest first.
    ///
    /// A commit always comes before its parents. `limit` caps the number
    /// of entries returned.
    pub async fn history(&self, limit: Option<usize>) -> BranchResult<Vec<CommitInfo>> {
        let Some(head) = self.head().await? else {
            return Ok(Vec::new());
        };
        let graph = CommitGraph::load(&self.db, &[head]).await?;
        Ok(graph
            .history(&head)
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    /// Values that differ between the trees of two commits.
    pub async fn diff(&self, from: &ObjectId, to: &ObjectId) -> BranchResult<NodeDiff> {
        let old = ObjectDb::<V>::commit_node(&self.db.read_commit_exn(from).await?);
        let new = ObjectDb::<V>::commit_node(&self.db.read_commit_exn(to).await?);
        Ok(diff_nodes(&self.db, old.as_ref(), new.as_ref()).await?)
    }
}
