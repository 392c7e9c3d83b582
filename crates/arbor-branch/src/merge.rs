//! Merge orchestration: bring another commit or branch into this branch.
//!
//! Conflicts are values. Every merge entry point returns
//! `BranchResult<MergeResult<_>>`: the outer error is a store or tag store
//! failure, the inner one a [`Conflict`] the caller may inspect.

use arbor_merge::{Conflict, MergeResult};
use arbor_store::Contents;
use arbor_types::{BranchName, ObjectId, Origin};
use tracing::{info, warn};

use crate::error::{BranchError, BranchResult};
use crate::store::BranchStore;

impl<V: Contents> BranchStore<V> {
    /// Merge `c1` with `c2` against their common ancestor.
    ///
    /// Returns the key of the merged commit. Histories that share no commit
    /// cannot be merged and yield a conflict.
    pub async fn three_way_merge(
        &self,
        c1: &ObjectId,
        c2: &ObjectId,
        origin: Option<Origin>,
    ) -> BranchResult<MergeResult<ObjectId>> {
        let Some(ancestor) = self.merger.common_ancestor(c1, c2).await? else {
            return Ok(Err(Conflict::new("no common ancestor")));
        };
        let origin = origin
            .unwrap_or_else(|| self.default_origin(format!("Merge commit {}", c1.short_hex())));
        Ok(self.merger.merge(&origin, &ancestor, c1, c2).await?)
    }

    /// Merge commit `c1` into this branch.
    ///
    /// `c1` must name a stored commit. An unborn branch simply adopts it.
    /// Otherwise the head is merged
    /// with `c1` and moved to the result with compare-and-set, restarting
    /// if the head moved in between.
    pub async fn merge_commit(
        &self,
        c1: &ObjectId,
        origin: Option<Origin>,
    ) -> BranchResult<MergeResult<()>> {
        self.db.read_commit_exn(c1).await?;
        let origin = origin
            .unwrap_or_else(|| self.default_origin(format!("Merge commit {}", c1.short_hex())));
        let attempts = self.config.max_update_retries.max(1);

        for attempt in 1..=attempts {
            let head = self.tags.read(&self.branch).await?;
            let next = match head {
                None => *c1,
                Some(c2) => match self.three_way_merge(c1, &c2, Some(origin.clone())).await? {
                    Ok(merged) => merged,
                    Err(conflict) => {
                        info!(
                            branch = %self.branch,
                            commit = %c1.short_hex(),
                            %conflict,
                            "merge conflicted"
                        );
                        return Ok(Err(conflict));
                    }
                },
            };

            if head == Some(next) {
                return Ok(Ok(()));
            }
            if self
                .tags
                .compare_and_set(&self.branch, head, Some(next))
                .await?
            {
                info!(
                    branch = %self.branch,
                    commit = %c1.short_hex(),
                    head = %next.short_hex(),
                    fast_forward = head.is_none(),
                    "merged commit"
                );
                return Ok(Ok(()));
            }
            warn!(branch = %self.branch, attempt, "head moved during merge, retrying");
        }
        Err(BranchError::RetriesExhausted {
            branch: self.branch.clone(),
            attempts,
        })
    }

    /// Merge the head of `other` into this branch.
    ///
    /// Fails with a tag store `NotFound` if `other` does not exist.
    pub async fn merge(
        &self,
        other: &BranchName,
        origin: Option<Origin>,
    ) -> BranchResult<MergeResult<()>> {
        let c1 = self.tags.read_exn(other).await?;
        let origin = origin.unwrap_or_else(|| self.default_origin(format!("Merge {other}")));
        self.merge_commit(&c1, Some(origin)).await
    }

    /// Like [`merge`](Self::merge), raising a conflict as
    /// [`BranchError::Conflict`].
    pub async fn merge_exn(&self, other: &BranchName, origin: Option<Origin>) -> BranchResult<()> {
        self.merge(other, origin).await?.map_err(BranchError::Conflict)
    }
}
