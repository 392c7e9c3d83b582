//! Commit-level merge operators.
//!
//! A [`CommitMerge`] finds the baseline for two commits and produces the
//! commit that reconciles them. The branch store only talks to this trait,
//! so alternative policies (squashing, recursive ancestors) can be
//! injected.

use std::fmt;
use std::sync::Arc;

use arbor_dag::CommitGraph;
use arbor_store::{Contents, ObjectDb};
use arbor_types::{ObjectId, Origin, Path};
use async_trait::async_trait;
use tracing::debug;

use crate::conflict::MergeResult;
use crate::contents::ContentMerge;
use crate::error::MergeError;
use crate::tree::merge_nodes;

/// Merge operator over commits.
#[async_trait]
pub trait CommitMerge: Send + Sync {
    /// The lowest common ancestor of two commits, if their histories meet.
    async fn common_ancestor(
        &self,
        c1: &ObjectId,
        c2: &ObjectId,
    ) -> Result<Option<ObjectId>, MergeError>;

    /// Merge `c1` into `c2` using `ancestor` as the baseline.
    ///
    /// Returns the key of the commit that holds the merged state.
    async fn merge(
        &self,
        origin: &Origin,
        ancestor: &ObjectId,
        c1: &ObjectId,
        c2: &ObjectId,
    ) -> Result<MergeResult<ObjectId>, MergeError>;
}

/// The standard operator: three-way tree merge plus a two-parent commit.
///
/// Equal inputs merge to themselves. Anything else gets a new commit with
/// parents `[c1, c2]`, even when one side already contains the other.
pub struct ThreeWayMerge<V> {
    db: ObjectDb<V>,
    contents: Arc<dyn ContentMerge<V>>,
}

impl<V: Contents> ThreeWayMerge<V> {
    pub fn new(db: ObjectDb<V>, contents: Arc<dyn ContentMerge<V>>) -> Self {
        Self { db, contents }
    }

    /// Root node of a commit, falling back to the empty tree.
    async fn root_of(&self, commit: &ObjectId) -> Result<Option<ObjectId>, MergeError> {
        let commit = self.db.read_commit_exn(commit).await?;
        Ok(ObjectDb::<V>::commit_node(&commit))
    }
}

impl<V> fmt::Debug for ThreeWayMerge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreeWayMerge").finish_non_exhaustive()
    }
}

#[async_trait]
impl<V: Contents> CommitMerge for ThreeWayMerge<V> {
    async fn common_ancestor(
        &self,
        c1: &ObjectId,
        c2: &ObjectId,
    ) -> Result<Option<ObjectId>, MergeError> {
        let graph = CommitGraph::load(&self.db, &[*c1, *c2]).await?;
        Ok(graph.common_ancestor(c1, c2).map(|info| info.id))
    }

    async fn merge(
        &self,
        origin: &Origin,
        ancestor: &ObjectId,
        c1: &ObjectId,
        c2: &ObjectId,
    ) -> Result<MergeResult<ObjectId>, MergeError> {
        if c1 == c2 {
            return Ok(Ok(*c1));
        }

        let old = self.root_of(ancestor).await?;
        let left = self.root_of(c1).await?;
        let right = self.root_of(c2).await?;

        let merged = merge_nodes(&self.db, self.contents.as_ref(), Path::root(), old, left, right)
            .await?;
        let node = match merged {
            Ok(Some(node)) => node,
            Ok(None) => self.db.empty_node().await?,
            Err(conflict) => {
                debug!(
                    c1 = %c1.short_hex(),
                    c2 = %c2.short_hex(),
                    %conflict,
                    "tree merge conflicted"
                );
                return Ok(Err(conflict));
            }
        };

        let commit = self
            .db
            .create_commit(origin, Some(node), vec![*c1, *c2])
            .await?;
        Ok(Ok(commit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contents::{PreferRight, Strict};
    use arbor_types::Timestamp;

    struct Fixture {
        db: ObjectDb<String>,
        tick: u64,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                db: ObjectDb::in_memory(),
                tick: 0,
            }
        }

        /// Commit `entries` on top of `parent`'s tree.
        async fn commit(&mut self, parent: Option<ObjectId>, entries: &[(&str, &str)]) -> ObjectId {
            let mut node = match parent {
                Some(p) => self.db.read_commit_exn(&p).await.unwrap().node.unwrap(),
                None => self.db.empty_node().await.unwrap(),
            };
            for (path, value) in entries {
                node = self
                    .db
                    .update(&node, &Path::new(path.split('/')), &value.to_string())
                    .await
                    .unwrap();
            }
            self.tick += 1;
            let origin = Origin::new(format!("c{}", self.tick)).at(Timestamp::from_millis(self.tick));
            self.db
                .create_commit(&origin, Some(node), parent.into_iter().collect())
                .await
                .unwrap()
        }

        fn operator(&self, contents: Arc<dyn ContentMerge<String>>) -> ThreeWayMerge<String> {
            ThreeWayMerge::new(self.db.clone(), contents)
        }
    }

    fn origin() -> Origin {
        Origin::new("merge").at(Timestamp::from_millis(1_000))
    }

    #[tokio::test]
    async fn equal_commits_merge_to_themselves() {
        let mut fx = Fixture::new();
        let k = fx.commit(None, &[("a", "1")]).await;
        let op = fx.operator(Arc::new(Strict));
        assert_eq!(op.merge(&origin(), &k, &k, &k).await.unwrap(), Ok(k));
    }

    #[tokio::test]
    async fn merge_commit_has_both_parents_in_order() {
        let mut fx = Fixture::new();
        let base = fx.commit(None, &[("a/b", "v2")]).await;
        let feature = fx.commit(Some(base), &[("a/b", "v3")]).await;
        let master = fx.commit(Some(base), &[("c", "x")]).await;
        let op = fx.operator(Arc::new(Strict));

        let ancestor = op.common_ancestor(&feature, &master).await.unwrap();
        assert_eq!(ancestor, Some(base));

        let merged = op
            .merge(&origin(), &base, &feature, &master)
            .await
            .unwrap()
            .unwrap();
        let commit = fx.db.read_commit_exn(&merged).await.unwrap();
        assert_eq!(commit.parents, vec![feature, master]);

        let root = commit.node.unwrap();
        let value = |p: &'static str| {
            let db = fx.db.clone();
            async move { db.find(&root, &Path::new(p.split('/'))).await.unwrap() }
        };
        assert_eq!(value("a/b").await.as_deref(), Some("v3"));
        assert_eq!(value("c").await.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn ancestor_side_still_gets_merge_commit() {
        let mut fx = Fixture::new();
        let base = fx.commit(None, &[("a", "1")]).await;
        let ahead = fx.commit(Some(base), &[("a", "2")]).await;
        let op = fx.operator(Arc::new(Strict));

        let merged = op.merge(&origin(), &base, &ahead, &base).await.unwrap().unwrap();
        assert_ne!(merged, ahead);
        let commit = fx.db.read_commit_exn(&merged).await.unwrap();
        let ahead_node = fx.db.read_commit_exn(&ahead).await.unwrap().node;
        assert_eq!(commit.node, ahead_node);
    }

    #[tokio::test]
    async fn conflict_is_a_value() {
        let mut fx = Fixture::new();
        let base = fx.commit(None, &[("k", "0")]).await;
        let left = fx.commit(Some(base), &[("k", "1")]).await;
        let right = fx.commit(Some(base), &[("k", "2")]).await;

        let strict = fx.operator(Arc::new(Strict));
        let conflict = strict.merge(&origin(), &base, &left, &right).await.unwrap();
        assert!(conflict.is_err());

        let lenient = fx.operator(Arc::new(PreferRight));
        let merged = lenient
            .merge(&origin(), &base, &left, &right)
            .await
            .unwrap()
            .unwrap();
        let node = fx.db.read_commit_exn(&merged).await.unwrap().node.unwrap();
        assert_eq!(
            fx.db.find(&node, &Path::from(["k"])).await.unwrap().as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn unrelated_roots_have_no_ancestor() {
        let mut fx = Fixture::new();
        let a = fx.commit(None, &[("a", "1")]).await;
        let b = fx.commit(None, &[("b", "1")]).await;
        let op = fx.operator(Arc::new(Strict));
        assert_eq!(op.common_ancestor(&a, &b).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_commit_is_an_error() {
        let fx = Fixture::new();
        let op = fx.operator(Arc::new(Strict));
        let ghost = ObjectId::digest(b"ghost");
        assert!(matches!(
            op.common_ancestor(&ghost, &ghost).await,
            Err(MergeError::Dag(_))
        ));
    }
}
