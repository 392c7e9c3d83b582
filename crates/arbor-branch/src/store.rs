//! The branch store handle and the head read/update protocol.
//!
//! A [`BranchStore`] binds one branch name to a shared object database and
//! tag store. Every mutation follows the same cycle: read the head, derive
//! its tree, transform it, write a commit, then compare-and-set the pointer
//! from the head that was read. A lost race restarts the whole cycle.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arbor_merge::{CommitMerge, ContentMerge, Strict, ThreeWayMerge};
use arbor_refs::{InMemoryTagStore, TagStore};
use arbor_store::{CommitObject, Contents, ObjectDb};
use arbor_types::{BranchName, ObjectId, Origin};
use tracing::{debug, info, warn};

use crate::config::BranchConfig;
use crate::error::{BranchError, BranchResult};

/// A handle on one branch.
///
/// Handles are cheap to clone and share their stores. Several handles,
/// on the same branch or not, may be driven concurrently.
pub struct BranchStore<V> {
    pub(crate) db: ObjectDb<V>,
    pub(crate) tags: Arc<dyn TagStore>,
    pub(crate) merger: Arc<dyn CommitMerge>,
    pub(crate) branch: BranchName,
    pub(crate) config: Arc<BranchConfig>,
}

impl<V> Clone for BranchStore<V> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            tags: Arc::clone(&self.tags),
            merger: Arc::clone(&self.merger),
            branch: self.branch.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<V> fmt::Debug for BranchStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchStore")
            .field("branch", &self.branch)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<V: Contents> BranchStore<V> {
    /// A handle over existing stores.
    pub fn open(
        db: ObjectDb<V>,
        tags: Arc<dyn TagStore>,
        merger: Arc<dyn CommitMerge>,
        branch: BranchName,
        config: BranchConfig,
    ) -> Self {
        Self {
            db,
            tags,
            merger,
            branch,
            config: Arc::new(config),
        }
    }

    /// A handle over fresh in-memory stores that refuses divergent values
    /// on merge.
    pub fn create(branch: BranchName) -> Self {
        Self::create_with_merge(branch, Arc::new(Strict))
    }

    /// A handle over fresh in-memory stores merging leaves with `contents`.
    pub fn create_with_merge(branch: BranchName, contents: Arc<dyn ContentMerge<V>>) -> Self {
        let db = ObjectDb::in_memory();
        let merger = Arc::new(ThreeWayMerge::new(db.clone(), contents));
        Self::open(
            db,
            Arc::new(InMemoryTagStore::new()),
            merger,
            branch,
            BranchConfig::default(),
        )
    }

    /// [`create`](Self::create) on `master`.
    pub fn create_default() -> Self {
        Self::create(BranchName::master())
    }

    pub fn with_config(mut self, config: BranchConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    pub fn db(&self) -> &ObjectDb<V> {
        &self.db
    }

    pub fn tags(&self) -> &Arc<dyn TagStore> {
        &self.tags
    }

    pub fn config(&self) -> &BranchConfig {
        &self.config
    }

    /// A handle on `target` over the same stores. The tag store is not
    /// touched.
    pub fn switch(&self, target: BranchName) -> Self {
        Self {
            branch: target,
            ..self.clone()
        }
    }

    // -- Lifecycle -------------------------------------------------------

    /// Point `target` wherever this branch points and return a handle on it.
    ///
    /// If this branch is unborn, `target`'s entry is deleted. Any existing
    /// history on `target` is overwritten.
    pub async fn clone_force(&self, target: BranchName) -> BranchResult<Self> {
        match self.tags.read(&self.branch).await? {
            Some(head) => {
                self.tags.update(&target, head).await?;
                info!(
                    from = %self.branch,
                    to = %target,
                    head = %head.short_hex(),
                    "cloned branch"
                );
            }
            None => {
                self.tags.remove(&target).await?;
                info!(from = %self.branch, to = %target, "cloned unborn branch");
            }
        }
        Ok(self.switch(target))
    }

    /// Like [`clone_force`](Self::clone_force), but returns `None` without
    /// writing if `target` already exists.
    pub async fn clone_branch(&self, target: BranchName) -> BranchResult<Option<Self>> {
        if self.tags.exists(&target).await? {
            info!(from = %self.branch, to = %target, "clone refused, target exists");
            return Ok(None);
        }
        self.clone_force(target).await.map(Some)
    }

    // -- Head protocol ---------------------------------------------------

    /// The branch's head commit, or `None` if the branch is unborn.
    pub async fn read_head_commit(&self) -> BranchResult<Option<(ObjectId, CommitObject)>> {
        match self.tags.read(&self.branch).await? {
            Some(id) => {
                let commit = self.db.read_commit_exn(&id).await?;
                Ok(Some((id, commit)))
            }
            None => Ok(None),
        }
    }

    /// Tree of a commit, the empty tree if it recorded none.
    pub async fn node_of_commit(&self, commit: &CommitObject) -> BranchResult<ObjectId> {
        match ObjectDb::<V>::commit_node(commit) {
            Some(node) => Ok(node),
            None => Ok(self.db.empty_node().await?),
        }
    }

    pub async fn node_of_optional_commit(
        &self,
        commit: Option<&CommitObject>,
    ) -> BranchResult<ObjectId> {
        match commit {
            Some(commit) => self.node_of_commit(commit).await,
            None => Ok(self.db.empty_node().await?),
        }
    }

    /// Tree at the current head.
    pub(crate) async fn head_node(&self) -> BranchResult<ObjectId> {
        let head = self.read_head_commit().await?;
        self.node_of_optional_commit(head.as_ref().map(|(_, commit)| commit))
            .await
    }

    /// Replace the head tree with `transform(head tree)`.
    ///
    /// Nothing is written if the tree is unchanged. Otherwise a commit is
    /// created on top of the head and the pointer is moved with
    /// compare-and-set. If another writer moved the head in between, the
    /// cycle restarts from the new head, up to
    /// [`BranchConfig::max_update_retries`] times.
    pub async fn update_head_node<F, Fut>(&self, origin: Origin, transform: F) -> BranchResult<()>
    where
        F: Fn(ObjectId) -> Fut,
        Fut: Future<Output = BranchResult<ObjectId>>,
    {
        let attempts = self.config.max_update_retries.max(1);
        for attempt in 1..=attempts {
            let head = self.read_head_commit().await?;
            let old = self
                .node_of_optional_commit(head.as_ref().map(|(_, commit)| commit))
                .await?;
            let new = transform(old).await?;

            if ObjectDb::<V>::node_equal(&old, &new) {
                debug!(branch = %self.branch, node = %old.short_hex(), "tree unchanged");
                return Ok(());
            }

            let prior = head.map(|(id, _)| id);
            let commit = self
                .db
                .create_commit(&origin, Some(new), prior.into_iter().collect())
                .await?;
            if self
                .tags
                .compare_and_set(&self.branch, prior, Some(commit))
                .await?
            {
                debug!(branch = %self.branch, commit = %commit.short_hex(), "head updated");
                return Ok(());
            }
            warn!(branch = %self.branch, attempt, "head moved during update, retrying");
        }
        Err(BranchError::RetriesExhausted {
            branch: self.branch.clone(),
            attempts,
        })
    }

    /// Provenance for operations called without one.
    pub(crate) fn default_origin(&self, message: String) -> Origin {
        Origin::new(message).with_author(self.config.default_author.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;

    use arbor_types::Path;

    use crate::testing::{init_tracing, jammed_store};

    type Transform = Pin<Box<dyn Future<Output = BranchResult<ObjectId>> + Send>>;

    fn name(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    fn p(s: &str) -> Path {
        Path::new(s.split('/'))
    }

    fn replace_at(
        db: &ObjectDb<String>,
        path: &Path,
        value: &str,
    ) -> impl Fn(ObjectId) -> Transform {
        let db = db.clone();
        let path = path.clone();
        let value = value.to_string();
        move |node| -> Transform {
            let db = db.clone();
            let path = path.clone();
            let value = value.clone();
            Box::pin(async move {
                db.update(&node, &path, &value)
                    .await
                    .map_err(BranchError::from)
            })
        }
    }

    #[tokio::test]
    async fn unborn_branch_reads_as_empty_tree() {
        let store = BranchStore::<String>::create_default();
        assert!(store.read_head_commit().await.unwrap().is_none());
        let empty = store.db().empty_node().await.unwrap();
        assert_eq!(store.head_node().await.unwrap(), empty);
    }

    #[tokio::test]
    async fn first_commit_is_a_root_then_chains() {
        let store = BranchStore::<String>::create_default();
        let origin = Origin::new("first");
        store
            .update_head_node(origin.clone(), replace_at(store.db(), &p("a"), "1"))
            .await
            .unwrap();
        let (k1, c1) = store.read_head_commit().await.unwrap().unwrap();
        assert!(c1.parents.is_empty());
        assert_eq!(c1.origin, origin);

        store
            .update_head_node(Origin::new("second"), replace_at(store.db(), &p("a"), "2"))
            .await
            .unwrap();
        let (k2, c2) = store.read_head_commit().await.unwrap().unwrap();
        assert_ne!(k1, k2);
        assert_eq!(c2.parents, vec![k1]);
    }

    #[tokio::test]
    async fn identity_transform_writes_nothing() {
        let store = BranchStore::<String>::create_default();
        store
            .update_head_node(Origin::new("noop"), |node| async move { Ok::<_, BranchError>(node) })
            .await
            .unwrap();
        assert!(store.tags().read(store.branch()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transform_error_leaves_head_alone() {
        let store = BranchStore::<String>::create_default();
        let err = store
            .update_head_node(Origin::new("boom"), |_| async {
                Err::<ObjectId, _>(BranchError::Config("refused".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BranchError::Config(_)));
        assert!(store.read_head_commit().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn switch_shares_stores() {
        let master = BranchStore::<String>::create_default();
        master
            .update_head_node(Origin::new("m"), replace_at(master.db(), &p("a"), "1"))
            .await
            .unwrap();
        let other = master.switch(name("other"));
        assert_eq!(other.branch().as_str(), "other");
        assert!(other.read_head_commit().await.unwrap().is_none());
        assert!(!other.tags().exists(&name("other")).await.unwrap());
        assert_eq!(other.tags().list().await.unwrap(), vec![name("master")]);
    }

    #[tokio::test]
    async fn clone_branch_refuses_existing_target() {
        let master = BranchStore::<String>::create_default();
        master
            .update_head_node(Origin::new("m"), replace_at(master.db(), &p("a"), "1"))
            .await
            .unwrap();
        let master_head = master.tags().read(master.branch()).await.unwrap();

        let feature = master.clone_branch(name("feature")).await.unwrap().unwrap();
        assert_eq!(feature.branch().as_str(), "feature");
        assert_eq!(
            feature.tags().read(feature.branch()).await.unwrap(),
            master_head
        );

        feature
            .update_head_node(Origin::new("f"), replace_at(feature.db(), &p("a"), "2"))
            .await
            .unwrap();
        let feature_head = feature.tags().read(feature.branch()).await.unwrap();

        assert!(master.clone_branch(name("feature")).await.unwrap().is_none());
        assert_eq!(
            master.tags().read(&name("feature")).await.unwrap(),
            feature_head
        );

        master.clone_force(name("feature")).await.unwrap();
        assert_eq!(
            master.tags().read(&name("feature")).await.unwrap(),
            master_head
        );
    }

    #[tokio::test]
    async fn clone_force_from_unborn_removes_target() {
        let master = BranchStore::<String>::create_default();
        let feature = master.switch(name("feature"));
        feature
            .update_head_node(Origin::new("f"), replace_at(feature.db(), &p("a"), "1"))
            .await
            .unwrap();
        assert!(master.tags().exists(&name("feature")).await.unwrap());

        let target = master.clone_force(name("feature")).await.unwrap();
        assert!(target.read_head_commit().await.unwrap().is_none());
        assert!(!master.tags().exists(&name("feature")).await.unwrap());
    }

    #[tokio::test]
    async fn lost_races_exhaust_retries() {
        init_tracing();
        let store = jammed_store(3);
        let err = store
            .update_head_node(Origin::new("x"), replace_at(store.db(), &p("a"), "1"))
            .await
            .unwrap_err();
        match err {
            BranchError::RetriesExhausted { branch, attempts } => {
                assert_eq!(branch, BranchName::master());
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let store = jammed_store(0);
        let err = store
            .update_head_node(Origin::new("x"), replace_at(store.db(), &p("a"), "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, BranchError::RetriesExhausted { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn dangling_pointer_is_a_store_error() {
        let store = BranchStore::<String>::create_default();
        store
            .tags()
            .update(store.branch(), ObjectId::digest(b"nowhere"))
            .await
            .unwrap();
        assert!(matches!(
            store.read_head_commit().await,
            Err(BranchError::Store(_))
        ));
    }

    #[test]
    fn default_origin_uses_configured_author() {
        let store = BranchStore::<String>::create_default().with_config(BranchConfig {
            default_author: "ci".into(),
            ..Default::default()
        });
        let origin = store.default_origin("Update /a".into());
        assert_eq!(origin.author, "ci");
        assert_eq!(origin.message, "Update /a");
    }
}
