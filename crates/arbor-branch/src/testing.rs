//! Tag store doubles for driving the compare-and-set loops into their
//! retry paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arbor_merge::{Strict, ThreeWayMerge};
use arbor_refs::{InMemoryTagStore, TagStore, TagWatch};
use arbor_store::ObjectDb;
use arbor_types::{BranchName, ObjectId, Origin, Path};
use async_trait::async_trait;

use crate::config::BranchConfig;
use crate::store::BranchStore;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Commit `value` at `path` on top of `parent`'s tree.
pub(crate) async fn commit_on(
    db: &ObjectDb<String>,
    parent: Option<ObjectId>,
    path: &str,
    value: &str,
) -> ObjectId {
    let node = match parent {
        Some(p) => db.read_commit_exn(&p).await.unwrap().node.unwrap(),
        None => db.empty_node().await.unwrap(),
    };
    let node = db
        .update(&node, &Path::new(path.split('/')), &value.to_string())
        .await
        .unwrap();
    let origin = Origin::new(format!("set {path}"));
    db.create_commit(&origin, Some(node), parent.into_iter().collect())
        .await
        .unwrap()
}

/// Tag store whose compare-and-set never matches.
pub(crate) struct Jammed(pub(crate) InMemoryTagStore);

#[async_trait]
impl TagStore for Jammed {
    async fn read(&self, branch: &BranchName) -> arbor_refs::Result<Option<ObjectId>> {
        self.0.read(branch).await
    }

    async fn update(&self, branch: &BranchName, commit: ObjectId) -> arbor_refs::Result<()> {
        self.0.update(branch, commit).await
    }

    async fn compare_and_set(
        &self,
        _branch: &BranchName,
        _expected: Option<ObjectId>,
        _new: Option<ObjectId>,
    ) -> arbor_refs::Result<bool> {
        Ok(false)
    }

    async fn remove(&self, branch: &BranchName) -> arbor_refs::Result<bool> {
        self.0.remove(branch).await
    }

    async fn list(&self) -> arbor_refs::Result<Vec<BranchName>> {
        self.0.list().await
    }

    async fn watch(&self, branch: &BranchName) -> arbor_refs::Result<TagWatch> {
        self.0.watch(branch).await
    }
}

pub(crate) fn jammed_store(retries: usize) -> BranchStore<String> {
    let db = ObjectDb::<String>::in_memory();
    let merger = Arc::new(ThreeWayMerge::new(db.clone(), Arc::new(Strict)));
    BranchStore::open(
        db,
        Arc::new(Jammed(InMemoryTagStore::new())),
        merger,
        BranchName::master(),
        BranchConfig {
            max_update_retries: retries,
            ..Default::default()
        },
    )
}

/// Tag store where a concurrent writer commits `/interloper` on top of the
/// head just before the first compare-and-set after [`arm`](Self::arm).
pub(crate) struct Interloper {
    inner: InMemoryTagStore,
    db: ObjectDb<String>,
    armed: AtomicBool,
    moved: Mutex<Option<ObjectId>>,
}

impl Interloper {
    pub(crate) fn new(db: ObjectDb<String>) -> Self {
        Self {
            inner: InMemoryTagStore::new(),
            db,
            armed: AtomicBool::new(false),
            moved: Mutex::new(None),
        }
    }

    pub(crate) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// The commit the concurrent writer installed, once it has run.
    pub(crate) fn moved(&self) -> Option<ObjectId> {
        *self.moved.lock().unwrap()
    }
}

#[async_trait]
impl TagStore for Interloper {
    async fn read(&self, branch: &BranchName) -> arbor_refs::Result<Option<ObjectId>> {
        self.inner.read(branch).await
    }

    async fn update(&self, branch: &BranchName, commit: ObjectId) -> arbor_refs::Result<()> {
        self.inner.update(branch, commit).await
    }

    async fn compare_and_set(
        &self,
        branch: &BranchName,
        expected: Option<ObjectId>,
        new: Option<ObjectId>,
    ) -> arbor_refs::Result<bool> {
        if self.armed.swap(false, Ordering::SeqCst) {
            let head = self.inner.read(branch).await?;
            let commit = commit_on(&self.db, head, "interloper", "x").await;
            self.inner.update(branch, commit).await?;
            *self.moved.lock().unwrap() = Some(commit);
        }
        self.inner.compare_and_set(branch, expected, new).await
    }

    async fn remove(&self, branch: &BranchName) -> arbor_refs::Result<bool> {
        self.inner.remove(branch).await
    }

    async fn list(&self) -> arbor_refs::Result<Vec<BranchName>> {
        self.inner.list().await
    }

    async fn watch(&self, branch: &BranchName) -> arbor_refs::Result<TagWatch> {
        self.inner.watch(branch).await
    }
}
