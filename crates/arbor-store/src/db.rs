use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use arbor_types::{ObjectId, Origin};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryObjectStore;
use crate::object::{CommitObject, NodeObject, ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// A leaf value type that can live in the store.
///
/// Blanket-implemented for every type with the listed bounds.
pub trait Contents:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
}

impl<T> Contents for T where
    T: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
}

/// Typed view over an [`ObjectStore`] for leaf values of type `V`.
///
/// Cloning is cheap: clones share the underlying backend.
pub struct ObjectDb<V> {
    store: Arc<dyn ObjectStore>,
    _contents: PhantomData<fn() -> V>,
}

impl<V> Clone for ObjectDb<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _contents: PhantomData,
        }
    }
}

impl<V> fmt::Debug for ObjectDb<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDb").finish_non_exhaustive()
    }
}

impl<V: Contents> ObjectDb<V> {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            _contents: PhantomData,
        }
    }

    /// A database over a fresh [`InMemoryObjectStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryObjectStore::new()))
    }

    /// The raw backend.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    async fn read_kind(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        self.store.read(id).await
    }

    // -----------------------------------------------------------------------
    // Contents
    // -----------------------------------------------------------------------

    pub async fn read_contents(&self, id: &ObjectId) -> StoreResult<Option<V>> {
        match self.read_kind(id).await? {
            Some(obj) => obj.decode(ObjectKind::Contents).map(Some),
            None => Ok(None),
        }
    }

    pub async fn read_contents_exn(&self, id: &ObjectId) -> StoreResult<V> {
        self.read_contents(id)
            .await?
            .ok_or(StoreError::NotFound(*id))
    }

    pub async fn create_contents(&self, value: &V) -> StoreResult<ObjectId> {
        let obj = StoredObject::encode(ObjectKind::Contents, value)?;
        self.store.write(&obj).await
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    pub async fn read_node(&self, id: &ObjectId) -> StoreResult<Option<NodeObject>> {
        match self.read_kind(id).await? {
            Some(obj) => NodeObject::from_stored_object(&obj).map(Some),
            None => Ok(None),
        }
    }

    pub async fn read_node_exn(&self, id: &ObjectId) -> StoreResult<NodeObject> {
        self.read_node(id).await?.ok_or(StoreError::NotFound(*id))
    }

    pub async fn create_node(&self, node: &NodeObject) -> StoreResult<ObjectId> {
        self.store.write(&node.to_stored_object()?).await
    }

    /// Key of the canonical empty tree, written on demand.
    pub async fn empty_node(&self) -> StoreResult<ObjectId> {
        self.create_node(&NodeObject::empty()).await
    }

    /// Structural equality of two trees.
    ///
    /// Nodes are content addressed and empty children are pruned, so two
    /// trees are equal exactly when their keys are.
    pub fn node_equal(a: &ObjectId, b: &ObjectId) -> bool {
        a == b
    }

    // -----------------------------------------------------------------------
    // Commits
    // -----------------------------------------------------------------------

    pub async fn read_commit(&self, id: &ObjectId) -> StoreResult<Option<CommitObject>> {
        match self.read_kind(id).await? {
            Some(obj) => CommitObject::from_stored_object(&obj).map(Some),
            None => Ok(None),
        }
    }

    pub async fn read_commit_exn(&self, id: &ObjectId) -> StoreResult<CommitObject> {
        self.read_commit(id).await?.ok_or(StoreError::NotFound(*id))
    }

    /// Write a commit for `node` with the given parents.
    pub async fn create_commit(
        &self,
        origin: &Origin,
        node: Option<ObjectId>,
        parents: Vec<ObjectId>,
    ) -> StoreResult<ObjectId> {
        let parent_count = parents.len();
        let commit = CommitObject::new(origin.clone(), node, parents);
        let id = self.store.write(&commit.to_stored_object()?).await?;
        debug!(
            commit = %id.short_hex(),
            parents = parent_count,
            message = %origin.message,
            "created commit"
        );
        Ok(id)
    }

    /// Root node of a commit, if it recorded one.
    pub fn commit_node(commit: &CommitObject) -> Option<ObjectId> {
        commit.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::Timestamp;

    fn db() -> ObjectDb<String> {
        ObjectDb::in_memory()
    }

    #[tokio::test]
    async fn contents_roundtrip_through_store() {
        let db = db();
        let id = db.create_contents(&"v1".to_string()).await.unwrap();
        assert_eq!(db.read_contents(&id).await.unwrap().as_deref(), Some("v1"));
        assert_eq!(db.read_contents_exn(&id).await.unwrap(), "v1");
    }

    #[tokio::test]
    async fn exn_reads_fail_with_not_found() {
        let db = db();
        let missing = ObjectId::digest(b"missing");
        assert!(matches!(
            db.read_contents_exn(&missing).await,
            Err(StoreError::NotFound(id)) if id == missing
        ));
        assert!(matches!(
            db.read_node_exn(&missing).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            db.read_commit_exn(&missing).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(db.read_commit(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reading_a_node_as_commit_is_corrupt() {
        let db = db();
        let node = db.empty_node().await.unwrap();
        assert!(matches!(
            db.read_commit(&node).await,
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[tokio::test]
    async fn empty_node_is_canonical() {
        let db = db();
        let a = db.empty_node().await.unwrap();
        let b = db.create_node(&NodeObject::default()).await.unwrap();
        assert!(ObjectDb::<String>::node_equal(&a, &b));
        assert!(db.read_node_exn(&a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_records_node_and_parents() {
        let db = db();
        let node = db.empty_node().await.unwrap();
        let origin = Origin::new("first").at(Timestamp::from_millis(1));
        let root = db.create_commit(&origin, Some(node), vec![]).await.unwrap();
        let child = db
            .create_commit(&origin, Some(node), vec![root])
            .await
            .unwrap();
        assert_ne!(root, child);

        let commit = db.read_commit_exn(&child).await.unwrap();
        assert_eq!(commit.parents, vec![root]);
        assert_eq!(ObjectDb::<String>::commit_node(&commit), Some(node));
        assert_eq!(commit.origin, origin);
    }

    #[tokio::test]
    async fn same_commit_twice_has_same_key() {
        let db = db();
        let origin = Origin::new("m").at(Timestamp::from_millis(5));
        let a = db.create_commit(&origin, None, vec![]).await.unwrap();
        let b = db.create_commit(&origin, None, vec![]).await.unwrap();
        assert_eq!(a, b);
    }
}
