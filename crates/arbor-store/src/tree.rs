//! Copy-on-write operations over persistent trees.
//!
//! Every mutation reads the nodes along one path, rebuilds them bottom-up and
//! writes the new versions. Siblings are shared with the old tree by key.
//! Nodes left with neither contents nor children are dropped from their
//! parent, so the key of a tree depends only on the values it holds.

use arbor_types::{ObjectId, Path};

use crate::db::{Contents, ObjectDb};
use crate::error::StoreResult;
use crate::object::NodeObject;

impl<V: Contents> ObjectDb<V> {
    /// Key of the subtree at `path`, or `None` if the path leads nowhere.
    pub async fn sub(&self, node: &ObjectId, path: &Path) -> StoreResult<Option<ObjectId>> {
        let mut current = *node;
        for segment in path.segments() {
            let parent = self.read_node_exn(&current).await?;
            match parent.child(segment) {
                Some(child) => current = *child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Key of the value stored at `path`, without decoding it.
    pub async fn find_contents_key(
        &self,
        node: &ObjectId,
        path: &Path,
    ) -> StoreResult<Option<ObjectId>> {
        match self.sub(node, path).await? {
            Some(id) => Ok(self.read_node_exn(&id).await?.contents),
            None => Ok(None),
        }
    }

    pub async fn find(&self, node: &ObjectId, path: &Path) -> StoreResult<Option<V>> {
        match self.find_contents_key(node, path).await? {
            Some(key) => self.read_contents_exn(&key).await.map(Some),
            None => Ok(None),
        }
    }

    /// Whether a value is stored at `path`.
    pub async fn valid(&self, node: &ObjectId, path: &Path) -> StoreResult<bool> {
        Ok(self.find_contents_key(node, path).await?.is_some())
    }

    /// Segment names of the immediate children at `path`, in order.
    pub async fn successors(&self, node: &ObjectId, path: &Path) -> StoreResult<Vec<String>> {
        match self.sub(node, path).await? {
            Some(id) => Ok(self.read_node_exn(&id).await?.succ.into_keys().collect()),
            None => Ok(Vec::new()),
        }
    }

    /// Store `value` at `path`, creating intermediate nodes as needed.
    ///
    /// A leaf already holding a value equal to `value` keeps its contents
    /// key, so the returned tree equals `node` even when `V` has no
    /// canonical encoding.
    pub async fn update(&self, node: &ObjectId, path: &Path, value: &V) -> StoreResult<ObjectId> {
        let contents = match self.find_contents_key(node, path).await? {
            Some(key) if self.read_contents_exn(&key).await? == *value => key,
            _ => self.create_contents(value).await?,
        };
        self.rewrite_at(node, path, move |mut leaf| {
            leaf.contents = Some(contents);
            leaf
        })
        .await
    }

    /// Drop the whole subtree at `path`.
    ///
    /// Removing a path that does not exist returns a tree equal to `node`.
    pub async fn remove(&self, node: &ObjectId, path: &Path) -> StoreResult<ObjectId> {
        self.rewrite_at(node, path, |_| NodeObject::empty()).await
    }

    async fn rewrite_at<F>(&self, node: &ObjectId, path: &Path, f: F) -> StoreResult<ObjectId>
    where
        F: FnOnce(NodeObject) -> NodeObject,
    {
        let mut spine = Vec::with_capacity(path.len());
        let mut current = self.read_node_exn(node).await?;
        for segment in path.segments() {
            let next = match current.child(segment) {
                Some(child) => self.read_node_exn(child).await?,
                None => NodeObject::empty(),
            };
            spine.push(current);
            current = next;
        }

        let mut rebuilt = f(current);
        for (mut parent, segment) in spine.into_iter().rev().zip(path.segments().iter().rev()) {
            if rebuilt.is_empty() {
                parent.succ.remove(segment);
            } else {
                let key = self.create_node(&rebuilt).await?;
                parent.succ.insert(segment.clone(), key);
            }
            rebuilt = parent;
        }
        self.create_node(&rebuilt).await
    }
}
