//! Hierarchical key/value operations on the branch head.

use std::collections::{BTreeSet, VecDeque};

use arbor_store::Contents;
use arbor_types::{Origin, Path};

use crate::error::{BranchError, BranchResult};
use crate::store::BranchStore;

impl<V: Contents> BranchStore<V> {
    /// The value at `path` in the head tree.
    pub async fn read(&self, path: &Path) -> BranchResult<Option<V>> {
        let node = self.head_node().await?;
        Ok(self.db.find(&node, path).await?)
    }

    /// Like [`read`](Self::read), failing with [`BranchError::NotFound`].
    pub async fn read_exn(&self, path: &Path) -> BranchResult<V> {
        self.read(path)
            .await?
            .ok_or_else(|| BranchError::NotFound(path.clone()))
    }

    /// Whether a value is stored at `path`.
    pub async fn mem(&self, path: &Path) -> BranchResult<bool> {
        let node = self.head_node().await?;
        Ok(self.db.valid(&node, path).await?)
    }

    /// Store `value` at `path`.
    ///
    /// Writing the value already stored there is a no-op: no commit is
    /// created and the head does not move.
    pub async fn update(&self, path: &Path, value: V, origin: Option<Origin>) -> BranchResult<()> {
        let origin = origin.unwrap_or_else(|| self.default_origin(format!("Update {path}")));
        let db = &self.db;
        let value = &value;
        self.update_head_node(origin, move |node| async move {
            db.update(&node, path, value)
                .await
                .map_err(BranchError::from)
        })
        .await
    }

    /// Drop the value and everything below `path`.
    pub async fn remove(&self, path: &Path, origin: Option<Origin>) -> BranchResult<()> {
        let origin = origin.unwrap_or_else(|| self.default_origin(format!("Remove {path}")));
        let db = &self.db;
        self.update_head_node(origin, move |node| async move {
            db.remove(&node, path).await.map_err(BranchError::from)
        })
        .await
    }

    /// Immediate children of each of `paths`, as full paths.
    ///
    /// The union over all inputs is returned sorted, without duplicates.
    pub async fn list(&self, paths: &[Path]) -> BranchResult<Vec<Path>> {
        let node = self.head_node().await?;
        let mut children = BTreeSet::new();
        for path in paths {
            for segment in self.db.successors(&node, path).await? {
                children.insert(path.child(segment));
            }
        }
        Ok(children.into_iter().collect())
    }

    /// Every `(path, value)` pair in the head tree, sorted by path.
    pub async fn dump(&self) -> BranchResult<Vec<(Path, V)>> {
        let node = self.head_node().await?;
        let mut entries = Vec::new();
        let mut queue = VecDeque::from([Path::root()]);
        while let Some(path) = queue.pop_front() {
            if let Some(value) = self.db.find(&node, &path).await? {
                entries.push((path.clone(), value));
            }
            for segment in self.db.successors(&node, &path).await? {
                queue.push_back(path.child(segment));
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}
