use arbor_types::ObjectId;
use async_trait::async_trait;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written: the same data always produces the
///   same ID, and rewriting an existing object is a no-op.
/// - Concurrent reads are always safe.
/// - The store never interprets object contents.
/// - All I/O errors are propagated.
///
/// Methods are `async` so that backends may suspend on I/O; callers treat
/// every call as a suspension point.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    async fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    async fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    async fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read several objects. Backends may override to batch I/O.
    async fn read_batch(&self, ids: &[ObjectId]) -> StoreResult<Vec<Option<StoredObject>>> {
        let mut objects = Vec::with_capacity(ids.len());
        for id in ids {
            objects.push(self.read(id).await?);
        }
        Ok(objects)
    }

    /// Write several objects. Backends may override to batch I/O.
    async fn write_batch(&self, objects: &[StoredObject]) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::with_capacity(objects.len());
        for object in objects {
            ids.push(self.write(object).await?);
        }
        Ok(ids)
    }
}
