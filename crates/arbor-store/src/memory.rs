use std::collections::HashMap;
use std::sync::RwLock;

use arbor_types::ObjectId;
use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock`;
/// the lock is never held across a suspension point.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut map = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    async fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len().ok())
            .finish()
    }
}
