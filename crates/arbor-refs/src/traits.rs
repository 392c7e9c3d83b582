//! The [`TagStore`] trait defining the branch pointer interface.
//!
//! Any backend (in-memory, filesystem, database) implements this trait to
//! provide named branch pointers for Arbor.

use arbor_types::{BranchName, ObjectId};
use async_trait::async_trait;

use crate::error::{RefError, Result};
use crate::types::TagWatch;

/// Storage backend for branch pointers.
///
/// Implementations must be thread-safe (`Send + Sync`). Every method is a
/// suspension point. Writes to one branch are observed by watchers of that
/// branch in the order they took effect, and only when the stored value
/// actually changed.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Read the commit a branch points at.
    ///
    /// Returns `Ok(None)` if the branch is unborn.
    async fn read(&self, branch: &BranchName) -> Result<Option<ObjectId>>;

    /// Unconditionally point `branch` at `commit`.
    async fn update(&self, branch: &BranchName, commit: ObjectId) -> Result<()>;

    /// Atomically replace the pointer if it currently equals `expected`.
    ///
    /// `new = None` deletes the entry. Returns `Ok(false)` without writing
    /// if the current value differs from `expected`.
    async fn compare_and_set(
        &self,
        branch: &BranchName,
        expected: Option<ObjectId>,
        new: Option<ObjectId>,
    ) -> Result<bool>;

    /// Delete a branch entry.
    ///
    /// Returns `Ok(true)` if the entry existed.
    async fn remove(&self, branch: &BranchName) -> Result<bool>;

    /// All branches with an entry, sorted.
    async fn list(&self) -> Result<Vec<BranchName>>;

    /// Subscribe to pointer changes of one branch.
    ///
    /// Only changes made after the call returns are delivered.
    async fn watch(&self, branch: &BranchName) -> Result<TagWatch>;

    /// Read a pointer that must exist.
    async fn read_exn(&self, branch: &BranchName) -> Result<ObjectId> {
        self.read(branch).await?.ok_or_else(|| RefError::NotFound {
            name: branch.to_string(),
        })
    }

    async fn exists(&self, branch: &BranchName) -> Result<bool> {
        Ok(self.read(branch).await?.is_some())
    }
}
