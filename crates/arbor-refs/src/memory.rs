//! In-memory tag store for testing and ephemeral use.
//!
//! [`InMemoryTagStore`] keeps every pointer in a `HashMap` and fans changes
//! out over per-branch `tokio::sync::broadcast` channels. Pointers and
//! channels share one lock, so watchers see writes in the order they took
//! effect.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};

use arbor_types::{BranchName, ObjectId};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::traits::TagStore;
use crate::types::{TagEvent, TagWatch};

/// Default capacity of per-branch broadcast channels.
pub const DEFAULT_WATCH_CAPACITY: usize = 256;

#[derive(Default)]
struct State {
    tags: HashMap<BranchName, ObjectId>,
    watchers: HashMap<BranchName, broadcast::Sender<TagEvent>>,
}

impl State {
    /// Store `new` for `branch` and notify watchers if the value changed.
    fn set(&mut self, branch: &BranchName, new: Option<ObjectId>) -> bool {
        let changed = match new {
            Some(id) => self.tags.insert(branch.clone(), id) != Some(id),
            None => self.tags.remove(branch).is_some(),
        };
        if changed {
            debug!(branch = %branch, commit = ?new, "tag changed");
            self.notify(branch, TagEvent::from_pointer(new));
        }
        changed
    }

    /// Deliver an event to the branch's channel. A channel with no
    /// receivers left is dropped.
    fn notify(&mut self, branch: &BranchName, event: TagEvent) {
        if let Some(sender) = self.watchers.get(branch) {
            if sender.send(event).is_err() {
                self.watchers.remove(branch);
            }
        }
    }
}

/// An in-memory implementation of [`TagStore`].
///
/// Data is lost when the store is dropped.
pub struct InMemoryTagStore {
    state: RwLock<State>,
    capacity: usize,
}

impl InMemoryTagStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WATCH_CAPACITY)
    }

    /// A store whose watch channels buffer up to `capacity` events per
    /// branch before slow receivers start lagging.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(State::default()),
            capacity: capacity.max(1),
        }
    }

    /// Number of branches with a live watch channel.
    pub fn watched_branches(&self) -> usize {
        self.state.read().map(|s| s.watchers.len()).unwrap_or(0)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| RefError::LockPoisoned)
    }
}

impl Default for InMemoryTagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryTagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let branches = self.state.read().map(|s| s.tags.len()).unwrap_or(0);
        f.debug_struct("InMemoryTagStore")
            .field("branches", &branches)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[async_trait]
impl TagStore for InMemoryTagStore {
    async fn read(&self, branch: &BranchName) -> Result<Option<ObjectId>> {
        let state = self.state.read().map_err(|_| RefError::LockPoisoned)?;
        Ok(state.tags.get(branch).copied())
    }

    async fn update(&self, branch: &BranchName, commit: ObjectId) -> Result<()> {
        self.write_state()?.set(branch, Some(commit));
        Ok(())
    }

    async fn compare_and_set(
        &self,
        branch: &BranchName,
        expected: Option<ObjectId>,
        new: Option<ObjectId>,
    ) -> Result<bool> {
        let mut state = self.write_state()?;
        let current = state.tags.get(branch).copied();
        if current != expected {
            debug!(
                branch = %branch,
                expected = ?expected,
                current = ?current,
                "compare-and-set mismatch"
            );
            return Ok(false);
        }
        state.set(branch, new);
        Ok(true)
    }

    async fn remove(&self, branch: &BranchName) -> Result<bool> {
        Ok(self.write_state()?.set(branch, None))
    }

    async fn list(&self) -> Result<Vec<BranchName>> {
        let state = self.state.read().map_err(|_| RefError::LockPoisoned)?;
        let mut names: Vec<BranchName> = state.tags.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn watch(&self, branch: &BranchName) -> Result<TagWatch> {
        let mut state = self.write_state()?;
        let capacity = self.capacity;
        let sender = state
            .watchers
            .entry(branch.clone())
            .or_insert_with(|| broadcast::channel(capacity).0);
        Ok(sender.subscribe())
    }
}
