use std::collections::BTreeMap;

use arbor_crypto::ContentHasher;
use arbor_types::{ObjectId, Origin};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A leaf value.
    Contents,
    /// One level of a tree.
    Node,
    /// A snapshot of a tree with its history links.
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contents => write!(f, "contents"),
            Self::Node => write!(f, "node"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// The raw store never interprets `data`; decoding happens in the typed
/// layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Encode a value as JSON under the given kind.
    pub fn encode<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<Self> {
        let data =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self::new(kind, data))
    }

    /// Decode the JSON payload, checking the kind first.
    pub fn decode<T: serde::de::DeserializeOwned>(&self, expected: ObjectKind) -> StoreResult<T> {
        if self.kind != expected {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {expected}, got {}", self.kind),
            });
        }
        serde_json::from_slice(&self.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        let hasher = match self.kind {
            ObjectKind::Contents => &ContentHasher::CONTENTS,
            ObjectKind::Node => &ContentHasher::NODE,
            ObjectKind::Commit => &ContentHasher::COMMIT,
        };
        hasher.hash(&self.data)
    }
}

// ---------------------------------------------------------------------------
// NodeObject
// ---------------------------------------------------------------------------

/// One level of a persistent tree.
///
/// A node may hold a value of its own (`contents`) and any number of named
/// children (`succ`). Children are kept in a `BTreeMap` so the encoding, and
/// therefore the key, is independent of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeObject {
    /// Key of the value stored at this node, if any.
    pub contents: Option<ObjectId>,
    /// Child nodes by path segment.
    pub succ: BTreeMap<String, ObjectId>,
}

impl NodeObject {
    /// The canonical empty node.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A node with neither contents nor children.
    pub fn is_empty(&self) -> bool {
        self.contents.is_none() && self.succ.is_empty()
    }

    pub fn child(&self, segment: &str) -> Option<&ObjectId> {
        self.succ.get(segment)
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        StoredObject::encode(ObjectKind::Node, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode(ObjectKind::Node)
    }
}

// ---------------------------------------------------------------------------
// CommitObject
// ---------------------------------------------------------------------------

/// An immutable snapshot record.
///
/// `parents` is empty for the first commit of a branch, holds one key for a
/// normal update, and two keys for a merge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitObject {
    /// Root node of the snapshot; `None` means the empty tree.
    pub node: Option<ObjectId>,
    /// Parent commits, in order.
    pub parents: Vec<ObjectId>,
    /// Who, when, why.
    pub origin: Origin,
}

impl CommitObject {
    pub fn new(origin: Origin, node: Option<ObjectId>, parents: Vec<ObjectId>) -> Self {
        Self {
            node,
            parents,
            origin,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        StoredObject::encode(ObjectKind::Commit, self)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.decode(ObjectKind::Commit)
    }
}
