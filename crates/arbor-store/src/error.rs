use arbor_types::ObjectId;

/// Failures while reading or writing contents, nodes and commits.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object is stored under this key.
    #[error("no object with key {0}")]
    NotFound(ObjectId),

    /// A value or object body could not be encoded or decoded.
    #[error("cannot encode object: {0}")]
    Serialization(String),

    /// The key resolves to an object of the wrong kind.
    #[error("object {id} is unusable: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// Writes under the null key are refused.
    #[error("refusing to write the null key")]
    NullObjectId,

    #[error("object map lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;
