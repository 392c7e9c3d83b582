use arbor_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is fed to the hasher ahead of the data, followed by a `:`
/// separator.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for leaf contents.
    pub const CONTENTS: Self = Self {
        domain: "arbor-contents-v1",
    };
    /// Hasher for tree nodes.
    pub const NODE: Self = Self {
        domain: "arbor-node-v1",
    };
    /// Hasher for commits.
    pub const COMMIT: Self = Self {
        domain: "arbor-commit-v1",
    };

    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }
}
