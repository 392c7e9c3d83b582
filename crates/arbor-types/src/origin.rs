use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Author recorded when a caller does not name one.
pub const DEFAULT_AUTHOR: &str = "arbor";

/// Wall-clock time of a commit, in milliseconds since the UNIX epoch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Timestamp for an explicit millisecond value.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(millis)
    }

    /// The epoch itself.
    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provenance attached to every commit: who, when, and why.
///
/// An `Origin` is passed through unchanged to commit construction, so two
/// commits with the same tree and parents but different origins get
/// different keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    /// Human-readable description of the change.
    pub message: String,
    /// Who made the change.
    pub author: String,
    /// When the change was made.
    pub date: Timestamp,
}

impl Origin {
    /// Provenance stamped with the current time and the default author.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            author: DEFAULT_AUTHOR.to_string(),
            date: Timestamp::now(),
        }
    }

    /// Replace the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Replace the timestamp (useful for deterministic keys in tests).
    pub fn at(mut self, date: Timestamp) -> Self {
        self.date = date;
        self
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> @{}", self.message, self.author, self.date)
    }
}
