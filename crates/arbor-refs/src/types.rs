//! Tag store event types.

use arbor_types::ObjectId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A change to one branch pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagEvent {
    /// The branch now points at this commit.
    Updated(ObjectId),
    /// The branch entry was deleted.
    Removed,
}

impl TagEvent {
    /// The new pointer value, `None` for a removal.
    pub fn commit(&self) -> Option<ObjectId> {
        match self {
            Self::Updated(id) => Some(*id),
            Self::Removed => None,
        }
    }

    pub(crate) fn from_pointer(pointer: Option<ObjectId>) -> Self {
        match pointer {
            Some(id) => Self::Updated(id),
            None => Self::Removed,
        }
    }
}

/// Receiver side of a branch watch.
///
/// Slow receivers may observe `RecvError::Lagged`; events are state
/// transitions, so consumers re-read current state instead of replaying.
pub type TagWatch = broadcast::Receiver<TagEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_of_event() {
        let id = ObjectId::digest(b"c");
        assert_eq!(TagEvent::Updated(id).commit(), Some(id));
        assert_eq!(TagEvent::Removed.commit(), None);
        assert_eq!(TagEvent::from_pointer(None), TagEvent::Removed);
    }

    #[test]
    fn event_serializes() {
        let json = serde_json::to_string(&TagEvent::Removed).unwrap();
        assert_eq!(json, "\"Removed\"");
    }
}
