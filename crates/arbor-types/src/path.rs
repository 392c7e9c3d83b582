use std::fmt;

use serde::{Deserialize, Serialize};

/// Location in a tree: an ordered sequence of segments.
///
/// The empty path is the root. Paths order lexicographically by segment, so
/// a parent always sorts before its descendants.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<String>);

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The path extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// The path without its last segment, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.0.split_last().map(|(_, init)| Self(init.to_vec()))
    }

    /// First segment and the remaining path.
    pub fn split_first(&self) -> Option<(&str, Path)> {
        self.0
            .split_first()
            .map(|(head, tail)| (head.as_str(), Self(tail.to_vec())))
    }

    /// Returns `true` if `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &Path) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for Path {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_displays_as_slash() {
        assert_eq!(Path::root().to_string(), "/");
        assert!(Path::root().is_root());
    }

    #[test]
    fn display_joins_segments() {
        assert_eq!(Path::from(["a", "b"]).to_string(), "/a/b");
    }

    #[test]
    fn child_and_parent() {
        let a = Path::from(["a"]);
        let ab = a.child("b");
        assert_eq!(ab, Path::from(["a", "b"]));
        assert_eq!(ab.parent(), Some(a));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn split_first_walks_down() {
        let binding = Path::from(["x", "y", "z"]);
        let (head, rest) = binding.split_first().unwrap();
        assert_eq!(head, "x");
        assert_eq!(rest, Path::from(["y", "z"]));
        assert!(Path::root().split_first().is_none());
    }

    #[test]
    fn serializes_as_plain_list() {
        let json = serde_json::to_string(&Path::from(["a", "b"])).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z]{1,4}"
    }

    proptest! {
        #[test]
        fn parent_sorts_before_child(segs in prop::collection::vec(segment(), 0..5), last in segment()) {
            let parent = Path::new(segs);
            let child = parent.child(last);
            prop_assert!(parent < child);
            prop_assert!(child.starts_with(&parent));
            prop_assert_eq!(child.parent(), Some(parent));
        }
    }
}
