//! Leaf value reconciliation.
//!
//! [`ContentMerge`] is consulted only when both sides of a merge hold a
//! value at the same path and each changed it differently from the common
//! ancestor. All other cases are settled structurally by
//! [`merge_contents_option`].
//!
//! "Left" is the incoming commit and "right" the branch head it is merged
//! into, matching the parent order of merge commits.

use arbor_types::Path;

use crate::conflict::{Conflict, MergeResult};

/// Strategy for merging two diverging values.
pub trait ContentMerge<V>: Send + Sync {
    /// Merge `left` and `right`, both changed relative to `old`.
    ///
    /// `old` is `None` when both sides created the value independently.
    fn merge(&self, path: &Path, old: Option<&V>, left: &V, right: &V) -> MergeResult<V>;
}

/// Three-way merge of an optional value.
///
/// - both sides equal: that value
/// - one side unchanged: the other side
/// - both changed and present: `strategy`
/// - removed on one side, changed on the other: conflict
pub fn merge_contents_option<V: PartialEq + Clone>(
    strategy: &dyn ContentMerge<V>,
    path: &Path,
    old: Option<&V>,
    left: Option<&V>,
    right: Option<&V>,
) -> MergeResult<Option<V>> {
    if left == right {
        return Ok(left.cloned());
    }
    if left == old {
        return Ok(right.cloned());
    }
    if right == old {
        return Ok(left.cloned());
    }
    match (left, right) {
        (Some(l), Some(r)) => strategy.merge(path, old, l, r).map(Some),
        _ => Err(Conflict::at(path, "removed on one side, changed on the other")),
    }
}

/// Refuses every divergent change.
#[derive(Clone, Copy, Debug, Default)]
pub struct Strict;

impl<V> ContentMerge<V> for Strict {
    fn merge(&self, path: &Path, _old: Option<&V>, _left: &V, _right: &V) -> MergeResult<V> {
        Err(Conflict::at(path, "both sides changed the value"))
    }
}

/// Keeps the incoming side.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreferLeft;

impl<V: Clone> ContentMerge<V> for PreferLeft {
    fn merge(&self, _path: &Path, _old: Option<&V>, left: &V, _right: &V) -> MergeResult<V> {
        Ok(left.clone())
    }
}

/// Keeps the branch head's side.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreferRight;

impl<V: Clone> ContentMerge<V> for PreferRight {
    fn merge(&self, _path: &Path, _old: Option<&V>, _left: &V, right: &V) -> MergeResult<V> {
        Ok(right.clone())
    }
}

/// Additive counter: both sides' deltas from the ancestor are applied.
///
/// A missing ancestor counts as zero. Overflow is a conflict.
#[derive(Clone, Copy, Debug, Default)]
pub struct Counter;

impl ContentMerge<i64> for Counter {
    fn merge(&self, path: &Path, old: Option<&i64>, left: &i64, right: &i64) -> MergeResult<i64> {
        let base = old.copied().unwrap_or(0);
        left.checked_sub(base)
            .and_then(|delta| right.checked_add(delta))
            .ok_or_else(|| Conflict::at(path, "counter overflow"))
    }
}

/// A strategy built from a closure.
///
/// ```
/// use arbor_merge::{ContentMerge, MergeFn, MergeResult};
/// use arbor_types::Path;
///
/// let longest = MergeFn(
///     |_: &Path, _: Option<&String>, l: &String, r: &String| -> MergeResult<String> {
///         Ok(if l.len() >= r.len() { l.clone() } else { r.clone() })
///     },
/// );
/// let merged = longest.merge(&Path::root(), None, &"ab".to_string(), &"abc".to_string());
/// assert_eq!(merged.unwrap(), "abc");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MergeFn<F>(pub F);

impl<V, F> ContentMerge<V> for MergeFn<F>
where
    F: Fn(&Path, Option<&V>, &V, &V) -> MergeResult<V> + Send + Sync,
{
    fn merge(&self, path: &Path, old: Option<&V>, left: &V, right: &V) -> MergeResult<V> {
        (self.0)(path, old, left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Path {
        Path::from(["k"])
    }

    fn merge<V: PartialEq + Clone>(
        strategy: &dyn ContentMerge<V>,
        old: Option<V>,
        left: Option<V>,
        right: Option<V>,
    ) -> MergeResult<Option<V>> {
        merge_contents_option(strategy, &path(), old.as_ref(), left.as_ref(), right.as_ref())
    }

    #[test]
    fn unchanged_side_yields_other() {
        assert_eq!(merge(&Strict, Some(1), Some(2), Some(1)), Ok(Some(2)));
        assert_eq!(merge(&Strict, Some(1), Some(1), Some(3)), Ok(Some(3)));
        assert_eq!(merge(&Strict, Some(1), None, Some(1)), Ok(None));
    }

    #[test]
    fn identical_changes_agree() {
        assert_eq!(merge(&Strict, Some(1), Some(5), Some(5)), Ok(Some(5)));
        assert_eq!(merge(&Strict, None, Some(5), Some(5)), Ok(Some(5)));
        assert_eq!(merge::<i64>(&Strict, Some(1), None, None), Ok(None));
    }

    #[test]
    fn strict_conflicts_on_divergence() {
        let err = merge(&Strict, Some(1), Some(2), Some(3)).unwrap_err();
        assert_eq!(err.message(), "/k: both sides changed the value");
    }

    #[test]
    fn remove_versus_modify_conflicts_for_any_strategy() {
        let err = merge(&PreferLeft, Some(1), None, Some(3)).unwrap_err();
        assert!(err.message().starts_with("/k:"));
        assert!(merge(&PreferRight, Some(1), Some(2), None).is_err());
    }

    #[test]
    fn preference_strategies() {
        assert_eq!(merge(&PreferLeft, Some(1), Some(2), Some(3)), Ok(Some(2)));
        assert_eq!(merge(&PreferRight, Some(1), Some(2), Some(3)), Ok(Some(3)));
    }

    #[test]
    fn counter_adds_deltas() {
        assert_eq!(merge::<i64>(&Counter, Some(10), Some(13), Some(15)), Ok(Some(18)));
        assert_eq!(merge::<i64>(&Counter, None, Some(2), Some(3)), Ok(Some(5)));
        assert!(merge::<i64>(&Counter, Some(0), Some(i64::MAX), Some(1)).is_err());
    }

    #[test]
    fn closure_strategy_sees_ancestor() {
        let concat = MergeFn(
            |_: &Path, old: Option<&String>, l: &String, r: &String| -> MergeResult<String> {
                Ok(format!("{}|{l}|{r}", old.map(String::as_str).unwrap_or("-")))
            },
        );
        let merged = merge(
            &concat,
            Some("o".to_string()),
            Some("l".to_string()),
            Some("r".to_string()),
        );
        assert_eq!(merged, Ok(Some("o|l|r".to_string())));
    }
}
