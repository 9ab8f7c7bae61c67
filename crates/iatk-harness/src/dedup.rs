//! Order-preserving de-duplication.

use std::collections::HashSet;
use std::hash::Hash;

/// Returns `items` with every repeated element after its first occurrence
/// removed.
///
/// ```
/// use iatk_harness::dedup;
///
/// assert_eq!(dedup(&["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
/// ```
#[must_use]
pub fn dedup<T>(items: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}
