//! Typed group-by helpers.

use indexmap::IndexMap;
use std::hash::Hash;

/// Groups items by a key.
///
/// Groups appear in the order their key was first seen and items keep their
/// relative order inside a group.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> IndexMap<K, Vec<T>>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<T>> = IndexMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

/// Groups items by an optional key, collecting keyless items under `fallback`.
pub fn group_by_or<T, K, F>(
    items: impl IntoIterator<Item = T>,
    key: F,
    fallback: K,
) -> IndexMap<K, Vec<T>>
where
    K: Hash + Eq + Clone,
    F: Fn(&T) -> Option<K>,
{
    group_by(items, |item| key(item).unwrap_or_else(|| fallback.clone()))
}
