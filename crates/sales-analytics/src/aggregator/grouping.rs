//! Two-phase grouping: partition rows by key, then reduce each group.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Partition `rows` by `key`, keeping groups in first-seen order and rows
/// in input order within each group.
pub fn partition<'a, T, K, F>(rows: &'a [T], key: F) -> Vec<(K, Vec<&'a T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a T>)> = Vec::new();

    for row in rows {
        let k = key(row);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![row]));
            }
        }
    }

    groups
}

/// Partition then reduce every group with `reduce`.
pub fn group_reduce<T, K, R, F, G>(rows: &[T], key: F, reduce: G) -> Vec<R>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
    G: Fn(&K, &[&T]) -> R,
{
    partition(rows, key)
        .iter()
        .map(|(k, group)| reduce(k, group.as_slice()))
        .collect()
}

/// Number of distinct values of `key` among `rows`.
pub fn count_distinct<T, K, F>(rows: &[&T], key: F) -> usize
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    rows.iter().map(|r| key(*r)).collect::<HashSet<_>>().len()
}

/// Arithmetic mean; 0 for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
