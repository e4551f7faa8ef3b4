use std::{collections::HashMap, hash::Hash};

use itertools::Itertools;

use super::error::{Error, Result};

/// Partitions `rows` by their parent key so that the `i`th group belongs to `keys[i]`.
///
/// Rows keep their relative order within a group, keys without rows get an empty group, and a
/// repeated key gets its group again.
pub(crate) fn group_by_key<K, V>(keys: &[K], rows: impl IntoIterator<Item = (K, V)>) -> Vec<Vec<V>>
where
    K: Eq + Hash,
    V: Clone,
{
    let groups: HashMap<K, Vec<V>> = rows.into_iter().into_group_map();

    keys.iter()
        .map(|key| groups.get(key).cloned().unwrap_or_default())
        .collect()
}

/// Index rows by key so a batch can be answered in key order, with `None` for missing keys.
pub(crate) fn align_by_key<K, V>(
    keys: &[K],
    rows: impl IntoIterator<Item = V>,
    key_of: impl Fn(&V) -> K,
) -> Vec<Option<V>>
where
    K: Eq + Hash,
    V: Clone,
{
    let by_key: HashMap<K, V> = rows.into_iter().map(|row| (key_of(&row), row)).collect();

    keys.iter().map(|key| by_key.get(key).cloned()).collect()
}

/// A natural-key lookup must match exactly one row. Zero rows and several rows both count as
/// not found.
pub(crate) fn exactly_one<T>(rows: Vec<T>, entity: &str, key: impl ToString) -> Result<T> {
    let mut rows = rows.into_iter();

    match (rows.next(), rows.next()) {
        (Some(row), None) => Ok(row),
        _ => Err(Error::not_found(entity, key)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&[1, 2, 3, 4], vec![vec!["a1"], vec!["b1", "b2"], vec![], vec!["d1"]])]
    #[case(&[4, 2, 1], vec![vec!["d1"], vec!["b1", "b2"], vec!["a1"]])]
    #[case(&[2, 1, 2], vec![vec!["b1", "b2"], vec!["a1"], vec!["b1", "b2"]])]
    fn grouping_follows_key_order(#[case] keys: &[u32], #[case] expected: Vec<Vec<&str>>) {
        let rows = [(2, "b1"), (1, "a1"), (2, "b2"), (4, "d1")];
        let groups = group_by_key(keys, rows);

        assert_eq!(groups, expected);
    }

    #[rstest]
    fn grouping_ignores_rows_for_unknown_keys() {
        let groups = group_by_key(&[1], [(1, "a"), (9, "z")]);

        assert_eq!(groups, vec![vec!["a"]]);
    }

    #[rstest]
    fn alignment_fills_gaps() {
        let aligned = align_by_key(&[3, 1, 2], [1, 3], |row| *row);

        assert_eq!(aligned, vec![Some(3), Some(1), None]);
    }

    #[rstest]
    #[case(vec![], false)]
    #[case(vec![1], true)]
    #[case(vec![1, 2], false)]
    fn exactly_one_row(#[case] rows: Vec<u32>, #[case] found: bool) {
        let result = exactly_one(rows, "proposal", "cm14451");

        assert_eq!(result.is_ok(), found);
        if let Err(err) = result {
            assert!(err.is_not_found());
        }
    }
}
