//! Property-based tests for the `tree` module.
//!
//! These tests verify invariants and properties that should hold for all inputs.
//! Uses differential testing against `BTreeMap` as an oracle.

#![expect(clippy::unwrap_used, reason = "fail fast in tests")]

use bptree::{BPlusTree, QueryPool};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
//  Strategies
// ============================================================================

/// Keys from a narrow range, so generated sequences contain duplicates.
fn dense_key() -> impl Strategy<Value = u64> {
    0u64..512
}

/// Key-value pairs with frequent duplicate keys.
fn key_value_pairs(max_count: usize) -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec((dense_key(), any::<u64>()), 0..=max_count)
}

/// A set of distinct keys across the full `u64` range, in arbitrary order.
fn unique_keys(max_count: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::hash_set(any::<u64>(), 0..=max_count)
        .prop_map(|set| set.into_iter().collect())
}

/// Operations for random testing.
#[derive(Debug, Clone)]
enum Op {
    Insert(u64, u64),
    Get(u64),
}

/// Strategy for generating random operation sequences.
fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            3 => (dense_key(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => dense_key().prop_map(Op::Get),
        ],
        0..=max_ops,
    )
}

// ============================================================================
//  Basic Insert/Find Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every inserted key should be retrievable.
    #[test]
    fn insert_then_find_returns_value(key: u64, value: u64) {
        let mut tree: BPlusTree<u64, u64> = BPlusTree::new();
        tree.insert(key, value).unwrap();

        prop_assert_eq!(tree.find(&key), Some(&value));
    }

    /// Inserting a duplicate key should return the old value.
    #[test]
    fn insert_duplicate_returns_old_value(key: u64, v1: u64, v2: u64) {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();

        prop_assert!(tree.insert(key, v1).unwrap().is_none());
        prop_assert_eq!(tree.insert(key, v2).unwrap(), Some(v1));
        prop_assert_eq!(tree.get(&key), Some(v2));
        prop_assert_eq!(tree.len(), 1);
    }

    /// Find on an absent key returns None.
    #[test]
    fn find_missing_returns_none(inserted: u64, missing: u64, value: u64) {
        prop_assume!(inserted != missing);

        let mut tree: BPlusTree<u64, u64> = BPlusTree::new();
        tree.insert(inserted, value).unwrap();

        prop_assert!(tree.find(&missing).is_none());
    }
}

// ============================================================================
//  Differential Testing Against BTreeMap
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The tree should behave identically to `BTreeMap` for insert/find.
    #[test]
    fn differential_insert_find(pairs in key_value_pairs(400)) {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();
        let mut oracle: BTreeMap<u64, u64> = BTreeMap::new();

        for (key, value) in pairs {
            let tree_old = tree.insert(key, value).unwrap();
            let oracle_old = oracle.insert(key, value);

            prop_assert_eq!(tree_old, oracle_old, "Insert mismatch for key {}", key);
        }

        prop_assert_eq!(tree.len(), oracle.len());
        for (key, expected) in &oracle {
            prop_assert_eq!(tree.find(key), Some(expected));
        }
    }

    /// Random operation sequences should match `BTreeMap` behavior.
    #[test]
    fn differential_random_ops(ops in operations(300)) {
        let mut tree: BPlusTree<u64, u64, 3> = BPlusTree::new();
        let mut oracle: BTreeMap<u64, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(tree.insert(key, value).unwrap(), oracle.insert(key, value));
                }

                Op::Get(key) => {
                    prop_assert_eq!(tree.get(&key), oracle.get(&key).copied());
                }
            }
        }

        prop_assert!(tree.validate().is_ok(), "{:?}", tree.validate());
    }

    /// Iteration yields exactly the oracle's entries, in the same order.
    #[test]
    fn iteration_matches_oracle(pairs in key_value_pairs(400)) {
        let mut tree: BPlusTree<u64, u64, 5> = BPlusTree::new();
        let mut oracle: BTreeMap<u64, u64> = BTreeMap::new();

        for (key, value) in pairs {
            tree.insert(key, value).unwrap();
            oracle.insert(key, value);
        }

        let from_tree: Vec<(u64, u64)> = tree.iter().collect();
        let from_oracle: Vec<(u64, u64)> = oracle.into_iter().collect();
        prop_assert_eq!(from_tree, from_oracle);
    }
}

// ============================================================================
//  Structural Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every insertion order of the same keys produces a valid tree with the
    /// same contents.
    #[test]
    fn structure_valid_for_any_order(keys in unique_keys(600)) {
        let mut tree: BPlusTree<u64, u64, 2> = BPlusTree::new();
        for &k in &keys {
            tree.insert(k, k).unwrap();
        }

        prop_assert!(tree.validate().is_ok(), "{:?}", tree.validate());

        let mut sorted = keys.clone();
        sorted.sort_unstable();
        prop_assert!(tree.keys().eq(sorted));
    }

    /// Depth never decreases and grows by at most one per insert.
    #[test]
    fn depth_is_monotonic(keys in unique_keys(400)) {
        let mut tree: BPlusTree<u64, u64, 3> = BPlusTree::new();
        let mut levels = tree.levels();

        for k in keys {
            tree.insert(k, 0).unwrap();
            let now = tree.levels();
            prop_assert!(now == levels || now == levels + 1);
            levels = now;
        }
    }

    /// Node densities stay in `(0, 1]` and the node counts add up.
    #[test]
    fn stats_are_consistent(keys in unique_keys(600)) {
        let mut tree: BPlusTree<u64, u64, 6> = BPlusTree::new();
        for &k in &keys {
            tree.insert(k, 1).unwrap();
        }
        let stats = tree.stats();

        prop_assert_eq!(stats.leaf_elements, keys.len());
        prop_assert_eq!(stats.node_count, stats.internode_count + stats.leaf_count);
        prop_assert_eq!(stats.internal_elements + stats.internode_count, stats.node_count - 1);

        if let Some(d) = stats.leaf_density() {
            prop_assert!(d > 0.0 && d <= 1.0);
        }
        if let Some(d) = stats.internal_density() {
            prop_assert!(d > 0.0 && d <= 1.0);
        }
    }
}

// ============================================================================
//  Aggregation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// All three sum paths agree with a wrapping sum over the oracle.
    #[test]
    fn sums_agree(keys in unique_keys(2_000), workers in 1usize..=6) {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();
        for &k in &keys {
            tree.insert(k, 0).unwrap();
        }
        let pool = QueryPool::new(workers).unwrap();
        let expected = keys.iter().fold(0u64, |acc, &k| acc.wrapping_add(k));

        prop_assert_eq!(tree.sum(), expected);
        prop_assert_eq!(tree.sum_iter(), expected);
        prop_assert_eq!(tree.psum(&pool), expected);
    }

    /// Batched lookups count exactly the present keys.
    #[test]
    fn par_find_matches_oracle(
        present in prop::collection::btree_set(dense_key(), 0..300),
        lookups in prop::collection::vec(dense_key(), 0..500),
        workers in 1usize..=8,
    ) {
        let tree: BPlusTree<u64, u64, 4> = present.iter().map(|&k| (k, k)).collect();
        let pool = QueryPool::new(workers).unwrap();
        let expected = lookups.iter().filter(|k| present.contains(k)).count();

        prop_assert_eq!(tree.par_find(&lookups, &pool), expected);
    }
}
