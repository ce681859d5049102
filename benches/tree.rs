//! Sequential benchmarks for `BPlusTree` using Divan.
//!
//! Run with: `cargo bench --bench tree`

#![expect(clippy::unwrap_used, reason = "fail fast in benches")]

use divan::{Bencher, black_box};


use bench_utils::{build_tree, lookup_keys, sequential_keys, shuffled_keys};

fn main() {
    divan::main();
}

const SIZES: &[usize] = &[1_000, 100_000, 1_000_000];

// =============================================================================
// Construction
// =============================================================================

#[divan::bench_group]
mod construction {
    use super::{Bencher, SIZES, black_box, sequential_keys, shuffled_keys};
    use bptree::BPlusTree;

    #[divan::bench(args = SIZES)]
    fn load_sequential(bencher: Bencher, n: usize) {
        let keys = sequential_keys(n);
        bencher.bench_local(|| {
            let mut tree: BPlusTree<u64, u64> = BPlusTree::new();
            for &k in &keys {
                tree.insert(black_box(k), k).unwrap();
            }
            tree
        });
    }

    #[divan::bench(args = SIZES)]
    fn load_shuffled(bencher: Bencher, n: usize) {
        let keys = shuffled_keys(n);
        bencher.bench_local(|| {
            let mut tree: BPlusTree<u64, u64> = BPlusTree::new();
            for &k in &keys {
                tree.insert(black_box(k), k).unwrap();
            }
            tree
        });
    }

    /// Node width against load time.
    #[divan::bench(consts = [4, 8, 15, 32, 64])]
    fn load_by_width<const W: usize>(bencher: Bencher) {
        let keys = shuffled_keys(100_000);
        bencher.bench_local(|| {
            let mut tree: BPlusTree<u64, u64, W> = BPlusTree::new();
            for &k in &keys {
                tree.insert(black_box(k), k).unwrap();
            }
            tree
        });
    }
}

// =============================================================================
// Insert
// =============================================================================

#[divan::bench_group]
mod insert {
    use super::{Bencher, SIZES, black_box, build_tree, shuffled_keys};

    #[divan::bench(args = SIZES)]
    fn insert_new_key(bencher: Bencher, n: usize) {
        let keys = shuffled_keys(n);
        let new_key = u64::MAX;
        bencher
            .with_inputs(|| build_tree::<15>(&keys))
            .bench_local_values(|mut tree| {
                tree.insert(black_box(new_key), black_box(1)).unwrap();
                tree
            });
    }

    #[divan::bench(args = SIZES)]
    fn insert_update_existing(bencher: Bencher, n: usize) {
        let keys = shuffled_keys(n);
        let existing = keys[keys.len() / 2];
        bencher
            .with_inputs(|| build_tree::<15>(&keys))
            .bench_local_values(|mut tree| {
                let old = tree.insert(black_box(existing), black_box(2));
                let _ = black_box(old);
                tree
            });
    }
}

// =============================================================================
// Find
// =============================================================================

#[divan::bench_group]
mod find {
    use super::{Bencher, SIZES, black_box, build_tree, lookup_keys, shuffled_keys};

    #[divan::bench(args = SIZES)]
    fn find_mixed(bencher: Bencher, n: usize) {
        let tree = build_tree::<15>(&shuffled_keys(n));
        let lookups = lookup_keys(n, 1_024);
        bencher.bench_local(|| {
            lookups
                .iter()
                .filter(|k| tree.find(black_box(k)).is_some())
                .count()
        });
    }

    #[divan::bench(consts = [4, 8, 15, 32, 64])]
    fn find_by_width<const W: usize>(bencher: Bencher) {
        let tree = build_tree::<W>(&shuffled_keys(100_000));
        let lookups = lookup_keys(100_000, 1_024);
        bencher.bench_local(|| {
            lookups
                .iter()
                .filter(|k| tree.find(black_box(k)).is_some())
                .count()
        });
    }
}

// =============================================================================
// Scans
// =============================================================================

#[divan::bench_group]
mod scan {
    use super::{Bencher, SIZES, build_tree, shuffled_keys};

    #[divan::bench(args = SIZES)]
    fn sum_leaf_chain(bencher: Bencher, n: usize) {
        let tree = build_tree::<15>(&shuffled_keys(n));
        bencher.bench_local(|| tree.sum());
    }

    #[divan::bench(args = SIZES)]
    fn sum_through_iterator(bencher: Bencher, n: usize) {
        let tree = build_tree::<15>(&shuffled_keys(n));
        bencher.bench_local(|| tree.sum_iter());
    }

    #[divan::bench(args = SIZES)]
    fn iterate_pairs(bencher: Bencher, n: usize) {
        let tree = build_tree::<15>(&shuffled_keys(n));
        bencher.bench_local(|| tree.iter().fold(0u64, |acc, (k, v)| acc ^ k ^ v));
    }
}
