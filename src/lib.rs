//! # `bptree`
//!
//! An in-memory B+tree for fixed-size, totally ordered keys, tuned for two
//! workloads: loading a large key set by sequential insertion, then answering
//! read queries from many threads.
//!
//! - Nodes hold `WIDTH` keys in flat arrays and are aligned to cache lines.
//!   With `u64` keys and values at the default width a leaf is 4 lines and an
//!   internode 3.
//! - Leaves are chained left to right, so ordered iteration and full scans
//!   never revisit internodes.
//! - Read queries (`find`, `sum`, `psum`, `par_find`) take `&self`; the
//!   parallel ones run on an explicit [`QueryPool`].
//!
//! | Operation | Receiver | Notes |
//! |-----------|----------|-------|
//! | `insert` | `&mut self` | overwrites duplicates, returns the old value |
//! | `find` / `get` | `&self` | root-to-leaf descent |
//! | `iter` | `&self` | leaf-chain walk, ascending |
//! | `sum` / `psum` | `&self` | whole-tree key sum, sequential or parallel |
//! | `par_find` | `&self` | batched lookups, one slice per worker |
//! | `stats` / `validate` | `&self` | shape, memory and self-check |
//!
//! ## Example
//!
//! ```rust
//! use bptree::{BPlusTree, QueryPool};
//!
//! let mut tree: BPlusTree<u64, u64> = BPlusTree::new();
//! for k in 0..10_000 {
//!     tree.insert(k * 2, k).unwrap();
//! }
//!
//! let pool = QueryPool::new(4).unwrap();
//! let lookups: Vec<u64> = (0..1_000).collect();
//!
//! assert_eq!(tree.par_find(&lookups, &pool), 500);
//! assert_eq!(tree.psum(&pool), tree.sum());
//! tree.validate().unwrap();
//! ```
//!
//! ## Logging
//!
//! Build with `--features tracing` to route internal events (splits, root
//! growth, parallel fan-out, validation failures) to the `tracing` crate.
//! Without the feature the log macros compile to nothing.

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Hot accessors are small and benchmarked; inlining them is intentional.
#![allow(clippy::inline_always)]

mod tracing_helpers;

pub mod alloc;
pub mod internode;
pub mod key;
pub mod ksearch;
pub mod leaf;
pub mod pool;
pub mod tree;

pub use key::{Accumulate, TreeKey, TreeValue};
pub use pool::{PaddedSlot, QueryPool};
pub use tree::{
    BPlusTree, DEFAULT_WIDTH, Iter, Keys, MAX_WIDTH, MIN_WIDTH, ParFindResult, TreeError,
    TreeStats, Values,
};
