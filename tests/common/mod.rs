//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Route the crate's split, root-growth and fan-out events to the test
/// output. Filtered by `RUST_LOG`, `bptree=info` when unset.
///
/// Events are only emitted when the crate is built with `--features tracing`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bptree=info"));

        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_ids(true)
            .with_test_writer()
            .try_init();
    });
}

/// `n` distinct keys in a scrambled order.
///
/// Multiplying by an odd constant permutes `0..2^k` modulo `2^k`, so the
/// keys are unique without keeping a set.
pub fn scrambled_keys(n: u64) -> Vec<u64> {
    let modulus = n.next_power_of_two();
    (0..n)
        .map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15) % modulus)
        .collect()
}

/// Deterministic xorshift stream, for tests that need repeatable noise.
pub fn xorshift_keys(seed: u64, n: usize) -> Vec<u64> {
    let mut state = seed | 1;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        })
        .collect()
}

/// `keys` in a random order fixed by `seed` (Fisher-Yates over the xorshift
/// stream).
pub fn shuffled(keys: impl IntoIterator<Item = u64>, seed: u64) -> Vec<u64> {
    let mut keys: Vec<u64> = keys.into_iter().collect();
    let noise = xorshift_keys(seed, keys.len());
    for i in (1..keys.len()).rev() {
        let j = (noise[i] % (i as u64 + 1)) as usize;
        keys.swap(i, j);
    }
    keys
}
