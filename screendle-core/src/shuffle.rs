// Fisher-Yates shuffle, per Knuth, driven by the stateless seeded PRNG.
// Step i draws from `seed + i`, so the input order matters: callers hand in
// the pool sorted by a persistent key.

use crate::prng::{Seed, seeded_random};

/// Deterministic permutation of `items`. The input is left untouched.
pub fn seeded_shuffle<T: Clone>(items: &[T], seed: Seed) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let draw = seeded_random(seed + i as Seed);
        let j = ((draw * (i + 1) as f64).floor() as usize).min(i);
        out.swap(i, j);
    }
    out
}
