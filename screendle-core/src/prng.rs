//! Seeded PRNG: a stateless map from an integer seed to a float in [0, 1).
//!
//! This is the same `fract(sin(seed) * 10000)` hash the web client and the
//! batch scheduler have always used. Both call sites must agree on every
//! choice derived from it, so the formula must not change: doing so
//! reshuffles every future schedule.

/// Integer seed space. Date seeds (`YYYYMMDD`) plus salts fit comfortably.
pub type Seed = i64;

/// Deterministic float in [0, 1) for `seed`.
pub fn seeded_random(seed: Seed) -> f64 {
    let x = (seed as f64).sin() * 10000.0;
    let r = x - x.floor();
    // `x - floor(x)` can round up to exactly 1.0 for tiny negative x.
    if r >= 1.0 { 0.0 } else { r }
}
