//! Salts isolating each use of the date-derived seed.
//!
//! Every consumer adds small offsets on top of its salt (shuffle step index,
//! round index), so each salt owns a half-open range `[salt, salt + span)`.
//! Ranges must not overlap each other or the seeds reserved by the legacy
//! on-demand routes. Changing any value reshuffles every future schedule.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::prng::Seed;

/// Offsets a shuffle may add: one per pool member.
///
/// A pool larger than this only logs a warning in `plan_batch`: the top
/// seeds of one shuffle then repeat the bottom seeds of the next salt, which
/// correlates draws but keeps every schedule deterministic and valid.
pub const SHUFFLE_SPAN: Seed = 40_000;
/// Offsets the A/B orientation may add: one per round.
pub const ROUND_SPAN: Seed = crate::scales::ROUNDS_PER_DAY as Seed;

/// Seed ranges used by the earlier client-side routes (legacy daily pick,
/// legacy scales sampling, legacy A/B swap).
const RESERVED: [(&str, Seed, Seed); 3] = [
    ("legacy-daily", 0, 1),
    ("legacy-scales-pool", 50_000, 20),
    ("legacy-scales-round", 70_000, ROUND_SPAN),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Salt {
    /// Classic movie selection.
    Classic,
    /// Scales 20-movie sampling.
    ScalesPool,
    /// Scales per-round A/B orientation.
    ScalesRound,
}

impl Salt {
    pub const ALL: [Salt; 3] = [Salt::Classic, Salt::ScalesPool, Salt::ScalesRound];

    pub fn name(self) -> &'static str {
        match self {
            Salt::Classic => "classic",
            Salt::ScalesPool => "scales_pool",
            Salt::ScalesRound => "scales_round",
        }
    }

    fn span(self) -> Seed {
        match self {
            Salt::Classic | Salt::ScalesPool => SHUFFLE_SPAN,
            Salt::ScalesRound => ROUND_SPAN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaltTable {
    pub classic: Seed,
    pub scales_pool: Seed,
    pub scales_round: Seed,
}

impl Default for SaltTable {
    fn default() -> Self {
        Self {
            classic: 99_999,
            scales_pool: 150_000,
            scales_round: 220_000,
        }
    }
}

impl SaltTable {
    pub fn get(&self, salt: Salt) -> Seed {
        match salt {
            Salt::Classic => self.classic,
            Salt::ScalesPool => self.scales_pool,
            Salt::ScalesRound => self.scales_round,
        }
    }

    /// Check all ranges are pairwise disjoint. Run once at startup.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let mut ranges: Vec<(&'static str, Seed, Seed)> = RESERVED.to_vec();
        ranges.extend(Salt::ALL.iter().map(|s| (s.name(), self.get(*s), s.span())));

        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                let overlap = a.1 < b.1 + b.2 && b.1 < a.1 + a.2;
                if overlap {
                    return Err(ScheduleError::SaltCollision {
                        first: a.0,
                        first_value: a.1,
                        second: b.0,
                        second_value: b.1,
                    });
                }
            }
        }
        Ok(())
    }
}
