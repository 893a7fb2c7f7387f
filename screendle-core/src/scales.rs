//! Scales scheduler: ten "which is rated higher" pairs per day, easiest first.
//!
//! Per day D:
//! - shuffle the eligible pool with `date_to_seed(D) + pool salt`, keep 20
//! - pair them off in order: (0,1), (2,3), ...
//! - stable-sort pairs by rating gap descending; index j becomes round j+1
//! - swap A/B when `seeded_random(date_to_seed(D) + round salt + j) > 0.5`
//!
//! Each day only reads the shared pool, so days are independent.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::assignment::ScalesRound;
use crate::date::{DateSpan, date_to_seed, format_date};
use crate::error::ScheduleError;
use crate::movie::CandidateMovie;
use crate::prng::{Seed, seeded_random};
use crate::salt::{Salt, SaltTable};
use crate::shuffle::seeded_shuffle;

pub const ROUNDS_PER_DAY: usize = 10;
pub const MOVIES_PER_DAY: usize = ROUNDS_PER_DAY * 2;

/// A provisional pair before orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedPair {
    pub first: CandidateMovie,
    pub second: CandidateMovie,
    pub gap: f64,
}

impl RatedPair {
    fn new(first: CandidateMovie, second: CandidateMovie) -> Self {
        let gap = (first.rating_value() - second.rating_value()).abs();
        Self { first, second, gap }
    }
}

/// A fully oriented round with the movies attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalesPair {
    pub round: u8,
    pub movie_a: CandidateMovie,
    pub movie_b: CandidateMovie,
    pub gap: f64,
}

impl ScalesPair {
    pub fn to_round(&self, date: NaiveDate) -> ScalesRound {
        ScalesRound {
            date,
            round: self.round,
            movie_a: self.movie_a.external_id,
            movie_b: self.movie_b.external_id,
        }
    }
}

/// Output of a multi-day run.
#[derive(Debug, Clone, Default)]
pub struct ScalesPlan {
    /// New rounds, ascending by (date, round).
    pub rounds: Vec<ScalesRound>,
    /// Days that received at least one new round.
    pub days_scheduled: usize,
    /// Days already holding all ten rounds.
    pub skipped: usize,
}

/// Pair consecutive movies and order the pairs widest gap first (stable).
pub fn rank_pairs(movies: &[CandidateMovie]) -> Vec<RatedPair> {
    let mut pairs: Vec<RatedPair> = movies
        .chunks_exact(2)
        .take(ROUNDS_PER_DAY)
        .map(|c| RatedPair::new(c[0].clone(), c[1].clone()))
        .collect();
    pairs.sort_by(|x, y| y.gap.total_cmp(&x.gap));
    pairs
}

#[derive(Debug, Clone)]
pub struct ScalesScheduler<'a> {
    pool: &'a [CandidateMovie],
    pool_salt: Seed,
    round_salt: Seed,
}

impl<'a> ScalesScheduler<'a> {
    /// `pool` must already be the ordered eligible pool.
    pub fn new(pool: &'a [CandidateMovie], salts: &SaltTable) -> Self {
        Self {
            pool,
            pool_salt: salts.get(Salt::ScalesPool),
            round_salt: salts.get(Salt::ScalesRound),
        }
    }

    /// Whole-run precondition: twenty distinct candidates.
    pub fn check_pool(&self) -> Result<(), ScheduleError> {
        if self.pool.len() < MOVIES_PER_DAY {
            return Err(ScheduleError::InsufficientPool {
                available: self.pool.len(),
                required: MOVIES_PER_DAY,
            });
        }
        Ok(())
    }

    /// The 20 movies sampled for `date`, in pairing order.
    pub fn sample(&self, date: NaiveDate) -> Vec<CandidateMovie> {
        let mut shuffled = seeded_shuffle(self.pool, date_to_seed(date) + self.pool_salt);
        shuffled.truncate(MOVIES_PER_DAY);
        shuffled
    }

    /// Orient ranked pairs into numbered rounds.
    pub fn orient(&self, date: NaiveDate, ranked: Vec<RatedPair>) -> Vec<ScalesPair> {
        let base = date_to_seed(date) + self.round_salt;
        ranked
            .into_iter()
            .enumerate()
            .map(|(j, pair)| {
                let swap = seeded_random(base + j as Seed) > 0.5;
                let (movie_a, movie_b) = if swap {
                    (pair.second, pair.first)
                } else {
                    (pair.first, pair.second)
                };
                ScalesPair {
                    round: j as u8 + 1,
                    movie_a,
                    movie_b,
                    gap: pair.gap,
                }
            })
            .collect()
    }

    /// All ten rounds for `date`.
    pub fn day(&self, date: NaiveDate) -> Result<Vec<ScalesPair>, ScheduleError> {
        self.check_pool()?;
        Ok(self.orient(date, rank_pairs(&self.sample(date))))
    }

    /// Best effort for a short pool: as many rounds as it allows.
    pub fn day_partial(&self, date: NaiveDate) -> Vec<ScalesPair> {
        self.orient(date, rank_pairs(&self.sample(date)))
    }

    /// Fill every day of `span` that lacks rounds. Days with some rounds
    /// only receive the missing round numbers.
    pub fn schedule(&self, span: DateSpan, existing: &[ScalesRound]) -> Result<ScalesPlan, ScheduleError> {
        self.check_pool()?;

        let mut present: BTreeMap<NaiveDate, BTreeSet<u8>> = BTreeMap::new();
        for r in existing {
            present.entry(r.date).or_default().insert(r.round);
        }

        let mut plan = ScalesPlan::default();
        for date in span.days() {
            let have = present.get(&date);
            if have.is_some_and(|rounds| rounds.len() >= ROUNDS_PER_DAY) {
                plan.skipped += 1;
                continue;
            }

            let before = plan.rounds.len();
            for pair in self.day(date)? {
                if have.is_some_and(|rounds| rounds.contains(&pair.round)) {
                    continue;
                }
                plan.rounds.push(pair.to_round(date));
            }
            if plan.rounds.len() > before {
                plan.days_scheduled += 1;
            }
            debug!(date = %format_date(date), rounds = plan.rounds.len() - before, "scales day");
        }
        Ok(plan)
    }
}
