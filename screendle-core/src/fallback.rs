//! Online fallback: serve a day nobody scheduled.
//!
//! Uses the same schedulers and seeds as the batch run, so when the history
//! it can read matches what the batch run would have seen, the answer is the
//! one the batch run would have persisted. It never fails the request; each
//! step down is logged with its own `fallback_level`.

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use crate::assignment::ScalesRound;
use crate::classic::ClassicScheduler;
use crate::date::{DateSpan, format_date};
use crate::movie::{CandidateMovie, ExternalId};
use crate::salt::SaltTable;
use crate::scales::{MOVIES_PER_DAY, ROUNDS_PER_DAY, ScalesScheduler};
use crate::store::{AssignmentStore, PoolProvider};
use crate::window::LookbackWindow;

/// Well-known titles (TMDB ids) served when the catalog cannot be read.
pub const CURATED_FALLBACK: &[ExternalId] = &[
    155, 238, 550, 680, 13, 120, 244786, 27205, 424, 389, 157336, 122, 103, 278, 429, 497, 240, 769,
    207, 73, 106, 101, 694, 539, 185, 11, 1891, 1892, 78, 603, 629, 807, 489, 745, 1422, 274, 37165,
    857, 62, 510, 348, 679, 8587, 862, 98, 197, 289, 597, 76341, 68718, 16869, 24, 640, 1726, 24428,
    299534, 1124, 496243, 872585, 438631,
];

/// How the answer was obtained, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLevel {
    /// Read straight from the store.
    Persisted,
    /// Recomputed with the persisted history the batch run would have used.
    Recomputed,
    /// Recomputed without the lookback window (history read failed).
    RecomputedWithoutHistory,
    /// Scales only: fewer than 20 eligible movies, fewer rounds served.
    ShortPool,
    /// Classic only: catalog unreadable, uniform pick from the curated list.
    UniformRandom,
    /// Scales only: catalog unreadable, seeded pairs from the curated list
    /// in sample order (no ratings, so no gap ranking).
    Curated,
    /// Nothing could be served.
    Unavailable,
}

impl FallbackLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackLevel::Persisted => "persisted",
            FallbackLevel::Recomputed => "recomputed",
            FallbackLevel::RecomputedWithoutHistory => "recomputed_without_history",
            FallbackLevel::ShortPool => "short_pool",
            FallbackLevel::UniformRandom => "uniform_random",
            FallbackLevel::Curated => "curated",
            FallbackLevel::Unavailable => "unavailable",
        }
    }

    pub fn is_degraded(self) -> bool {
        self != FallbackLevel::Persisted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassicToday {
    pub date: NaiveDate,
    pub movie: ExternalId,
    pub level: FallbackLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalesToday {
    pub date: NaiveDate,
    pub rounds: Vec<ScalesRound>,
    pub level: FallbackLevel,
}

#[derive(Debug, Clone)]
pub struct OnlineFallback {
    lookback: u32,
    salts: SaltTable,
}

impl OnlineFallback {
    pub fn new(lookback: u32, salts: SaltTable) -> Self {
        Self { lookback, salts }
    }

    /// Classic movie for `date`, degrading step by step.
    pub fn classic<S, R>(&self, store: &S, date: NaiveDate, rng: &mut R) -> ClassicToday
    where
        S: AssignmentStore + PoolProvider + ?Sized,
        R: Rng,
    {
        let day = DateSpan { start: date, end: date };
        match store.classic_in(day) {
            Ok(found) => {
                if let Some(a) = found.first() {
                    debug!(date = %format_date(date), movie = a.movie, "classic served from store");
                    return ClassicToday { date, movie: a.movie, level: FallbackLevel::Persisted };
                }
            }
            Err(e) => warn!(date = %format_date(date), error = %e, "classic store read failed"),
        }

        let pool = match store.eligible_pool() {
            Ok(pool) if !pool.is_empty() => pool,
            Ok(_) => return self.classic_uniform(date, "eligible pool is empty", rng),
            Err(e) => return self.classic_uniform(date, &e.to_string(), rng),
        };
        let scheduler = ClassicScheduler::new(&pool, &self.salts);

        let history = if self.lookback == 0 {
            Ok(vec![])
        } else {
            store.classic_in(day.with_lookback(self.lookback).with_lookahead(self.lookback))
        };

        let (pick, level) = match history {
            Ok(history) => {
                let window = LookbackWindow::from_assignments(self.lookback, &history);
                (scheduler.step(date, window).map(|(p, _)| p), FallbackLevel::Recomputed)
            }
            Err(e) => {
                warn!(date = %format_date(date), error = %e, "classic history read failed");
                (scheduler.pick_unconditioned(date), FallbackLevel::RecomputedWithoutHistory)
            }
        };

        match pick {
            Ok(pick) => {
                warn!(
                    date = %format_date(date),
                    movie = pick.movie.external_id,
                    fallback_level = level.as_str(),
                    "no scheduled classic movie, serving recomputed pick"
                );
                ClassicToday { date, movie: pick.movie.external_id, level }
            }
            Err(e) => self.classic_uniform(date, &e.to_string(), rng),
        }
    }

    fn classic_uniform<R: Rng>(&self, date: NaiveDate, reason: &str, rng: &mut R) -> ClassicToday {
        let movie = CURATED_FALLBACK[rng.gen_range(0..CURATED_FALLBACK.len())];
        error!(
            date = %format_date(date),
            movie,
            reason,
            fallback_level = FallbackLevel::UniformRandom.as_str(),
            "catalog unavailable, serving random curated movie"
        );
        ClassicToday { date, movie, level: FallbackLevel::UniformRandom }
    }

    /// Scales rounds for `date`, degrading step by step.
    pub fn scales<S>(&self, store: &S, date: NaiveDate) -> ScalesToday
    where
        S: AssignmentStore + PoolProvider + ?Sized,
    {
        let day = DateSpan { start: date, end: date };
        let persisted: BTreeMap<u8, ScalesRound> = match store.scales_in(day) {
            Ok(rounds) => rounds.into_iter().map(|r| (r.round, r)).collect(),
            Err(e) => {
                warn!(date = %format_date(date), error = %e, "scales store read failed");
                BTreeMap::new()
            }
        };
        if persisted.len() >= ROUNDS_PER_DAY {
            debug!(date = %format_date(date), "scales served from store");
            return ScalesToday {
                date,
                rounds: persisted.into_values().collect(),
                level: FallbackLevel::Persisted,
            };
        }

        let (pool, level) = match store.eligible_pool() {
            Ok(pool) if pool.len() >= MOVIES_PER_DAY => (pool, FallbackLevel::Recomputed),
            Ok(pool) => (pool, FallbackLevel::ShortPool),
            Err(e) => {
                warn!(date = %format_date(date), error = %e, "scales catalog read failed");
                (curated_pool(), FallbackLevel::Curated)
            }
        };

        let scheduler = ScalesScheduler::new(&pool, &self.salts);
        let pairs = scheduler.day_partial(date);

        // Persisted rounds win over recomputed ones.
        let rounds: Vec<ScalesRound> = pairs
            .iter()
            .map(|p| persisted.get(&p.round).copied().unwrap_or_else(|| p.to_round(date)))
            .collect();

        let level = if rounds.is_empty() { FallbackLevel::Unavailable } else { level };
        warn!(
            date = %format_date(date),
            rounds = rounds.len(),
            pool = pool.len(),
            fallback_level = level.as_str(),
            "no scheduled scales rounds, serving recomputed rounds"
        );
        ScalesToday { date, rounds, level }
    }
}

/// Curated ids as unrated candidates, in list order.
fn curated_pool() -> Vec<CandidateMovie> {
    CURATED_FALLBACK
        .iter()
        .enumerate()
        .map(|(i, id)| CandidateMovie {
            catalog_id: i as i64,
            external_id: *id,
            title: String::new(),
            rating: None,
        })
        .collect()
}
