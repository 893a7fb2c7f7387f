//! Classic scheduler: one target movie per day, no repeats inside the lookback.
//!
//! Per day D (ascending, skipping dates that already have a pick):
//! - exclude every movie on `[D - lookback, D + lookback]` (the days after D
//!   can only hold persisted assignments)
//! - if that empties the pool, fall back to the full pool and flag the day
//! - shuffle with `date_to_seed(D) + classic salt`, take the head
//! - record the pick in the window for the following days
//!
//! Days depend on each other through the window, so this never runs in
//! parallel across dates.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::assignment::ClassicAssignment;
use crate::date::{DateSpan, date_to_seed, format_date};
use crate::error::ScheduleError;
use crate::movie::{CandidateMovie, ExternalId};
use crate::prng::Seed;
use crate::salt::{Salt, SaltTable};
use crate::shuffle::seeded_shuffle;
use crate::window::LookbackWindow;

/// Result of picking a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassicPick {
    pub date: NaiveDate,
    pub movie: CandidateMovie,
    /// Repeat avoidance removed every candidate; the full pool was used.
    pub exhausted: bool,
}

impl ClassicPick {
    pub fn assignment(&self) -> ClassicAssignment {
        ClassicAssignment {
            date: self.date,
            movie: self.movie.external_id,
        }
    }
}

/// Output of a multi-day run.
#[derive(Debug, Clone, Default)]
pub struct ClassicPlan {
    /// Newly computed assignments, ascending by date.
    pub assignments: Vec<ClassicAssignment>,
    /// Days where the pool-exhaustion fallback fired.
    pub exhausted: Vec<NaiveDate>,
    /// Days left alone because they were already assigned.
    pub skipped: usize,
    /// Window state after the last day.
    pub window: LookbackWindow,
}

#[derive(Debug, Clone)]
pub struct ClassicScheduler<'a> {
    pool: &'a [CandidateMovie],
    salt: Seed,
    exhaustion_limit: Option<usize>,
}

impl<'a> ClassicScheduler<'a> {
    /// `pool` must already be the ordered eligible pool.
    pub fn new(pool: &'a [CandidateMovie], salts: &SaltTable) -> Self {
        Self {
            pool,
            salt: salts.get(Salt::Classic),
            exhaustion_limit: None,
        }
    }

    /// Abort a run once more than `limit` days hit pool exhaustion.
    pub fn with_exhaustion_limit(mut self, limit: Option<usize>) -> Self {
        self.exhaustion_limit = limit;
        self
    }

    pub fn seed_for(&self, date: NaiveDate) -> Seed {
        date_to_seed(date) + self.salt
    }

    /// Pick for `date` given the movies to avoid.
    pub fn pick(&self, date: NaiveDate, used: &HashSet<ExternalId>) -> Result<ClassicPick, ScheduleError> {
        let filtered: Vec<CandidateMovie> = self
            .pool
            .iter()
            .filter(|m| !used.contains(&m.external_id))
            .cloned()
            .collect();

        let exhausted = filtered.is_empty();
        let candidates: &[CandidateMovie] = if exhausted { self.pool } else { &filtered };

        let movie = seeded_shuffle(candidates, self.seed_for(date))
            .into_iter()
            .next()
            .ok_or(ScheduleError::EmptyPool(date))?;

        Ok(ClassicPick { date, movie, exhausted })
    }

    /// Seeded pick that ignores history entirely.
    pub fn pick_unconditioned(&self, date: NaiveDate) -> Result<ClassicPick, ScheduleError> {
        self.pick(date, &HashSet::new())
    }

    /// Pick one day and return the window for the next.
    pub fn step(&self, date: NaiveDate, window: LookbackWindow) -> Result<(ClassicPick, LookbackWindow), ScheduleError> {
        let used = window.used_near(date);
        let pick = self.pick(date, &used)?;
        if pick.exhausted {
            warn!(
                date = %format_date(date),
                lookback = window.lookback(),
                pool = self.pool.len(),
                "classic pool exhausted, reusing movies (increase lookback headroom or add movies)"
            );
        }
        let window = window.record(date, pick.movie.external_id);
        Ok((pick, window))
    }

    /// Fill every unassigned day of `span`.
    ///
    /// `existing` should hold persisted assignments from at least
    /// `span.start - lookback` through `span.end + lookback`.
    pub fn schedule(
        &self,
        span: DateSpan,
        existing: &[ClassicAssignment],
        lookback: u32,
    ) -> Result<ClassicPlan, ScheduleError> {
        let assigned: HashSet<NaiveDate> = existing.iter().map(|a| a.date).collect();
        let mut window = LookbackWindow::from_assignments(lookback, existing);
        let mut plan = ClassicPlan::default();

        for date in span.days() {
            if assigned.contains(&date) {
                plan.skipped += 1;
                window = window.advance_past(date);
                continue;
            }

            let (pick, next) = self.step(date, window)?;
            window = next;
            debug!(date = %format_date(date), movie = pick.movie.external_id, "classic pick");

            if pick.exhausted {
                plan.exhausted.push(date);
                if let Some(limit) = self.exhaustion_limit {
                    if plan.exhausted.len() > limit {
                        return Err(ScheduleError::ExhaustionLimit {
                            exhausted: plan.exhausted.len(),
                            limit,
                        });
                    }
                }
            }
            plan.assignments.push(pick.assignment());
        }

        plan.window = window;
        Ok(plan)
    }
}
