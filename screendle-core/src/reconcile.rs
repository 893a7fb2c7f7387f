//! Batch reconciliation: compute what the horizon is missing, never touch
//! what is already persisted.
//!
//! Re-running over the same horizon and store state yields the same plan, and
//! after a commit it yields an empty one, so a failed run is simply re-run.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assignment::{ClassicAssignment, ScalesRound};
use crate::classic::{ClassicPlan, ClassicScheduler};
use crate::date::{DateSpan, format_date};
use crate::error::ScheduleError;
use crate::salt::{SHUFFLE_SPAN, SaltTable};
use crate::scales::{ScalesPlan, ScalesScheduler};
use crate::store::{AssignmentStore, PoolProvider};

pub const DEFAULT_HORIZON_DAYS: u32 = 60;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub start: NaiveDate,
    pub days: u32,
    pub lookback: u32,
}

impl Horizon {
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start,
            days: DEFAULT_HORIZON_DAYS,
            lookback: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn with_lookback(mut self, lookback: u32) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn span(&self) -> DateSpan {
        DateSpan::starting(self.start, self.days)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub horizon: Horizon,
    pub salts: SaltTable,
    /// Abort once more than this many Classic days hit pool exhaustion.
    pub max_exhausted_days: Option<usize>,
}

impl BatchOptions {
    pub fn new(horizon: Horizon) -> Self {
        Self {
            horizon,
            salts: SaltTable::default(),
            max_exhausted_days: None,
        }
    }
}

/// Everything a batch run computed, before it is written anywhere.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub span: DateSpan,
    pub lookback: u32,
    pub eligible: usize,
    pub classic: ClassicPlan,
    pub scales: ScalesPlan,
}

impl BatchPlan {
    pub fn is_empty(&self) -> bool {
        self.classic.assignments.is_empty() && self.scales.rounds.is_empty()
    }

    pub fn classic_assignments(&self) -> &[ClassicAssignment] {
        &self.classic.assignments
    }

    pub fn scales_rounds(&self) -> &[ScalesRound] {
        &self.scales.rounds
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub classic_written: usize,
    pub classic_ignored: usize,
    pub scales_written: usize,
    pub scales_ignored: usize,
}

/// Read the store and compute every missing assignment in the horizon.
pub fn plan_batch<S>(store: &S, options: &BatchOptions) -> Result<BatchPlan>
where
    S: AssignmentStore + PoolProvider + ?Sized,
{
    options.salts.validate()?;
    let horizon = options.horizon;
    if horizon.days == 0 {
        return Err(ScheduleError::InvalidHorizon("days must be at least 1".to_string()).into());
    }
    let span = horizon.span();

    let pool = store.eligible_pool().context("reading eligible pool")?;
    if pool.len() as i64 > SHUFFLE_SPAN {
        warn!(pool = pool.len(), "pool larger than the salt spacing; shuffle seeds may overlap");
    }

    // Scales needs 20 movies on every day; check before computing anything.
    let scales = ScalesScheduler::new(&pool, &options.salts);
    scales.check_pool()?;

    let classic_history = store
        .classic_in(span.with_lookback(horizon.lookback).with_lookahead(horizon.lookback))
        .context("reading classic assignments")?;
    let scales_history = store.scales_in(span).context("reading scales rounds")?;

    let classic_plan = ClassicScheduler::new(&pool, &options.salts)
        .with_exhaustion_limit(options.max_exhausted_days)
        .schedule(span, &classic_history, horizon.lookback)?;
    let scales_plan = scales.schedule(span, &scales_history)?;

    info!(
        start = %format_date(span.start),
        end = %format_date(span.end),
        lookback = horizon.lookback,
        eligible = pool.len(),
        classic_existing = classic_plan.skipped,
        scales_existing = scales_plan.skipped,
        classic_new = classic_plan.assignments.len(),
        scales_new_days = scales_plan.days_scheduled,
        scales_new_rounds = scales_plan.rounds.len(),
        exhausted = classic_plan.exhausted.len(),
        "batch planned"
    );

    Ok(BatchPlan {
        span,
        lookback: horizon.lookback,
        eligible: pool.len(),
        classic: classic_plan,
        scales: scales_plan,
    })
}

/// Write a plan with insert-if-absent semantics.
pub fn commit<S>(store: &mut S, plan: &BatchPlan) -> Result<CommitSummary>
where
    S: AssignmentStore + ?Sized,
{
    let mut summary = CommitSummary::default();
    for a in plan.classic_assignments() {
        let written = store
            .insert_classic(*a)
            .with_context(|| format!("writing classic {}", format_date(a.date)))?;
        if written {
            summary.classic_written += 1;
        } else {
            summary.classic_ignored += 1;
        }
    }
    for r in plan.scales_rounds() {
        let written = store
            .insert_scales(*r)
            .with_context(|| format!("writing scales {} round {}", format_date(r.date), r.round))?;
        if written {
            summary.scales_written += 1;
        } else {
            summary.scales_ignored += 1;
        }
    }
    info!(
        classic = summary.classic_written,
        scales = summary.scales_written,
        ignored = summary.classic_ignored + summary.scales_ignored,
        "batch committed"
    );
    Ok(summary)
}

/// Plan and commit in one go.
pub fn run_batch<S>(store: &mut S, options: &BatchOptions) -> Result<(BatchPlan, CommitSummary)>
where
    S: AssignmentStore + PoolProvider + ?Sized,
{
    let plan = plan_batch(store, options)?;
    let summary = commit(store, &plan)?;
    Ok((plan, summary))
}
