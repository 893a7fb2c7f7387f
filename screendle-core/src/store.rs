//! Boundaries to the catalog and the assignment store.
//!
//! The scheduler reads before it writes and does no locking of its own;
//! only one batch run may target a store at a time.

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::assignment::{ClassicAssignment, ScalesRound};
use crate::date::DateSpan;
use crate::movie::{CandidateMovie, eligible_pool};

/// Supplies rated movies in a stable order.
pub trait PoolProvider {
    fn eligible_pool(&self) -> Result<Vec<CandidateMovie>>;
}

/// Persisted schedule.
pub trait AssignmentStore {
    /// Classic assignments with `span.start <= date <= span.end`.
    fn classic_in(&self, span: DateSpan) -> Result<Vec<ClassicAssignment>>;

    /// Scales rounds with `span.start <= date <= span.end`.
    fn scales_in(&self, span: DateSpan) -> Result<Vec<ScalesRound>>;

    /// Insert unless the date already has a pick. Returns whether it was written.
    fn insert_classic(&mut self, assignment: ClassicAssignment) -> Result<bool>;

    /// Insert unless (date, round) already exists. Returns whether it was written.
    fn insert_scales(&mut self, round: ScalesRound) -> Result<bool>;
}

/// Catalog and schedule held in memory. Used by tests and as the body of
/// file-backed stores.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub catalog: Vec<CandidateMovie>,
    pub classic: BTreeMap<NaiveDate, ClassicAssignment>,
    pub scales: BTreeMap<(NaiveDate, u8), ScalesRound>,
}

impl MemoryStore {
    pub fn new(catalog: Vec<CandidateMovie>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn with_classic(mut self, assignments: impl IntoIterator<Item = ClassicAssignment>) -> Self {
        for a in assignments {
            self.classic.entry(a.date).or_insert(a);
        }
        self
    }

    pub fn with_scales(mut self, rounds: impl IntoIterator<Item = ScalesRound>) -> Self {
        for r in rounds {
            self.scales.entry(r.key()).or_insert(r);
        }
        self
    }
}

impl PoolProvider for MemoryStore {
    fn eligible_pool(&self) -> Result<Vec<CandidateMovie>> {
        Ok(eligible_pool(&self.catalog))
    }
}

impl AssignmentStore for MemoryStore {
    fn classic_in(&self, span: DateSpan) -> Result<Vec<ClassicAssignment>> {
        if span.is_empty() {
            return Ok(vec![]);
        }
        Ok(self.classic.range(span.start..=span.end).map(|(_, a)| *a).collect())
    }

    fn scales_in(&self, span: DateSpan) -> Result<Vec<ScalesRound>> {
        if span.is_empty() {
            return Ok(vec![]);
        }
        Ok(self
            .scales
            .range((span.start, 0)..=(span.end, u8::MAX))
            .map(|(_, r)| *r)
            .collect())
    }

    fn insert_classic(&mut self, assignment: ClassicAssignment) -> Result<bool> {
        if self.classic.contains_key(&assignment.date) {
            return Ok(false);
        }
        self.classic.insert(assignment.date, assignment);
        Ok(true)
    }

    fn insert_scales(&mut self, round: ScalesRound) -> Result<bool> {
        if self.scales.contains_key(&round.key()) {
            return Ok(false);
        }
        self.scales.insert(round.key(), round);
        Ok(true)
    }
}
