//! Lookback window for Classic repeat avoidance.
//!
//! A value threaded through the per-day loop: each step consumes the window
//! and returns the updated one. The used-set for day D is every movie on
//! `[D - lookback, D + lookback]` other than D itself. Later days only hold
//! persisted assignments, so a gap-filling run cannot pick a movie that is
//! already scheduled a few days ahead.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use crate::assignment::ClassicAssignment;
use crate::date::{add_days, subtract_days};
use crate::movie::ExternalId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookbackWindow {
    lookback: u32,
    by_date: BTreeMap<NaiveDate, ExternalId>,
}

impl LookbackWindow {
    pub fn new(lookback: u32) -> Self {
        Self {
            lookback,
            by_date: BTreeMap::new(),
        }
    }

    /// Window pre-filled with persisted assignments.
    pub fn from_assignments<'a>(
        lookback: u32,
        assignments: impl IntoIterator<Item = &'a ClassicAssignment>,
    ) -> Self {
        let by_date = assignments.into_iter().map(|a| (a.date, a.movie)).collect();
        Self { lookback, by_date }
    }

    pub fn lookback(&self) -> u32 {
        self.lookback
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<ExternalId> {
        self.by_date.get(&date).copied()
    }

    /// Movies that may not be picked on `date`.
    pub fn used_near(&self, date: NaiveDate) -> HashSet<ExternalId> {
        if self.lookback == 0 {
            return HashSet::new();
        }
        let from = subtract_days(date, self.lookback as i64);
        let to = add_days(date, self.lookback as i64);
        self.by_date
            .range(from..=to)
            .filter(|(d, _)| **d != date)
            .map(|(_, id)| *id)
            .collect()
    }

    /// Record the pick for `date` and drop the entry that just aged out.
    pub fn record(mut self, date: NaiveDate, movie: ExternalId) -> Self {
        self.by_date.insert(date, movie);
        self.advance_past(date)
    }

    /// Move the cursor past `date` without a new pick, evicting entries on or
    /// before `date - lookback`.
    pub fn advance_past(mut self, date: NaiveDate) -> Self {
        let cutoff = subtract_days(date, self.lookback as i64);
        self.by_date = self.by_date.split_off(&cutoff.succ_opt().unwrap_or(cutoff));
        self
    }
}
