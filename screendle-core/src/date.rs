//! Date/seed codec and calendar arithmetic.
//!
//! All arithmetic is on `NaiveDate` (proleptic Gregorian, no timezone), so a
//! schedule computed on one machine matches one computed anywhere else.

use anyhow::Result;
use chrono::{Datelike, Days, NaiveDate};

use crate::prng::Seed;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `2025-03-07` -> `20250307`.
pub fn date_to_seed(date: NaiveDate) -> Seed {
    date.year() as Seed * 10_000 + date.month() as Seed * 100 + date.day() as Seed
}

/// Offset by `n` days (negative walks backwards). Saturates at chrono's range.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    let step = Days::new(n.unsigned_abs());
    let moved = if n >= 0 {
        date.checked_add_days(step)
    } else {
        date.checked_sub_days(step)
    };
    moved.unwrap_or(if n >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

pub fn subtract_days(date: NaiveDate, n: i64) -> NaiveDate {
    add_days(date, -n)
}

/// Parse an ISO `YYYY-MM-DD` day.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| anyhow::anyhow!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// An inclusive run of consecutive days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    /// `days` consecutive days starting at `start`. Zero days gives an empty span.
    pub fn starting(start: NaiveDate, days: u32) -> Self {
        Self {
            start,
            end: add_days(start, days as i64 - 1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Widen the span backwards by `lookback` days.
    pub fn with_lookback(&self, lookback: u32) -> Self {
        Self {
            start: subtract_days(self.start, lookback as i64),
            end: self.end,
        }
    }

    /// Widen the span forwards by `lookahead` days.
    pub fn with_lookahead(&self, lookahead: u32) -> Self {
        Self {
            start: self.start,
            end: add_days(self.end, lookahead as i64),
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let len = self.len();
        self.start.iter_days().take(len)
    }
}
