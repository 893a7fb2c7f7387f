//! Scheduled content records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::movie::ExternalId;

/// The Classic target for one day. At most one per date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicAssignment {
    pub date: NaiveDate,
    pub movie: ExternalId,
}

/// One Scales round. `round` is 1 (widest rating gap) through 10 (narrowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalesRound {
    pub date: NaiveDate,
    pub round: u8,
    pub movie_a: ExternalId,
    pub movie_b: ExternalId,
}

impl ScalesRound {
    pub fn key(&self) -> (NaiveDate, u8) {
        (self.date, self.round)
    }
}
