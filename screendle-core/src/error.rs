use chrono::NaiveDate;
use thiserror::Error;

/// Fatal scheduling conditions. Per-day Classic pool exhaustion is not here:
/// it degrades to allowing repeats and is reported on the plan instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("only {available} rated movies, need at least {required} for Scales")]
    InsufficientPool { available: usize, required: usize },
    #[error("pool exhausted on {exhausted} days (limit {limit}); increase the catalog or shorten the lookback")]
    ExhaustionLimit { exhausted: usize, limit: usize },
    #[error("salt ranges overlap: {first} ({first_value}) and {second} ({second_value})")]
    SaltCollision {
        first: &'static str,
        first_value: i64,
        second: &'static str,
        second_value: i64,
    },
    #[error("invalid horizon: {0}")]
    InvalidHorizon(String),
    #[error("no movie could be chosen for {0}")]
    EmptyPool(NaiveDate),
}
