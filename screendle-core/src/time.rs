//! Run-date resolution: which calendar day is "today" for the game.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::date::add_days;

/// Calendar day of `now` in an IANA timezone like "America/Chicago".
pub fn today_in(tz: &str, now: DateTime<Utc>) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(now.with_timezone(&tz).date_naive())
}

/// Default horizon start: the day after the run date.
pub fn tomorrow_in(tz: &str, now: DateTime<Utc>) -> Result<NaiveDate> {
    Ok(add_days(today_in(tz, now)?, 1))
}
