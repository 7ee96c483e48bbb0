//! Calendar arithmetic and time sources
//!
//! Installment schedules are expressed in calendar dates. This module provides:
//! - Month arithmetic that clamps to the last valid day of the target month
//! - Inclusive date ranges used for "upcoming" windows
//! - A `Clock` abstraction so services can be driven by a fixed time in tests

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Date out of range: {0}")]
    OutOfRange(String),
}

/// Advances a date by a number of calendar months
///
/// When the day of month does not exist in the target month the result is
/// clamped to that month's last day, so Jan 31 + 1 month is Feb 28 (or 29).
///
/// # Errors
///
/// Returns `TemporalError::OutOfRange` if the result overflows chrono's range
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, TemporalError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| TemporalError::OutOfRange(format!("{} + {} months", date, months)))
}

/// Represents an inclusive range of calendar dates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Creates the window `[start, start + days]`
    pub fn starting_at(start: NaiveDate, days: u32) -> Result<Self, TemporalError> {
        let end = start
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| TemporalError::OutOfRange(format!("{} + {} days", start, days)))?;
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Source of the current time
///
/// Services read "now" through this trait rather than calling `Utc::now()`
/// directly, which keeps due-date classification deterministic under test.
pub trait Clock: Send + Sync {
    /// Returns the current instant
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current calendar date (UTC)
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Creates a clock frozen at midday UTC of the given date
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
