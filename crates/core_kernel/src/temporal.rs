//! Business-date handling types
//!
//! Losses and indemnification periods are expressed as calendar date spans,
//! inclusive on both ends. An open-ended span (no end date) covers
//! everything from its start onwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid span: start {start} must not be after end {end}")]
    InvalidSpan { start: NaiveDate, end: NaiveDate },
}

/// Returns the day after the given date.
///
/// Used by the calculator to resume a split period where the previous
/// sub-period left off.
pub fn day_after(date: NaiveDate) -> NaiveDate {
    date.succ_opt().expect("date overflow")
}

/// An inclusive calendar date span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    /// Start of the span (inclusive)
    pub start: NaiveDate,
    /// End of the span (inclusive), None means open-ended
    pub end: Option<NaiveDate>,
}

impl DateSpan {
    /// Creates a new span, rejecting an end date before the start date
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self, TemporalError> {
        if let Some(end) = end {
            if start > end {
                return Err(TemporalError::InvalidSpan { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Creates an open-ended span starting at the given date
    pub fn from(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    /// Creates a bounded span
    pub fn bounded(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        Self::new(start, Some(end))
    }

    /// Returns true if this span has no end date
    pub fn is_open_ended(&self) -> bool {
        self.end.is_none()
    }

    /// Returns true if this span contains the given date
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }

    /// Returns true if this span overlaps with another
    pub fn overlaps(&self, other: &DateSpan) -> bool {
        let self_end = self.end.unwrap_or(NaiveDate::MAX);
        let other_end = other.end.unwrap_or(NaiveDate::MAX);

        self.start <= other_end && other.start <= self_end
    }

    /// Number of days in the span, counting both ends, if bounded
    pub fn day_count(&self) -> Option<i64> {
        self.end
            .map(|end| end.signed_duration_since(self.start).num_days() + 1)
    }
}
