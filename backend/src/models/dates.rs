//! Analysis date range validation.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Spans longer than this many days are accepted with a warning.
pub const LONG_RANGE_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    #[error("Start date is in the future, no satellite data available")]
    StartInFuture,
    #[error("End date is in the future, no satellite data available yet")]
    EndInFuture,
    #[error("End date must be after the start date")]
    EndBeforeStart,
}

/// Non-blocking remark about an otherwise valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateRangeWarning {
    LongRange { days: i64 },
}

impl DateRangeWarning {
    pub fn message(&self) -> String {
        match self {
            DateRangeWarning::LongRange { days } => {
                format!("Range is {} days, very long periods may be slow.", days)
            }
        }
    }
}

/// Inclusive analysis period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Validate against `today`; future dates and inverted ranges are errors.
    pub fn validate(&self, today: NaiveDate) -> Result<Option<DateRangeWarning>, DateRangeError> {
        if self.start > today {
            return Err(DateRangeError::StartInFuture);
        }
        if self.end > today {
            return Err(DateRangeError::EndInFuture);
        }
        if self.end < self.start {
            return Err(DateRangeError::EndBeforeStart);
        }
        let days = self.days();
        if days > LONG_RANGE_DAYS {
            return Ok(Some(DateRangeWarning::LongRange { days }));
        }
        Ok(None)
    }
}

/// Suggested end date: one calendar month after `start`, clamped to the
/// last day of that month (Jan 31 gives Feb 28/29).
pub fn suggest_end_date(start: NaiveDate) -> NaiveDate {
    start.checked_add_months(Months::new(1)).unwrap_or(start)
}
