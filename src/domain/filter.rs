use super::validation::{FieldErrors, Validation};
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

/// Creation-time window for a transaction query. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl TransactionFilter {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// The window must be ordered and span at most one calendar year.
    pub fn validate(&self) -> Validation {
        let mut errors = FieldErrors::default();

        if self.start_date > self.end_date {
            errors.insert("start_date", "Start date must come before the End date");
        }

        let too_long = match self.start_date.checked_add_months(Months::new(12)) {
            Some(limit) => self.end_date > limit,
            None => true,
        };
        if too_long {
            errors.insert(
                "end_date",
                "End date cannot be more than a year after start date",
            );
        }

        errors.into()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }
}
