use crate::error::LedgerError;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The calendar day on which each contribution period begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaxYearStartParts")]
pub struct TaxYearStart {
    day: u32,
    month: u32,
}

#[derive(Deserialize)]
struct TaxYearStartParts {
    day: u32,
    month: u32,
}

impl TryFrom<TaxYearStartParts> for TaxYearStart {
    type Error = LedgerError;

    fn try_from(parts: TaxYearStartParts) -> Result<Self, Self::Error> {
        Self::new(parts.day, parts.month)
    }
}

impl TaxYearStart {
    /// 6 April, the start of the UK tax year.
    pub const UK: TaxYearStart = TaxYearStart { day: 6, month: 4 };

    /// 29 February is accepted and falls back to 28 February in common years.
    pub fn new(day: u32, month: u32) -> Result<Self, LedgerError> {
        // 2024 is a leap year, so every real day/month pair exists in it.
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            return Err(LedgerError::InvalidTaxYearStart { day, month });
        }
        Ok(Self { day, month })
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn in_year(&self, year: i32) -> DateTime<Utc> {
        let midnight = NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.month, self.day - 1))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Utc.from_utc_datetime(&midnight)
    }

    /// Midnight UTC of the most recent period start on or before `now`.
    pub fn period_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let this_year = self.in_year(now.year());
        if this_year <= now {
            this_year
        } else {
            self.in_year(now.year() - 1)
        }
    }

    /// Midnight UTC of the period start following the one containing `now`.
    pub fn next_period_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.period_start(now);
        self.in_year(start.year() + 1)
    }
}

impl Default for TaxYearStart {
    fn default() -> Self {
        Self::UK
    }
}

impl fmt::Display for TaxYearStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.day, self.month)
    }
}

/// Parses `DD-MM`, e.g. `06-04` for 6 April.
impl FromStr for TaxYearStart {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidTaxYearStart { day: 0, month: 0 };
        let (day, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let day = day.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(day, month)
    }
}
