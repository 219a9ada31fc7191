//! Calendar month utilities for enrollment reporting
//!
//! Enrollment windows use calendar-month arithmetic rather than fixed day
//! counts, and the dashboard labels months as `"Jan"` and target dates as
//! `"YYYY-MM"`. This module keeps that arithmetic in one place.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};

/// A single calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    /// Create a month period, returning `None` for an invalid month number
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing `date`
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month number (1-12)
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month (inclusive)
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.offset(1)
            .start_date()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// Whether `date` falls inside this month
    #[must_use]
    pub fn contains(&self, date: &NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Shift by a signed number of months
    #[must_use]
    pub const fn offset(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Short month label used on trend charts, e.g. `"Jan"`
    #[must_use]
    pub fn short_label(&self) -> String {
        self.start_date().format("%b").to_string()
    }

    /// The trailing `count` months ending with (and including) `self`, oldest first
    #[must_use]
    pub fn trailing(&self, count: u32) -> Vec<Self> {
        (0..count)
            .rev()
            .map(|back| self.offset(-(back as i32)))
            .collect()
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid month format: {s}"))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| format!("Invalid year in: {s}"))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| format!("Invalid month in: {s}"))?;

        Self::new(year, month).ok_or_else(|| format!("Month out of range in: {s}"))
    }
}

/// Subtract calendar months, saturating at the earliest representable date
#[must_use]
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Add calendar months, saturating at the latest representable date
#[must_use]
pub fn months_after(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Serde helpers that write a date as `"YYYY-MM"`
pub mod year_month {
    use chrono::NaiveDate;
    use serde::Serializer;

    use super::MonthPeriod;

    /// Serialize a date as its `"YYYY-MM"` month key
    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&MonthPeriod::from_date(*date))
    }

    /// Optional variant of [`serialize`]
    pub mod option {
        use chrono::NaiveDate;
        use serde::Serializer;

        use super::MonthPeriod;

        /// Serialize an optional date as `"YYYY-MM"` or `null`
        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.collect_str(&MonthPeriod::from_date(*date)),
                None => serializer.serialize_none(),
            }
        }
    }
}
