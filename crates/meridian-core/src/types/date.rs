//! Calendar date for accrual and discounting.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Excel/Lotus serial day zero (1899-12-30).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// A calendar date.
///
/// Newtype over `chrono::NaiveDate`; every period boundary, pay date and curve
/// node in Meridian is a `Date`.
///
/// ```rust
/// use meridian_core::types::Date;
///
/// let date = Date::from_ymd(2025, 1, 31).unwrap();
/// assert_eq!(date.add_months(1).unwrap(), Date::from_ymd(2025, 2, 28).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Earliest representable date.
    pub const MIN: Date = Date(NaiveDate::MIN);

    /// Creates a new date from year, month and day.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the date does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}-{day:02}")))
    }

    /// Parses an ISO 8601 date (YYYY-MM-DD).
    pub fn parse(s: &str) -> CoreResult<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Date)
            .map_err(|_| CoreError::invalid_date(format!("Cannot parse: {s}")))
    }

    /// Returns the year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Checks if the year is a leap year.
    #[must_use]
    pub fn is_leap_year(&self) -> bool {
        self.0.leap_year()
    }

    /// Returns the number of days in the date's month.
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year(), self.month())
    }

    /// Returns the number of days in the date's year.
    #[must_use]
    pub fn days_in_year(&self) -> u32 {
        if self.is_leap_year() {
            366
        } else {
            365
        }
    }

    /// Adds a (possibly negative) number of calendar days.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        Date(self.0 + chrono::Duration::days(days))
    }

    /// Adds a number of months, clamping the day to the end of the target month.
    pub fn add_months(&self, months: i32) -> CoreResult<Self> {
        let total_months = self.year() * 12 + self.month() as i32 - 1 + months;
        let new_year = total_months.div_euclid(12);
        let new_month = (total_months.rem_euclid(12) + 1) as u32;
        let new_day = self.day().min(days_in_month(new_year, new_month));

        Self::from_ymd(new_year, new_month, new_day)
    }

    /// Adds a number of years, clamping 29 February where needed.
    pub fn add_years(&self, years: i32) -> CoreResult<Self> {
        self.add_months(years * 12)
    }

    /// Calendar days from `self` to `other` (negative if `other` is earlier).
    #[must_use]
    pub fn days_between(&self, other: &Date) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Serial day number counted from 1899-12-30.
    ///
    /// Used wherever a date has to travel through an `f64` measure map.
    #[must_use]
    pub fn serial(&self) -> i64 {
        let (y, m, d) = SERIAL_EPOCH;
        let epoch = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
        (self.0 - epoch).num_days()
    }

    /// Returns the underlying `NaiveDate`.
    #[must_use]
    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the last calendar day of the date's month.
    #[must_use]
    pub fn end_of_month(&self) -> Self {
        let last = days_in_month(self.year(), self.month());
        Date(self.0.with_day(last).unwrap_or(self.0))
    }

    /// Checks if the date is the last day of its month.
    #[must_use]
    pub fn is_end_of_month(&self) -> bool {
        self.day() == self.days_in_month()
    }

    /// Returns the day of week.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Checks if the date falls on a Saturday or Sunday.
    #[must_use]
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Number of days in a given month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        2 => 28,
        _ => 31,
    }
}
