//! Business day calendars and roll conventions.
//!
//! Calendars decide which days are business days. Streams use them to
//! roll schedule dates and to derive the cash settlement date from the
//! valuation date.

use std::collections::BTreeSet;

mod conventions;

pub use conventions::BusinessDayConvention;

use crate::types::Date;

/// Trait for business day calendars.
pub trait Calendar: Send + Sync {
    /// Returns the name of the calendar.
    fn name(&self) -> &str;

    /// Returns true if the date is a business day.
    fn is_business_day(&self, date: Date) -> bool;

    /// Returns true if the date is a holiday or weekend.
    fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Adjusts a date according to the given business day convention.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> Date {
        conventions::adjust(date, convention, self)
    }

    /// Advances a date by a number of business days (negative goes back).
    fn add_business_days(&self, date: Date, days: i32) -> Date {
        let mut result = date;
        let mut remaining = days.abs();
        let direction: i64 = if days >= 0 { 1 } else { -1 };

        while remaining > 0 {
            result = result.add_days(direction);
            if self.is_business_day(result) {
                remaining -= 1;
            }
        }

        result
    }

    /// Counts business days in `(start, end]`.
    fn business_days_between(&self, start: Date, end: Date) -> i32 {
        let mut count = 0;
        let mut current = start.add_days(1);

        while current <= end {
            if self.is_business_day(current) {
                count += 1;
            }
            current = current.add_days(1);
        }

        count
    }
}

/// A weekend-only calendar (no holidays).
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendCalendar;

impl Calendar for WeekendCalendar {
    fn name(&self) -> &str {
        "Weekend Only"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend()
    }
}

/// Weekend calendar with an explicit holiday list.
///
/// Holiday lists are usually loaded from configuration rather than
/// computed from observance rules.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    name: String,
    holidays: BTreeSet<Date>,
}

impl HolidayCalendar {
    /// Creates a calendar from a list of holiday dates.
    pub fn new(name: impl Into<String>, holidays: impl IntoIterator<Item = Date>) -> Self {
        Self {
            name: name.into(),
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Adds a holiday.
    pub fn add_holiday(&mut self, date: Date) {
        self.holidays.insert(date);
    }

    /// Number of explicit holidays.
    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }
}

impl Calendar for HolidayCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !self.holidays.contains(&date)
    }
}
