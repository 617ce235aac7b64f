//! Actual-day conventions.

use rust_decimal::Decimal;

use super::DayCount;
use crate::types::Date;

/// Actual/360: actual days over a 360-day year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act360;

impl DayCount for Act360 {
    fn name(&self) -> &'static str {
        "ACT/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(360)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

/// Actual/365 Fixed: actual days over a 365-day year, leap years ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act365Fixed;

impl DayCount for Act365Fixed {
    fn name(&self) -> &'static str {
        "ACT/365F"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(365)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

/// Actual/Actual ISDA.
///
/// Days falling in leap years count over 366, the rest over 365.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActActIsda;

impl DayCount for ActActIsda {
    fn name(&self) -> &'static str {
        "ACT/ACT ISDA"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        if start > end {
            return -self.year_fraction(end, start);
        }

        let mut total = Decimal::ZERO;
        let mut current = start;
        while current.year() < end.year() {
            let Ok(next_year) = Date::from_ymd(current.year() + 1, 1, 1) else {
                break;
            };
            let days = current.days_between(&next_year);
            total += Decimal::from(days) / Decimal::from(current.days_in_year());
            current = next_year;
        }
        total += Decimal::from(current.days_between(&end)) / Decimal::from(current.days_in_year());
        total
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}
