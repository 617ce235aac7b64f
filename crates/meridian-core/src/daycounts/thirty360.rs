//! 30/360 conventions.

use rust_decimal::Decimal;

use super::DayCount;
use crate::types::Date;

#[inline]
fn is_last_day_of_february(date: Date) -> bool {
    date.month() == 2 && date.is_end_of_month()
}

fn thirty360_days(start: Date, end: Date, d1: i64, d2: i64) -> i64 {
    let years = i64::from(end.year()) - i64::from(start.year());
    let months = i64::from(end.month()) - i64::from(start.month());
    360 * years + 30 * months + (d2 - d1)
}

/// 30/360 US (bond basis).
///
/// 1. If D1 is the last day of February, D1 = 30
/// 2. If D1 is 31, D1 = 30
/// 3. If D2 is the last day of February and D1 was too, D2 = 30
/// 4. If D2 is 31 and D1 >= 30, D2 = 30
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360US;

impl DayCount for Thirty360US {
    fn name(&self) -> &'static str {
        "30/360 US"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(360)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let mut d1 = i64::from(start.day());
        let mut d2 = i64::from(end.day());
        let start_feb_eom = is_last_day_of_february(start);

        if start_feb_eom || d1 == 31 {
            d1 = 30;
        }
        if start_feb_eom && is_last_day_of_february(end) {
            d2 = 30;
        }
        if d2 == 31 && d1 >= 30 {
            d2 = 30;
        }
        thirty360_days(start, end, d1, d2)
    }
}

/// 30E/360 (Eurobond basis): day 31 becomes 30 on both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360E;

impl DayCount for Thirty360E {
    fn name(&self) -> &'static str {
        "30E/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(360)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let d1 = i64::from(start.day()).min(30);
        let d2 = i64::from(end.day()).min(30);
        thirty360_days(start, end, d1, d2)
    }
}
