//! Accrual schedule generation.
//!
//! Dates roll backward from maturity in whole coupon periods, leaving any
//! short stub at the front. A front stub shorter than [`MIN_STUB_DAYS`] is
//! merged into the first full period.

use meridian_core::calendars::{BusinessDayConvention, Calendar, HolidayCalendar};
use meridian_core::types::{Date, Frequency};

use crate::error::{ProductError, ProductResult};

/// Shortest front stub kept as its own period.
pub const MIN_STUB_DAYS: i64 = 7;

/// Adjusted dates of one accrual period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualDates {
    /// Accrual start.
    pub start: Date,
    /// Accrual end.
    pub end: Date,
    /// Payment date.
    pub pay: Date,
}

/// Schedule definition for one leg.
#[derive(Debug, Clone)]
pub struct Schedule {
    effective: Date,
    maturity: Date,
    frequency: Frequency,
    convention: BusinessDayConvention,
    pay_lag_days: u32,
    calendar: HolidayCalendar,
}

impl Schedule {
    /// Creates a schedule with Modified Following rolls and no pay lag.
    #[must_use]
    pub fn new(effective: Date, maturity: Date, frequency: Frequency) -> Self {
        Self {
            effective,
            maturity,
            frequency,
            convention: BusinessDayConvention::ModifiedFollowing,
            pay_lag_days: 0,
            calendar: HolidayCalendar::default(),
        }
    }

    /// Sets the roll convention.
    #[must_use]
    pub fn with_convention(mut self, convention: BusinessDayConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Sets the business-day lag from accrual end to payment.
    #[must_use]
    pub fn with_pay_lag(mut self, days: u32) -> Self {
        self.pay_lag_days = days;
        self
    }

    /// Sets the holiday calendar used for rolls.
    #[must_use]
    pub fn with_calendar(mut self, calendar: HolidayCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Unadjusted period boundaries, effective first.
    pub fn unadjusted_dates(&self) -> ProductResult<Vec<Date>> {
        if self.effective >= self.maturity {
            return Err(ProductError::date_ordering(format!(
                "effective {} is not before maturity {}",
                self.effective, self.maturity
            )));
        }

        let step = self.frequency.months_per_period() as i32;
        let mut dates = vec![self.maturity];
        if step > 0 {
            let mut k = 1;
            loop {
                let date = self.maturity.add_months(-step * k)?;
                if date <= self.effective {
                    break;
                }
                dates.push(date);
                k += 1;
            }
        }

        if let Some(&first) = dates.last() {
            if dates.len() > 1 && self.effective.days_between(&first) < MIN_STUB_DAYS {
                dates.pop();
            }
        }
        dates.push(self.effective);
        dates.reverse();
        Ok(dates)
    }

    /// Adjusted accrual periods.
    pub fn periods(&self) -> ProductResult<Vec<AccrualDates>> {
        let adjusted: Vec<Date> = self
            .unadjusted_dates()?
            .into_iter()
            .map(|d| self.calendar.adjust(d, self.convention))
            .collect();

        adjusted
            .windows(2)
            .map(|pair| {
                let (start, end) = (pair[0], pair[1]);
                if start >= end {
                    return Err(ProductError::date_ordering(format!(
                        "adjusted accrual {start} to {end} collapses"
                    )));
                }
                let pay = self
                    .calendar
                    .add_business_days(end, self.pay_lag_days as i32);
                Ok(AccrualDates { start, end, pay })
            })
            .collect()
    }
}
