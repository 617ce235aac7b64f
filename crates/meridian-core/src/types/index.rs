//! Floating rate indices (SOFR, EURIBOR, SONIA, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Currency, Date, Tenor};
use crate::calendars::{Calendar, WeekendCalendar};
use crate::daycounts::DayCountConvention;

/// A floating rate index a stream can reference.
///
/// The [`label`](FloatingRateIndex::label) identifies the index's forward
/// curve, fixings and volatility inside a market bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloatingRateIndex {
    /// Index family name (e.g. "SOFR", "EURIBOR").
    pub name: String,
    /// Currency of the index.
    pub currency: Currency,
    /// Index tenor.
    pub tenor: Tenor,
    /// Accrual day count of the index.
    pub day_count: DayCountConvention,
    /// Business days between the fixing and the accrual start.
    pub fixing_lag: u32,
}

impl FloatingRateIndex {
    /// Creates a new index.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        currency: Currency,
        tenor: Tenor,
        day_count: DayCountConvention,
        fixing_lag: u32,
    ) -> Self {
        Self {
            name: name.into(),
            currency,
            tenor,
            day_count,
            fixing_lag,
        }
    }

    /// 3M term SOFR.
    #[must_use]
    pub fn sofr_3m() -> Self {
        Self::new("SOFR", Currency::USD, Tenor::months(3), DayCountConvention::Act360, 2)
    }

    /// 1M term SOFR.
    #[must_use]
    pub fn sofr_1m() -> Self {
        Self::new("SOFR", Currency::USD, Tenor::months(1), DayCountConvention::Act360, 2)
    }

    /// 6M EURIBOR.
    #[must_use]
    pub fn euribor_6m() -> Self {
        Self::new("EURIBOR", Currency::EUR, Tenor::months(6), DayCountConvention::Act360, 2)
    }

    /// Fully qualified label, e.g. `USD-SOFR-3M`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}-{}", self.currency, self.name, self.tenor)
    }

    /// Fixing date for an accrual period starting on `accrual_start`.
    #[must_use]
    pub fn fixing_date(&self, accrual_start: Date) -> Date {
        WeekendCalendar.add_business_days(accrual_start, -(self.fixing_lag as i32))
    }
}

impl fmt::Display for FloatingRateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
