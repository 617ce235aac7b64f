//! Valuation, pricer, quoting and cash-settlement parameters.

use serde::{Deserialize, Serialize};

use meridian_core::calendars::{BusinessDayConvention, Calendar, WeekendCalendar};
use meridian_core::types::Date;

/// Dates of one valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationParams {
    /// Date as of which measures are computed.
    pub value_date: Date,
    /// Date cash settles when the stream carries no cash-settle parameters.
    pub cash_pay_date: Date,
}

impl ValuationParams {
    /// Creates valuation params with an explicit cash pay date.
    #[must_use]
    pub fn new(value_date: Date, cash_pay_date: Date) -> Self {
        Self {
            value_date,
            cash_pay_date,
        }
    }

    /// Cash settles on the value date.
    #[must_use]
    pub fn spot(value_date: Date) -> Self {
        Self::new(value_date, value_date)
    }
}

/// Pricer switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricerParams {
    /// When false every convexity multiplier is forced to one.
    pub apply_convexity: bool,
    /// When true a period without a curve Jacobian fails the whole Jacobian
    /// instead of being skipped.
    pub strict_jacobians: bool,
}

impl Default for PricerParams {
    fn default() -> Self {
        Self {
            apply_convexity: true,
            strict_jacobians: false,
        }
    }
}

/// Quoting conventions for price-style measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotingParams {
    /// Par price (100 for percent-of-par quoting).
    pub price_scale: f64,
}

impl Default for QuotingParams {
    fn default() -> Self {
        Self { price_scale: 100.0 }
    }
}

/// Cash settlement lag carried by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashSettleParams {
    /// Business days from the value date to settlement.
    pub lag_days: u32,
    /// Roll applied to the settlement date.
    pub convention: BusinessDayConvention,
}

impl CashSettleParams {
    /// Creates cash-settle params.
    #[must_use]
    pub fn new(lag_days: u32, convention: BusinessDayConvention) -> Self {
        Self {
            lag_days,
            convention,
        }
    }

    /// Settlement date for a valuation on `value_date`.
    #[must_use]
    pub fn settle_date(&self, value_date: Date) -> Date {
        let calendar = WeekendCalendar;
        let lagged = calendar.add_business_days(value_date, self.lag_days as i32);
        calendar.adjust(lagged, self.convention)
    }
}

impl Default for CashSettleParams {
    fn default() -> Self {
        Self::new(0, BusinessDayConvention::Following)
    }
}
