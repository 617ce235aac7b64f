//! Day count conventions.
//!
//! A day count convention turns a pair of dates into an accrual fraction.
//! Fractions are computed exactly as `Decimal` and converted to `f64` at the
//! analytics boundary with [`DayCountConvention::year_fraction_f64`].
//!
//! # Supported Conventions
//!
//! - [`Act360`]: Actual/360, money market and floating legs
//! - [`Act365Fixed`]: Actual/365 Fixed, GBP markets and curve time
//! - [`ActActIsda`]: Actual/Actual ISDA, year-split fraction
//! - [`Thirty360US`]: 30/360 US bond basis with February rules
//! - [`Thirty360E`]: 30E/360 Eurobond basis

mod act;
mod thirty360;

pub use act::{Act360, Act365Fixed, ActActIsda};
pub use thirty360::{Thirty360E, Thirty360US};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Date;

/// Trait for day count conventions.
pub trait DayCount: Send + Sync {
    /// Market name of the convention (e.g. "ACT/360").
    fn name(&self) -> &'static str;

    /// Year fraction between two dates; negative if `end < start`.
    fn year_fraction(&self, start: Date, end: Date) -> Decimal;

    /// Day count between two dates according to the convention.
    fn day_count(&self, start: Date, end: Date) -> i64;
}

/// Runtime-selectable day count convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DayCountConvention {
    /// Actual/360
    #[default]
    Act360,
    /// Actual/365 Fixed
    Act365Fixed,
    /// Actual/Actual ISDA
    ActActIsda,
    /// 30/360 US (bond basis)
    Thirty360US,
    /// 30E/360 (Eurobond basis)
    Thirty360E,
}

impl DayCountConvention {
    /// Creates a boxed day count implementation.
    #[must_use]
    pub fn to_day_count(&self) -> Box<dyn DayCount> {
        match self {
            DayCountConvention::Act360 => Box::new(Act360),
            DayCountConvention::Act365Fixed => Box::new(Act365Fixed),
            DayCountConvention::ActActIsda => Box::new(ActActIsda),
            DayCountConvention::Thirty360US => Box::new(Thirty360US),
            DayCountConvention::Thirty360E => Box::new(Thirty360E),
        }
    }

    /// Market name of the convention.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::ActActIsda => "ACT/ACT ISDA",
            DayCountConvention::Thirty360US => "30/360 US",
            DayCountConvention::Thirty360E => "30E/360",
        }
    }

    /// Exact year fraction between two dates.
    #[must_use]
    pub fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        self.to_day_count().year_fraction(start, end)
    }

    /// Year fraction as `f64`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DayCountError` if the exact fraction cannot be
    /// represented as a finite `f64`.
    pub fn year_fraction_f64(&self, start: Date, end: Date) -> CoreResult<f64> {
        self.year_fraction(start, end)
            .to_f64()
            .filter(|dcf| dcf.is_finite())
            .ok_or_else(|| {
                CoreError::day_count(format!("{} fraction {start} to {end} not representable", self.name()))
            })
    }
}

impl std::fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DayCountConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['_', '-'], "/");
        match normalized.as_str() {
            "ACT/360" | "A/360" | "ACTUAL/360" => Ok(DayCountConvention::Act360),
            "ACT/365F" | "ACT/365" | "ACT/365 FIXED" | "A/365F" => Ok(DayCountConvention::Act365Fixed),
            "ACT/ACT" | "ACT/ACT ISDA" | "ACTUAL/ACTUAL" => Ok(DayCountConvention::ActActIsda),
            "30/360" | "30/360 US" | "BOND BASIS" => Ok(DayCountConvention::Thirty360US),
            "30E/360" | "EUROBOND BASIS" => Ok(DayCountConvention::Thirty360E),
            _ => Err(CoreError::day_count(format!("unknown day count convention: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conventions() {
        assert_eq!("act/360".parse::<DayCountConvention>().unwrap(), DayCountConvention::Act360);
        assert_eq!("30/360".parse::<DayCountConvention>().unwrap(), DayCountConvention::Thirty360US);
        assert_eq!("ACT-365F".parse::<DayCountConvention>().unwrap(), DayCountConvention::Act365Fixed);
        assert!("BUS/252".parse::<DayCountConvention>().is_err());
    }

    #[test]
    fn test_year_fraction_f64() {
        let start = Date::from_ymd(2025, 1, 1).unwrap();
        let end = Date::from_ymd(2025, 4, 1).unwrap();
        let dcf = DayCountConvention::Act360.year_fraction_f64(start, end).unwrap();
        assert!((dcf - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_names_match_display() {
        for dc in [
            DayCountConvention::Act360,
            DayCountConvention::Act365Fixed,
            DayCountConvention::ActActIsda,
            DayCountConvention::Thirty360US,
            DayCountConvention::Thirty360E,
        ] {
            assert_eq!(dc.to_string(), dc.to_day_count().name());
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn date(offset: i64) -> Date {
            Date::from_ymd(2020, 1, 1).unwrap().add_days(offset)
        }

        proptest! {
            #[test]
            fn actual_conventions_are_additive(a in 0i64..4000, b in 0i64..4000, c in 0i64..4000) {
                let mut days = [a, b, c];
                days.sort_unstable();
                let (start, mid, end) = (date(days[0]), date(days[1]), date(days[2]));
                for dc in [DayCountConvention::Act360, DayCountConvention::Act365Fixed] {
                    let whole = dc.year_fraction_f64(start, end).unwrap();
                    let split = dc.year_fraction_f64(start, mid).unwrap() + dc.year_fraction_f64(mid, end).unwrap();
                    prop_assert!((whole - split).abs() < 1e-12);
                }
            }

            #[test]
            fn forward_intervals_are_non_negative(a in 0i64..4000, len in 0i64..4000) {
                for dc in [
                    DayCountConvention::Act360,
                    DayCountConvention::Act365Fixed,
                    DayCountConvention::ActActIsda,
                    DayCountConvention::Thirty360US,
                    DayCountConvention::Thirty360E,
                ] {
                    prop_assert!(dc.year_fraction_f64(date(a), date(a + len)).unwrap() >= 0.0);
                }
            }
        }
    }
}
