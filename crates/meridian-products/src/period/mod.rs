//! Accrual periods.
//!
//! A [`Period`] is one coupon interval of a stream: its dates, accrual
//! fraction, notional factor and coupon definition. Per-period coupon
//! projection lives in [`metrics`] and convexity multipliers in
//! [`convexity`].

pub mod convexity;
pub mod metrics;

pub use convexity::ConvexityMultipliers;
pub use metrics::CouponMetrics;

use serde::{Deserialize, Serialize};

use meridian_core::daycounts::DayCountConvention;
use meridian_core::types::{Date, FloatingRateIndex, Frequency};

use crate::error::{ProductError, ProductResult};

/// Coupon definition of a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CouponSpec {
    /// Known coupon rate.
    Fixed {
        /// Annualized coupon rate.
        rate: f64,
    },
    /// Index rate plus spread.
    Floating {
        /// Index the coupon resets on.
        index: FloatingRateIndex,
        /// Spread over the index rate (decimal).
        spread: f64,
    },
}

/// How index rates of sub-periods combine into the period rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompoundingMethod {
    /// `sum(F_j tau_j) / tau`
    Arithmetic,
    /// `(prod(1 + F_j tau_j) - 1) / tau`
    Geometric,
}

/// Sub-period compounding of a floating period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPeriodCompounding {
    /// Combination rule.
    pub method: CompoundingMethod,
    /// Sub-period boundaries, period start first and period end last.
    pub boundaries: Vec<Date>,
}

/// One accrual period of a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    start: Date,
    end: Date,
    pay: Date,
    reset: Date,
    dcf: f64,
    day_count: DayCountConvention,
    factor: f64,
    coupon: CouponSpec,
    compounding: Option<SubPeriodCompounding>,
}

impl Period {
    /// Creates a period.
    ///
    /// Requires `start < end <= pay` and `reset <= end`.
    pub fn new(
        start: Date,
        end: Date,
        pay: Date,
        reset: Date,
        day_count: DayCountConvention,
        coupon: CouponSpec,
    ) -> ProductResult<Self> {
        if start >= end {
            return Err(ProductError::date_ordering(format!("period start {start} is not before end {end}")));
        }
        if pay < end {
            return Err(ProductError::date_ordering(format!("pay date {pay} precedes period end {end}")));
        }
        if reset > end {
            return Err(ProductError::date_ordering(format!("reset {reset} is after period end {end}")));
        }
        let dcf = day_count.year_fraction_f64(start, end)?;
        Ok(Self {
            start,
            end,
            pay,
            reset,
            dcf,
            day_count,
            factor: 1.0,
            coupon,
            compounding: None,
        })
    }

    /// Fixed-coupon period paying on `pay`, resetting at `start`.
    pub fn fixed(start: Date, end: Date, pay: Date, day_count: DayCountConvention, rate: f64) -> ProductResult<Self> {
        Self::new(start, end, pay, start, day_count, CouponSpec::Fixed { rate })
    }

    /// Floating period resetting on the index fixing date for `start`.
    pub fn floating(
        start: Date,
        end: Date,
        pay: Date,
        index: FloatingRateIndex,
        spread: f64,
    ) -> ProductResult<Self> {
        let reset = index.fixing_date(start);
        let day_count = index.day_count;
        Self::new(start, end, pay, reset, day_count, CouponSpec::Floating { index, spread })
    }

    /// Sets the notional factor.
    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Compounds the index over sub-periods of `frequency`.
    pub fn with_compounding(mut self, method: CompoundingMethod, frequency: Frequency) -> ProductResult<Self> {
        let step = frequency.months_per_period() as i32;
        let mut boundaries = vec![self.start];
        if step > 0 {
            let mut k = 1;
            loop {
                let next = self.start.add_months(step * k)?;
                if next >= self.end {
                    break;
                }
                boundaries.push(next);
                k += 1;
            }
        }
        boundaries.push(self.end);
        self.compounding = Some(SubPeriodCompounding { method, boundaries });
        Ok(self)
    }

    /// Replaces the coupon, keeping dates and factor.
    #[must_use]
    pub fn with_coupon(mut self, coupon: CouponSpec) -> Self {
        self.coupon = coupon;
        self
    }

    /// Accrual start.
    #[must_use]
    pub fn start(&self) -> Date {
        self.start
    }

    /// Accrual end.
    #[must_use]
    pub fn end(&self) -> Date {
        self.end
    }

    /// Payment date.
    #[must_use]
    pub fn pay(&self) -> Date {
        self.pay
    }

    /// Reset (fixing) date.
    #[must_use]
    pub fn reset(&self) -> Date {
        self.reset
    }

    /// Accrual fraction of the full period.
    #[must_use]
    pub fn dcf(&self) -> f64 {
        self.dcf
    }

    /// Accrual day count.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// Notional factor.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Coupon definition.
    #[must_use]
    pub fn coupon(&self) -> &CouponSpec {
        &self.coupon
    }

    /// Sub-period compounding, if any.
    #[must_use]
    pub fn compounding(&self) -> Option<&SubPeriodCompounding> {
        self.compounding.as_ref()
    }

    /// Index of a floating period.
    #[must_use]
    pub fn index(&self) -> Option<&FloatingRateIndex> {
        match &self.coupon {
            CouponSpec::Floating { index, .. } => Some(index),
            CouponSpec::Fixed { .. } => None,
        }
    }

    /// True for floating periods.
    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self.coupon, CouponSpec::Floating { .. })
    }

    /// Spread of a floating period, zero for fixed.
    #[must_use]
    pub fn spread(&self) -> f64 {
        match self.coupon {
            CouponSpec::Floating { spread, .. } => spread,
            CouponSpec::Fixed { .. } => 0.0,
        }
    }

    /// True if `date` falls in `[start, end)`.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }

    /// Accrual fraction elapsed from start to `date`, capped at the period end.
    pub fn accrual_dcf(&self, date: Date) -> ProductResult<f64> {
        if date <= self.start {
            return Ok(0.0);
        }
        let to = if date < self.end { date } else { self.end };
        Ok(self.day_count.year_fraction_f64(self.start, to)?)
    }

    /// Accrual fraction still to run after `value_date`.
    pub fn clean_dcf(&self, value_date: Date) -> ProductResult<f64> {
        Ok(self.dcf - self.accrual_dcf(value_date)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_date_ordering() {
        let dc = DayCountConvention::Act360;
        assert!(Period::fixed(d(2025, 1, 1), d(2025, 7, 1), d(2025, 7, 1), dc, 0.03).is_ok());
        assert!(matches!(
            Period::fixed(d(2025, 7, 1), d(2025, 7, 1), d(2025, 7, 1), dc, 0.03),
            Err(ProductError::InvalidDateOrdering { .. })
        ));
        assert!(Period::fixed(d(2025, 1, 1), d(2025, 7, 1), d(2025, 6, 30), dc, 0.03).is_err());
        assert!(Period::new(
            d(2025, 1, 1),
            d(2025, 7, 1),
            d(2025, 7, 1),
            d(2025, 7, 2),
            dc,
            CouponSpec::Fixed { rate: 0.03 }
        )
        .is_err());
    }

    #[test]
    fn test_accrual() {
        let p = Period::fixed(d(2025, 1, 1), d(2025, 7, 1), d(2025, 7, 1), DayCountConvention::Act360, 0.03).unwrap();
        assert_relative_eq!(p.dcf(), 181.0 / 360.0);
        assert_eq!(p.accrual_dcf(d(2024, 12, 1)).unwrap(), 0.0);
        assert_relative_eq!(p.accrual_dcf(d(2025, 2, 1)).unwrap(), 31.0 / 360.0);
        assert_relative_eq!(p.accrual_dcf(d(2025, 9, 1)).unwrap(), p.dcf());
        assert_relative_eq!(p.clean_dcf(d(2025, 2, 1)).unwrap(), 150.0 / 360.0);
        assert!(p.contains(d(2025, 1, 1)));
        assert!(!p.contains(d(2025, 7, 1)));
    }

    #[test]
    fn test_floating_reset() {
        let p = Period::floating(d(2025, 1, 6), d(2025, 4, 7), d(2025, 4, 7), FloatingRateIndex::sofr_3m(), 0.001)
            .unwrap();
        assert_eq!(p.reset(), d(2025, 1, 2));
        assert!(p.is_floating());
        assert_eq!(p.spread(), 0.001);
        assert_eq!(p.index().unwrap().label(), "USD-SOFR-3M");
    }

    #[test]
    fn test_sub_period_boundaries() {
        let p = Period::floating(d(2025, 1, 6), d(2025, 7, 6), d(2025, 7, 7), FloatingRateIndex::sofr_1m(), 0.0)
            .unwrap()
            .with_compounding(CompoundingMethod::Geometric, Frequency::Monthly)
            .unwrap();
        let c = p.compounding().unwrap();
        assert_eq!(c.boundaries.first(), Some(&d(2025, 1, 6)));
        assert_eq!(c.boundaries.last(), Some(&d(2025, 7, 6)));
        assert_eq!(c.boundaries.len(), 7);
    }
}
