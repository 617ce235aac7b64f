//! Per-period coupon projection.

use meridian_core::types::{Date, FloatingRateIndex};
use meridian_curves::{DiscountCurve, MarketParams};

use super::{CompoundingMethod, CouponSpec, Period};
use crate::error::{ProductError, ProductResult};

/// Coupon rates of one period as seen on a value date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CouponMetrics {
    /// Full coupon rate: index rate plus spread, or the fixed coupon.
    pub coupon_rate: f64,
    /// Index rate excluding spread (the fixed coupon for fixed periods).
    pub index_rate: f64,
    /// Arithmetic average of the sub-period index rates.
    pub arithmetic_index_rate: f64,
    /// Geometrically compounded sub-period index rates.
    pub geometric_index_rate: f64,
    /// True when the rate no longer depends on any curve.
    pub known: bool,
    /// True when forwards were projected off the funding curve.
    pub single_curve: bool,
}

impl CouponMetrics {
    fn fixed(rate: f64) -> Self {
        Self {
            coupon_rate: rate,
            index_rate: rate,
            arithmetic_index_rate: rate,
            geometric_index_rate: rate,
            known: true,
            single_curve: false,
        }
    }
}

impl Period {
    /// Projects the period coupon as of `value_date`.
    ///
    /// Sub-periods whose fixing date is before the value date take the
    /// market fixing and fail with `MissingFixing` without one. Later
    /// sub-periods read the index forward curve, or the funding curve when
    /// no forward curve is registered for the index.
    pub fn coupon_metrics(
        &self,
        value_date: Date,
        market: &MarketParams,
        funding: &dyn DiscountCurve,
    ) -> ProductResult<CouponMetrics> {
        let (index, spread) = match self.coupon() {
            CouponSpec::Fixed { rate } => return Ok(CouponMetrics::fixed(*rate)),
            CouponSpec::Floating { index, spread } => (index, *spread),
        };

        let label = index.label();
        let forward_curve = market.forward_curve(&label);

        let mut tau_total = 0.0;
        let mut arithmetic = 0.0;
        let mut growth = 1.0;
        let mut known = true;
        for interval in self.index_intervals(index)? {
            let IndexInterval { fixing, start, end, tau } = interval;
            let rate = match fixing_or_forward(index, &label, fixing, value_date, market)? {
                Some(fixing) => fixing,
                None => {
                    known = false;
                    match forward_curve {
                        Some(curve) => curve.forward(end)?,
                        None => funding.libor_with_dcf(start, end, tau)?,
                    }
                }
            };
            tau_total += tau;
            arithmetic += rate * tau;
            growth *= 1.0 + rate * tau;
        }

        if tau_total <= 0.0 {
            return Err(ProductError::domain(format!(
                "zero index accrual for period {} to {}",
                self.start(),
                self.end()
            )));
        }
        let arithmetic_index_rate = arithmetic / tau_total;
        let geometric_index_rate = (growth - 1.0) / tau_total;
        let index_rate = match self.compounding().map(|c| c.method) {
            Some(CompoundingMethod::Geometric) => geometric_index_rate,
            Some(CompoundingMethod::Arithmetic) | None => arithmetic_index_rate,
        };

        Ok(CouponMetrics {
            coupon_rate: index_rate + spread,
            index_rate,
            arithmetic_index_rate,
            geometric_index_rate,
            known,
            single_curve: forward_curve.is_none(),
        })
    }
}

/// One index observation inside a period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexInterval {
    pub fixing: Date,
    pub start: Date,
    pub end: Date,
    pub tau: f64,
}

impl Period {
    /// Index observations: the compounding sub-periods, or the whole period.
    ///
    /// The first observation fixes on the period reset date.
    pub(crate) fn index_intervals(&self, index: &FloatingRateIndex) -> ProductResult<Vec<IndexInterval>> {
        let bounds: Vec<(Date, Date)> = match self.compounding() {
            Some(c) => c.boundaries.windows(2).map(|w| (w[0], w[1])).collect(),
            None => vec![(self.start(), self.end())],
        };
        bounds
            .into_iter()
            .map(|(start, end)| {
                let fixing = if start == self.start() { self.reset() } else { index.fixing_date(start) };
                Ok(IndexInterval {
                    fixing,
                    start,
                    end,
                    tau: index.day_count.year_fraction_f64(start, end)?,
                })
            })
            .collect()
    }
}

/// The fixing for a sub-period if it has reset, `None` if it still projects.
pub(crate) fn fixing_or_forward(
    index: &FloatingRateIndex,
    label: &str,
    fixing_date: Date,
    value_date: Date,
    market: &MarketParams,
) -> ProductResult<Option<f64>> {
    let fixing = market.fixing(label, fixing_date);
    if fixing_date < value_date && fixing.is_none() {
        return Err(ProductError::MissingFixing {
            index: index.label(),
            date: fixing_date,
        });
    }
    Ok(if fixing_date <= value_date { fixing } else { None })
}
