//! Curve sensitivities of stream measures.
//!
//! Dirty PV is `sum(N dcf df(pay) r) / df(cash)`, so each live period
//! contributes `N dcf (r d df + df d r)` before the row is moved to the cash
//! settle date. The rate term only moves with the funding
//! curve when the coupon is projected off it; periods on a separate forward
//! curve, and periods whose coupon is already known, contribute through the
//! discount factor alone.
//!
//! A period whose curve Jacobian cannot be produced is skipped and logged at
//! debug level, unless [`PricerParams::strict_jacobians`] is set.

use log::debug;

use meridian_core::types::Date;
use meridian_curves::{DiscountCurve, ForwardCurve, MarketParams, WengertJacobian};

use super::generic::GenericStream;
use crate::error::{ensure_live, nonzero, ProductError, ProductResult};
use crate::period::metrics::{fixing_or_forward, IndexInterval};
use crate::period::{CompoundingMethod, CouponMetrics, Period};
use crate::params::{PricerParams, ValuationParams};

/// Sensitivities of one contributing period.
struct PeriodSensitivity {
    /// `notional * dcf`
    weight: f64,
    df: f64,
    rate: f64,
    d_df: WengertJacobian,
    d_rate: Option<WengertJacobian>,
}

impl GenericStream {
    /// `d DirtyPV / d measure` against the funding curve, a `1 x N` row.
    pub fn jack_d_dirty_pv_d_manifest_measure(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        let sensitivities = self.period_sensitivities(valuation, pricer, market, measure)?;
        let mut jack = WengertJacobian::zeros(1, sensitivities[0].d_df.cols());
        let mut undiscounted = 0.0;
        for s in &sensitivities {
            undiscounted += s.weight * s.df * s.rate;
            jack.accumulate_scaled(&s.d_df, s.weight * s.rate)?;
            if let Some(d_rate) = &s.d_rate {
                jack.accumulate_scaled(d_rate, s.weight * s.df)?;
            }
        }
        self.cash_settled_jacobian(&jack, undiscounted, valuation, market, measure)
    }

    /// Moves `d V / d measure` of an undiscounted value `V` to the cash settle
    /// date: `d (V / df(cash)) = (dV - V / df(cash) d df(cash)) / df(cash)`.
    pub(crate) fn cash_settled_jacobian(
        &self,
        jack: &WengertJacobian,
        undiscounted: f64,
        valuation: &ValuationParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        let cash_df = self.cash_settle_df(valuation, market)?;
        let d_cash = self
            .funding_curve(market)?
            .jack_d_df_d_manifest_measure(self.cash_settle_date(valuation), measure)
            .ok_or_else(|| ProductError::JacobianUnavailable {
                measure: measure.to_string(),
            })?;
        if d_cash.cols() != jack.cols() {
            return Err(ProductError::JacobianDimensionMismatch {
                expected: jack.cols(),
                got: d_cash.cols(),
            });
        }
        let mut settled = jack.scaled(1.0 / cash_df);
        settled.accumulate_scaled(&d_cash, -undiscounted / (cash_df * cash_df))?;
        Ok(settled)
    }

    /// `d measure_name / d measure` for a quoted stream measure.
    ///
    /// Rate-style names give the par-rate Jacobian
    /// `sum(N dcf / A ((r - par) d df + df d r))` with annuity
    /// `A = sum(N dcf df)`. PV-style names give the dirty PV Jacobian.
    pub fn manifest_measure_df_micro_jack(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        measure_name: &str,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        match measure_name.to_ascii_uppercase().as_str() {
            "RATE" | "SWAPRATE" | "PARRATE" | "FAIRPREMIUM" => {
                let sensitivities = self.period_sensitivities(valuation, pricer, market, measure)?;
                let annuity = nonzero(
                    sensitivities.iter().map(|s| s.weight * s.df).sum(),
                    "stream annuity",
                )?;
                let par = sensitivities.iter().map(|s| s.weight * s.df * s.rate).sum::<f64>() / annuity;

                let mut jack = WengertJacobian::zeros(1, sensitivities[0].d_df.cols());
                for s in &sensitivities {
                    jack.accumulate_scaled(&s.d_df, s.weight * (s.rate - par) / annuity)?;
                    if let Some(d_rate) = &s.d_rate {
                        jack.accumulate_scaled(d_rate, s.weight * s.df / annuity)?;
                    }
                }
                Ok(jack)
            }
            "PV" | "DIRTYPV" => self.jack_d_dirty_pv_d_manifest_measure(valuation, pricer, market, measure),
            _ => Err(ProductError::UnknownMeasure {
                name: measure_name.to_string(),
            }),
        }
    }

    /// `d DirtyPV / d measure` against the stream's forward curve.
    ///
    /// Only floating periods that still project off a registered forward
    /// curve contribute.
    pub fn jack_d_dirty_pv_d_forward_manifest_measure(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.maturity())?;
        let unavailable = || ProductError::JacobianUnavailable {
            measure: measure.to_string(),
        };
        let index = self.index().ok_or_else(unavailable)?;
        let label = index.label();
        let forward_curve = market.forward_curve(&label).ok_or_else(unavailable)?;
        let funding = self.funding_curve(market)?;

        let mut jack: Option<WengertJacobian> = None;
        for period in self.periods().iter().filter(|p| p.start() >= value_date) {
            match self.forward_contribution(period, value_date, market, funding, forward_curve, measure) {
                Ok(Some(row)) => accumulate_row(&mut jack, &row)?,
                Ok(None) => {}
                Err(err) if !pricer.strict_jacobians => skip_period(period, measure, &err),
                Err(err) => return Err(err),
            }
        }
        let jack = jack.ok_or_else(unavailable)?;
        Ok(jack.scaled(1.0 / self.cash_settle_df(valuation, market)?))
    }

    /// `N dcf df d r / d q` of one period, `None` once the coupon is known.
    fn forward_contribution(
        &self,
        period: &Period,
        value_date: Date,
        market: &MarketParams,
        funding: &dyn DiscountCurve,
        forward_curve: &dyn ForwardCurve,
        measure: &str,
    ) -> ProductResult<Option<WengertJacobian>> {
        let metrics = period.coupon_metrics(value_date, market, funding)?;
        if metrics.known {
            return Ok(None);
        }
        let d_rate = index_rate_jacobian(period, &metrics, value_date, market, |interval| {
            Some((
                forward_curve.forward(interval.end).ok()?,
                forward_curve.jack_d_forward_d_manifest_measure(interval.end, measure)?,
            ))
        })
        .ok_or_else(|| ProductError::JacobianUnavailable {
            measure: measure.to_string(),
        })?;
        let weight = self.period_notional(period)? * period.dcf() * funding.df(period.pay())?;
        Ok(Some(d_rate.scaled(weight)))
    }

    /// Per-period discount and rate sensitivities of the live periods.
    fn period_sensitivities(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<Vec<PeriodSensitivity>> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.maturity())?;
        let funding = self.funding_curve(market)?;

        let mut sensitivities: Vec<PeriodSensitivity> = Vec::new();
        for period in self.periods().iter().filter(|p| p.start() >= value_date) {
            match self.period_sensitivity(period, value_date, market, funding, measure) {
                Ok(s) => {
                    let expected = sensitivities.first().map_or(s.d_df.cols(), |f| f.d_df.cols());
                    check_width(expected, &s)?;
                    sensitivities.push(s);
                }
                Err(err) if !pricer.strict_jacobians => skip_period(period, measure, &err),
                Err(err) => return Err(err),
            }
        }

        if sensitivities.is_empty() {
            return Err(ProductError::JacobianUnavailable {
                measure: measure.to_string(),
            });
        }
        Ok(sensitivities)
    }

    fn period_sensitivity(
        &self,
        period: &Period,
        value_date: Date,
        market: &MarketParams,
        funding: &dyn DiscountCurve,
        measure: &str,
    ) -> ProductResult<PeriodSensitivity> {
        let unavailable = || ProductError::JacobianUnavailable {
            measure: measure.to_string(),
        };
        let metrics = period.coupon_metrics(value_date, market, funding)?;
        let d_df = funding
            .jack_d_df_d_manifest_measure(period.pay(), measure)
            .ok_or_else(unavailable)?;
        let d_rate = if metrics.single_curve && !metrics.known {
            let d_rate = index_rate_jacobian(period, &metrics, value_date, market, |interval| {
                Some((
                    funding.libor_with_dcf(interval.start, interval.end, interval.tau).ok()?,
                    funding.jack_d_forward_d_manifest_measure(interval.start, interval.end, measure, interval.tau)?,
                ))
            })
            .ok_or_else(unavailable)?;
            Some(d_rate)
        } else {
            None
        };

        Ok(PeriodSensitivity {
            weight: self.period_notional(period)? * period.dcf(),
            df: funding.df(period.pay())?,
            rate: metrics.coupon_rate,
            d_df,
            d_rate,
        })
    }
}

/// `d index_rate / d measure` of a floating period from per-observation
/// forwards and their Jacobians. Fixed observations contribute nothing.
///
/// Arithmetic averaging weights each observation by `tau_j / tau`; geometric
/// compounding additionally by `growth / (1 + F_j tau_j)`.
fn index_rate_jacobian(
    period: &Period,
    metrics: &CouponMetrics,
    value_date: Date,
    market: &MarketParams,
    forward: impl Fn(&IndexInterval) -> Option<(f64, WengertJacobian)>,
) -> Option<WengertJacobian> {
    let index = period.index()?;
    let label = index.label();
    let intervals = period.index_intervals(index).ok()?;
    let tau_total: f64 = intervals.iter().map(|i| i.tau).sum();
    if tau_total <= 0.0 {
        return None;
    }
    let geometric = matches!(period.compounding().map(|c| c.method), Some(CompoundingMethod::Geometric));
    let growth = 1.0 + metrics.geometric_index_rate * tau_total;

    let mut jack: Option<WengertJacobian> = None;
    for interval in &intervals {
        if fixing_or_forward(index, &label, interval.fixing, value_date, market)
            .ok()?
            .is_some()
        {
            continue;
        }
        let (rate, d_rate) = forward(interval)?;
        let mut weight = interval.tau / tau_total;
        if geometric {
            weight *= growth / (1.0 + rate * interval.tau);
        }
        jack = Some(match jack.take() {
            Some(mut j) => {
                j.accumulate_scaled(&d_rate, weight).ok()?;
                j
            }
            None => d_rate.scaled(weight),
        });
    }
    jack
}

fn check_width(expected: usize, s: &PeriodSensitivity) -> ProductResult<()> {
    let widths = std::iter::once(s.d_df.cols()).chain(s.d_rate.as_ref().map(WengertJacobian::cols));
    for got in widths {
        if got != expected {
            return Err(ProductError::JacobianDimensionMismatch { expected, got });
        }
    }
    Ok(())
}

fn accumulate_row(jack: &mut Option<WengertJacobian>, row: &WengertJacobian) -> ProductResult<()> {
    match jack {
        Some(j) if j.cols() != row.cols() => Err(ProductError::JacobianDimensionMismatch {
            expected: j.cols(),
            got: row.cols(),
        }),
        Some(j) => Ok(j.accumulate_scaled(row, 1.0)?),
        None => {
            *jack = Some(row.clone());
            Ok(())
        }
    }
}

fn skip_period(period: &Period, measure: &str, err: &ProductError) {
    debug!(
        "skipping period {} to {} in {} jacobian: {}",
        period.start(),
        period.end(),
        measure,
        err
    );
}
