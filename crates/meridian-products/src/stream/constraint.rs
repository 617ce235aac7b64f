//! Calibration constraints generated by a single stream.
//!
//! Weights are in spot-discounted units: a period contributes
//! `notional * clean dcf * df(pay)` per unit of rate. Components add the
//! targets that tie legs together.

use meridian_core::types::Date;
use meridian_curves::MarketParams;

use super::generic::{GenericStream, BP};
use crate::calibration::{discount_latent_state_prwc, BasisLeg, PredictorResponseWeightConstraint};
use crate::error::{ensure_live, ProductError, ProductResult};
use crate::params::ValuationParams;
use crate::period::Period;

/// Summed `CV100` of the accruing periods, plain and spread-weighted.
#[derive(Debug, Default, Clone, Copy)]
struct Cv100 {
    clean: f64,
    spread: f64,
}

impl GenericStream {
    /// Periods still accruing after the value date.
    fn accruing(&self, value_date: Date) -> impl Iterator<Item = &Period> {
        self.periods().iter().filter(move |p| p.end() > value_date)
    }

    fn latent_state_error(&self, state: &str) -> ProductError {
        ProductError::UnsupportedLatentState {
            component: format!("{} fixed stream", self.currency()),
            state: state.to_string(),
        }
    }

    /// Forward latent-state constraint of a floating leg quoted by a par
    /// basis spread.
    ///
    /// For the [`BasisLeg::Derived`] leg each period whose index has not
    /// reset predicts its forward at the period end date with weight
    /// `CV100 = clean dcf * df(pay) * notional`; reset periods move
    /// `-CV100 * fixing` into the target. The spread adds
    /// `-cleanCV100 * spread_bp * 1e-4` to the target. A
    /// [`BasisLeg::Reference`] leg carries no weights. Both record
    /// `d target / d <leg>ParBasisSpread`.
    pub fn forward_prwc(
        &self,
        valuation: &ValuationParams,
        market: &MarketParams,
        leg: BasisLeg,
        spread_bp: f64,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let (mut prwc, cv100) = self.forward_weights(valuation, market, leg)?;
        if leg == BasisLeg::Derived {
            prwc.update_value(-cv100.clean * spread_bp * BP);
        }
        prwc.update_d_value_d_manifest_measure(leg.spread_measure(), -cv100.clean * BP);
        Ok(prwc)
    }

    /// Forward latent-state constraint of a floating leg paying its own
    /// contractual spread.
    ///
    /// Same weights as the derived leg of [`GenericStream::forward_prwc`],
    /// with `-CV100 * spread` of every period in the target and no spread
    /// sensitivity.
    pub fn contractual_forward_prwc(
        &self,
        valuation: &ValuationParams,
        market: &MarketParams,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let (mut prwc, cv100) = self.forward_weights(valuation, market, BasisLeg::Derived)?;
        prwc.update_value(-cv100.spread);
        Ok(prwc)
    }

    fn forward_weights(
        &self,
        valuation: &ValuationParams,
        market: &MarketParams,
        leg: BasisLeg,
    ) -> ProductResult<(PredictorResponseWeightConstraint, Cv100)> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.maturity())?;
        if self.index().is_none() {
            return Err(self.latent_state_error("Forward"));
        }
        let funding = self.funding_curve(market)?;

        let mut prwc = PredictorResponseWeightConstraint::new();
        let mut total = Cv100::default();
        for period in self.accruing(value_date) {
            let cv100 = period.clean_dcf(value_date)? * funding.df(period.pay())? * self.period_notional(period)?;
            total.clean += cv100;
            total.spread += cv100 * period.spread();
            if leg == BasisLeg::Reference {
                continue;
            }
            let metrics = period.coupon_metrics(value_date, market, funding)?;
            if metrics.known {
                prwc.update_value(-cv100 * metrics.index_rate);
            } else {
                prwc.add_predictor_response_weight(period.end(), cv100);
            }
        }
        Ok((prwc, total))
    }

    /// Funding latent-state constraint of a leg whose coupons are known.
    ///
    /// Each accruing period puts `notional * clean dcf * rate` on its pay
    /// date. With `coupon_override` every period uses the quoted rate and
    /// `d weight / d Rate` is recorded.
    pub fn funding_prwc(
        &self,
        valuation: &ValuationParams,
        market: &MarketParams,
        coupon_override: Option<f64>,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.maturity())?;
        let funding = self.funding_curve(market)?;

        let mut prwc = PredictorResponseWeightConstraint::new();
        for period in self.accruing(value_date) {
            let accrual = self.period_notional(period)? * period.clean_dcf(value_date)?;
            let rate = match coupon_override {
                Some(rate) => {
                    prwc.add_d_weight_d_manifest_measure("Rate", period.pay(), accrual);
                    rate
                }
                None => period.coupon_metrics(value_date, market, funding)?.coupon_rate,
            };
            prwc.add_predictor_response_weight(period.pay(), accrual * rate);
        }
        Ok(prwc)
    }

    /// Funding latent-state constraint of a floating leg projected off the
    /// funding curve itself.
    ///
    /// `N dcf F df(pay) = N r (df(start) - df(end))` with
    /// `r = df(pay) / df(end)`, so an unreset period puts `+N r` on its start,
    /// `-N r` on its end and `N dcf spread` on its pay date. Reset periods put
    /// `N clean dcf (fixing + spread)` on the pay date.
    pub fn funding_forward_prwc(
        &self,
        valuation: &ValuationParams,
        market: &MarketParams,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.maturity())?;
        if self.index().is_none() {
            return Err(self.latent_state_error("Funding forward"));
        }
        let funding = self.funding_curve(market)?;

        let mut prwc = PredictorResponseWeightConstraint::new();
        for period in self.accruing(value_date) {
            let notional = self.period_notional(period)?;
            let metrics = period.coupon_metrics(value_date, market, funding)?;
            if metrics.known {
                prwc.add_predictor_response_weight(
                    period.pay(),
                    notional * period.clean_dcf(value_date)? * metrics.coupon_rate,
                );
                continue;
            }

            let ratio = if period.pay() == period.end() {
                1.0
            } else {
                funding.df(period.pay())? / funding.df(period.end())?
            };
            prwc.add_predictor_response_weight(period.start(), notional * ratio);
            prwc.add_predictor_response_weight(period.end(), -notional * ratio);
            prwc.add_predictor_response_weight(period.pay(), notional * period.dcf() * period.spread());
        }
        Ok(prwc)
    }

    /// Two-point discount-factor constraint of a single-period stream.
    pub fn discount_latent_state_prwc(
        &self,
        valuation: &ValuationParams,
        forward_df: f64,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        ensure_live(valuation.value_date, self.maturity())?;
        let [period] = self.periods() else {
            return Err(ProductError::invalid_stream(format!(
                "discount constraint needs one period, stream has {}",
                self.periods().len()
            )));
        };
        Ok(discount_latent_state_prwc(
            period.start(),
            period.end(),
            self.period_notional(period)?,
            forward_df,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::FactorSchedule;
    use approx::assert_relative_eq;
    use meridian_core::daycounts::DayCountConvention;
    use meridian_core::types::{Currency, FloatingRateIndex};
    use meridian_curves::ZeroNodeCurve;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn market() -> MarketParams {
        let curve = ZeroNodeCurve::flat(d(2025, 1, 2), Currency::USD, 0.04, &[d(2030, 1, 2)]).unwrap();
        MarketParams::new().with_funding_curve(Arc::new(curve))
    }

    fn floating(spread: f64) -> GenericStream {
        let index = FloatingRateIndex::sofr_3m();
        let periods = vec![
            Period::floating(d(2025, 1, 6), d(2025, 4, 7), d(2025, 4, 7), index.clone(), spread).unwrap(),
            Period::floating(d(2025, 4, 7), d(2025, 7, 7), d(2025, 7, 7), index, spread).unwrap(),
        ];
        GenericStream::new(Currency::USD, 1e6, periods, FactorSchedule::bullet()).unwrap()
    }

    #[test]
    fn test_funding_forward_prwc_reprices_single_curve_leg() {
        let market = market();
        let val = ValuationParams::spot(d(2025, 1, 2));
        let stream = floating(0.001);
        let prwc = stream.funding_forward_prwc(&val, &market).unwrap();

        let curve = market.funding_curve(Currency::USD).unwrap();
        let implied = prwc.evaluate(|date| curve.df(date)).unwrap() + prwc.value();
        let pv = stream
            .value(&val, &Default::default(), &market, &Default::default())
            .unwrap()
            .pv();
        assert_relative_eq!(implied, pv, max_relative = 1e-10);
    }

    #[test]
    fn test_forward_prwc_derived_leg() {
        let val = ValuationParams::spot(d(2025, 1, 2));
        let prwc = floating(0.0)
            .forward_prwc(&val, &market(), BasisLeg::Derived, 10.0)
            .unwrap();
        assert_eq!(prwc.predictor_weights().len(), 2);
        let clean_cv100: f64 = prwc.predictor_weights().values().sum();
        assert_relative_eq!(prwc.value(), -clean_cv100 * 10.0 * 1e-4, max_relative = 1e-12);
        assert_relative_eq!(
            prwc.d_value_d_manifest_measure("DerivedParBasisSpread").unwrap(),
            -clean_cv100 * 1e-4,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_forward_prwc_keys_weights_by_accrual_end() {
        let index = FloatingRateIndex::sofr_3m();
        let periods = vec![
            Period::floating(d(2025, 1, 6), d(2025, 4, 7), d(2025, 4, 9), index.clone(), 0.0).unwrap(),
            Period::floating(d(2025, 4, 7), d(2025, 7, 7), d(2025, 7, 9), index, 0.0).unwrap(),
        ];
        let stream = GenericStream::new(Currency::USD, 1e6, periods, FactorSchedule::bullet()).unwrap();
        let val = ValuationParams::spot(d(2025, 1, 2));
        let prwc = stream
            .forward_prwc(&val, &market(), BasisLeg::Derived, 0.0)
            .unwrap();
        let keys: Vec<Date> = prwc.predictor_weights().keys().copied().collect();
        assert_eq!(keys, vec![d(2025, 4, 7), d(2025, 7, 7)]);
    }

    #[test]
    fn test_contractual_forward_prwc_carries_no_spread_sensitivity() {
        let val = ValuationParams::spot(d(2025, 1, 2));
        let quoted = floating(0.0)
            .forward_prwc(&val, &market(), BasisLeg::Derived, 10.0)
            .unwrap();
        let contractual = floating(0.001).contractual_forward_prwc(&val, &market()).unwrap();

        assert_eq!(contractual.predictor_weights(), quoted.predictor_weights());
        assert_relative_eq!(contractual.value(), quoted.value(), max_relative = 1e-12);
        assert!(contractual.d_value_d_manifest_measure("DerivedParBasisSpread").is_none());
    }

    #[test]
    fn test_constraints_fail_closed_at_maturity() {
        let stream = floating(0.0);
        let market = market();
        for value_date in [d(2025, 7, 7), d(2025, 9, 1)] {
            let val = ValuationParams::spot(value_date);
            let expired = |result: ProductResult<PredictorResponseWeightConstraint>| {
                matches!(result, Err(ProductError::Expired { .. }))
            };
            assert!(expired(stream.forward_prwc(&val, &market, BasisLeg::Derived, 5.0)));
            assert!(expired(stream.forward_prwc(&val, &market, BasisLeg::Reference, 5.0)));
            assert!(expired(stream.contractual_forward_prwc(&val, &market)));
            assert!(expired(stream.funding_prwc(&val, &market, Some(0.04))));
            assert!(expired(stream.funding_forward_prwc(&val, &market)));
            assert!(expired(stream.discount_latent_state_prwc(&val, 0.99)));
        }
        // the day before maturity still constrains the last period
        let val = ValuationParams::spot(d(2025, 7, 6));
        let mut with_fixings = market.clone();
        let index = FloatingRateIndex::sofr_3m();
        with_fixings.add_fixing(index.label(), index.fixing_date(d(2025, 1, 6)), 0.043);
        with_fixings.add_fixing(index.label(), index.fixing_date(d(2025, 4, 7)), 0.042);
        assert!(stream.funding_forward_prwc(&val, &with_fixings).is_ok());
    }

    #[test]
    fn test_forward_prwc_reference_leg_has_no_weights() {
        let val = ValuationParams::spot(d(2025, 1, 2));
        let prwc = floating(0.0)
            .forward_prwc(&val, &market(), BasisLeg::Reference, 10.0)
            .unwrap();
        assert!(prwc.predictor_weights().is_empty());
        assert_eq!(prwc.value(), 0.0);
        assert!(prwc.d_value_d_manifest_measure("ReferenceParBasisSpread").unwrap() < 0.0);
    }

    #[test]
    fn test_forward_prwc_rejects_fixed_leg() {
        let periods = vec![Period::fixed(
            d(2025, 1, 2),
            d(2026, 1, 2),
            d(2026, 1, 2),
            DayCountConvention::Act360,
            0.04,
        )
        .unwrap()];
        let stream = GenericStream::new(Currency::USD, 1e6, periods, FactorSchedule::bullet()).unwrap();
        let err = stream
            .forward_prwc(&ValuationParams::spot(d(2025, 1, 2)), &market(), BasisLeg::Derived, 0.0)
            .unwrap_err();
        assert!(matches!(err, ProductError::UnsupportedLatentState { .. }));
    }

    #[test]
    fn test_funding_prwc_override_records_rate_sensitivity() {
        let periods = vec![Period::fixed(
            d(2025, 1, 2),
            d(2026, 1, 2),
            d(2026, 1, 2),
            DayCountConvention::Act360,
            0.04,
        )
        .unwrap()];
        let stream = GenericStream::new(Currency::USD, 1e6, periods, FactorSchedule::bullet()).unwrap();
        let val = ValuationParams::spot(d(2025, 1, 2));
        let prwc = stream.funding_prwc(&val, &market(), Some(0.05)).unwrap();
        let accrual = 1e6 * 365.0 / 360.0;
        assert_relative_eq!(prwc.weight(d(2026, 1, 2)), accrual * 0.05, max_relative = 1e-12);
        let dw = prwc.d_weight_d_manifest_measure("Rate").unwrap();
        assert_relative_eq!(dw[&d(2026, 1, 2)], accrual, max_relative = 1e-12);
    }

    #[test]
    fn test_discount_prwc_needs_single_period() {
        let val = ValuationParams::spot(d(2025, 1, 2));
        assert!(matches!(
            floating(0.0).discount_latent_state_prwc(&val, 0.99),
            Err(ProductError::InvalidStream { .. })
        ));
    }
}
