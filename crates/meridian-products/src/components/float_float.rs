//! Floating-versus-floating basis swap.

use serde::{Deserialize, Serialize};

use meridian_core::types::{Currency, Date};
use meridian_curves::{MarketParams, WengertJacobian};

use super::{combine_leg_jacobians, ensure_same_currency, logged, Component};
use crate::calibration::{BasisLeg, LatentState, PredictorResponseWeightConstraint, ProductQuoteSet, Quote, QuoteKind};
use crate::error::{ensure_live, nonzero, ProductError, ProductResult};
use crate::measures::{StreamMeasures, ValueMap};
use crate::params::{PricerParams, QuotingParams, ValuationParams};
use crate::stream::{FloatingStream, Stream};

/// Par basis spread in basis points: `-(reference + derived clean PV) / clean DV01`.
pub fn par_basis_spread(reference_clean_pv: f64, derived_clean_pv: f64, clean_dv01: f64) -> ProductResult<f64> {
    let dv01 = nonzero(clean_dv01, "basis leg clean DV01")?;
    Ok(-(reference_clean_pv + derived_clean_pv) / dv01)
}

/// Two floating legs on different indices; the spread is solved on the
/// derived leg against the reference leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatFloatComponent {
    name: String,
    reference: FloatingStream,
    derived: FloatingStream,
}

/// Net and per-leg measures of a basis swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisSwapMeasures {
    /// Reference leg measures.
    pub reference: StreamMeasures,
    /// Derived leg measures.
    pub derived: StreamMeasures,
    /// Net clean PV over the derived leg clean DV01 (bp).
    pub reference_par_basis_spread: f64,
    /// Net clean PV over the reference leg clean DV01 (bp).
    pub derived_par_basis_spread: f64,
}

impl BasisSwapMeasures {
    /// Net dirty PV.
    #[must_use]
    pub fn pv(&self) -> f64 {
        self.reference.pv() + self.derived.pv()
    }

    /// Net clean PV.
    #[must_use]
    pub fn clean_pv(&self) -> f64 {
        self.reference.clean_pv() + self.derived.clean_pv()
    }

    /// Flattens to named measures; leg measures carry a `Reference`/`Derived` prefix.
    #[must_use]
    pub fn to_value_map(&self) -> ValueMap {
        let mut map = ValueMap::new();
        map.insert("PV", self.pv());
        map.insert("DirtyPV", self.pv());
        map.insert("CleanPV", self.clean_pv());
        map.insert("Accrued", self.reference.accrued + self.derived.accrued);
        map.insert("ReferenceParBasisSpread", self.reference_par_basis_spread);
        map.insert("DerivedParBasisSpread", self.derived_par_basis_spread);
        map.insert("CalcTime", self.reference.calc_time + self.derived.calc_time);
        map.extend_prefixed("Reference", &self.reference.to_value_map());
        map.extend_prefixed("Derived", &self.derived.to_value_map());
        map
    }
}

impl FloatFloatComponent {
    /// Creates a basis swap; both legs must be in the same currency.
    pub fn new(name: impl Into<String>, reference: FloatingStream, derived: FloatingStream) -> ProductResult<Self> {
        let name = name.into();
        ensure_same_currency(&name, reference.currency(), derived.currency())?;
        Ok(Self {
            name,
            reference,
            derived,
        })
    }

    /// Reference leg.
    #[must_use]
    pub fn reference_leg(&self) -> &FloatingStream {
        &self.reference
    }

    /// Derived leg.
    #[must_use]
    pub fn derived_leg(&self) -> &FloatingStream {
        &self.derived
    }

    /// Values both legs and derives the par basis spreads.
    pub fn value(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
    ) -> ProductResult<BasisSwapMeasures> {
        let reference = self.reference.value(valuation, pricer, market, quoting)?;
        let derived = self.derived.value(valuation, pricer, market, quoting)?;
        let reference_par_basis_spread =
            par_basis_spread(reference.clean_pv(), derived.clean_pv(), derived.clean_dv01())?;
        let derived_par_basis_spread =
            par_basis_spread(reference.clean_pv(), derived.clean_pv(), reference.clean_dv01())?;
        Ok(BasisSwapMeasures {
            reference,
            derived,
            reference_par_basis_spread,
            derived_par_basis_spread,
        })
    }

    /// Forward constraint on the derived index.
    ///
    /// The quoted spread replaces the coupon spread of the leg it is quoted
    /// on. Derived forwards are weighted by their CV100 and the target is
    /// `-reference clean PV * df(cash) - derived cleanCV100 * spread`.
    fn forward_prwc(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let quote = quotes.select(&[QuoteKind::ParBasisSpread], &self.name)?;
        let Quote::ParBasisSpread { leg, spread_bp } = quote else {
            return Err(ProductError::quote_mismatch(&self.name, "expected a par basis spread"));
        };

        let (reference, derived_spread_bp) = match leg {
            BasisLeg::Derived => (self.reference.clone(), spread_bp),
            BasisLeg::Reference => (self.reference.with_spread(spread_bp * 0.0001), self.derived.spread() * 10_000.0),
        };
        let cash_df = self.reference.generic().cash_settle_df(valuation, market)?;
        let reference_clean_pv = reference.value(valuation, pricer, market, quoting)?.clean_pv();

        let mut prwc = self
            .derived
            .generic()
            .forward_prwc(valuation, market, BasisLeg::Derived, derived_spread_bp)?;
        prwc.absorb(&reference.generic().forward_prwc(
            valuation,
            market,
            BasisLeg::Reference,
            reference.spread() * 10_000.0,
        )?);
        prwc.update_value(-reference_clean_pv * cash_df);
        Ok(prwc)
    }
}

impl Component for FloatFloatComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn currency(&self) -> Currency {
        self.reference.currency()
    }

    fn effective(&self) -> Date {
        self.reference.effective().min(self.derived.effective())
    }

    fn maturity(&self) -> Date {
        self.reference.maturity().max(self.derived.maturity())
    }

    fn initial_notional(&self) -> f64 {
        self.reference.initial_notional()
    }

    fn value_map(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
    ) -> ProductResult<ValueMap> {
        logged(
            &self.name,
            "valuation",
            self.value(valuation, pricer, market, quoting)
                .map(|m| m.to_value_map()),
        )
    }

    fn jack_d_dirty_pv_d_manifest_measure(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        let reference = self
            .reference
            .jack_d_dirty_pv_d_manifest_measure(valuation, pricer, market, measure)?;
        let derived = self
            .derived
            .jack_d_dirty_pv_d_manifest_measure(valuation, pricer, market, measure)?;
        combine_leg_jacobians(&reference, &derived, self.initial_notional())
    }

    fn generate_calib_prwc(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
        state: LatentState,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let result = ensure_live(valuation.value_date, self.maturity()).and_then(|()| match state {
            LatentState::Forward => self.forward_prwc(valuation, pricer, market, quoting, quotes),
            LatentState::Funding => Err(ProductError::UnsupportedLatentState {
                component: self.name.clone(),
                state: state.to_string(),
            }),
        });
        logged(&self.name, "calibration constraint", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;
    use approx::assert_relative_eq;
    use meridian_core::types::{FloatingRateIndex, Frequency};
    use meridian_curves::{NodeForwardCurve, ZeroNodeCurve};
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn market() -> MarketParams {
        let funding = ZeroNodeCurve::flat(d(2025, 1, 2), Currency::USD, 0.04, &[d(2030, 1, 2)]).unwrap();
        let derived = NodeForwardCurve::flat(FloatingRateIndex::sofr_1m(), d(2025, 1, 2), 0.041, &[d(2030, 1, 2)])
            .unwrap();
        MarketParams::new()
            .with_funding_curve(Arc::new(funding))
            .with_forward_curve(Arc::new(derived))
    }

    fn basis(spread: f64) -> FloatFloatComponent {
        let quarterly = Schedule::new(d(2025, 1, 6), d(2027, 1, 6), Frequency::Quarterly);
        let monthly = Schedule::new(d(2025, 1, 6), d(2027, 1, 6), Frequency::Monthly);
        let reference = FloatingStream::new(1e6, &quarterly, FloatingRateIndex::sofr_3m(), 0.0).unwrap();
        let derived = FloatingStream::new(-1e6, &monthly, FloatingRateIndex::sofr_1m(), spread).unwrap();
        FloatFloatComponent::new("USD.BASIS.3M1M.2Y", reference, derived).unwrap()
    }

    #[test]
    fn test_par_basis_spread_sign() {
        assert_relative_eq!(par_basis_spread(-5.0, 0.0, 100.0).unwrap(), 0.05);
        assert!(par_basis_spread(-5.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_value_map_spread_convention() {
        let val = ValuationParams::spot(d(2025, 1, 2));
        let m = basis(0.0)
            .value(&val, &PricerParams::default(), &market(), &QuotingParams::default())
            .unwrap();
        let map = m.to_value_map();
        let net = m.reference.clean_pv() + m.derived.clean_pv();
        assert_relative_eq!(
            map.get("ReferenceParBasisSpread").unwrap(),
            -net / m.derived.clean_dv01()
        );
        assert_relative_eq!(
            map.get("DerivedParBasisSpread").unwrap(),
            -net / m.reference.clean_dv01()
        );
        assert!(map.contains("ReferencePV"));
        assert!(map.contains("DerivedCleanDV01"));
    }

    #[test]
    fn test_forward_prwc_reprices_derived_leg() {
        // a derived curve satisfying the constraint prices the swap at the quoted spread
        let val = ValuationParams::spot(d(2025, 1, 2));
        let (pricer, quoting) = (PricerParams::default(), QuotingParams::default());
        let market = market();
        let swap = basis(0.0);
        let spread_bp = 7.5;
        let prwc = swap
            .generate_calib_prwc(
                &val,
                &pricer,
                &market,
                &quoting,
                LatentState::Forward,
                &ProductQuoteSet::single(Quote::ParBasisSpread {
                    leg: BasisLeg::Derived,
                    spread_bp,
                }),
            )
            .unwrap();

        let curve = market.forward_curve(&FloatingRateIndex::sofr_1m().label()).unwrap();
        let residual = prwc.evaluate(|date| curve.forward(date)).unwrap();
        let quoted = basis(spread_bp * 1e-4)
            .value(&val, &pricer, &market, &quoting)
            .unwrap()
            .clean_pv();
        assert_relative_eq!(residual, quoted, max_relative = 1e-9, epsilon = 1e-6);
        assert!(prwc.d_value_d_manifest_measure("DerivedParBasisSpread").unwrap() > 0.0);
    }

    #[test]
    fn test_funding_state_unsupported() {
        let err = basis(0.0)
            .generate_calib_prwc(
                &ValuationParams::spot(d(2025, 1, 2)),
                &PricerParams::default(),
                &market(),
                &QuotingParams::default(),
                LatentState::Funding,
                &ProductQuoteSet::single(Quote::ParBasisSpread {
                    leg: BasisLeg::Derived,
                    spread_bp: 5.0,
                }),
            )
            .unwrap_err();
        assert!(matches!(err, ProductError::UnsupportedLatentState { .. }));
    }
}
