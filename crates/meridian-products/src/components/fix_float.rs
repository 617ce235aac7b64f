//! Fixed-versus-floating interest rate swap.

use serde::{Deserialize, Serialize};

use meridian_core::types::{Currency, Date};
use meridian_curves::{MarketParams, WengertJacobian};

use super::{combine_leg_jacobians, ensure_same_currency, logged, Component};
use crate::calibration::{LatentState, PredictorResponseWeightConstraint, ProductQuoteSet, Quote, QuoteKind};
use crate::error::{ensure_live, nonzero, ProductError, ProductResult};
use crate::measures::{StreamMeasures, ValueMap};
use crate::params::{PricerParams, QuotingParams, ValuationParams};
use crate::stream::{FixedStream, FloatingStream, Stream};

const ACCEPTED_QUOTES: [QuoteKind; 3] = [QuoteKind::Rate, QuoteKind::SwapRate, QuoteKind::Pv];

/// A fixed leg against a floating leg in one currency.
///
/// Leg notionals carry the direction: a receiver swap has a positive fixed
/// notional and a negative floating notional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixFloatComponent {
    name: String,
    fixed: FixedStream,
    floating: FloatingStream,
}

/// Interest rate swap.
pub type IrsComponent = FixFloatComponent;

/// Net and per-leg measures of a fix-float swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapMeasures {
    /// Fixed leg measures.
    pub fixed: StreamMeasures,
    /// Floating leg measures.
    pub floating: StreamMeasures,
    /// `|0.0001 * floating clean PV / fixed clean DV01|`
    pub par_swap_rate: f64,
}

impl SwapMeasures {
    /// Net dirty PV.
    #[must_use]
    pub fn pv(&self) -> f64 {
        self.fixed.pv() + self.floating.pv()
    }

    /// Net clean PV.
    #[must_use]
    pub fn clean_pv(&self) -> f64 {
        self.fixed.clean_pv() + self.floating.clean_pv()
    }

    /// Net accrued.
    #[must_use]
    pub fn accrued(&self) -> f64 {
        self.fixed.accrued + self.floating.accrued
    }

    /// Flattens to named measures; leg measures carry a `Fixed`/`Floating` prefix.
    #[must_use]
    pub fn to_value_map(&self) -> ValueMap {
        let mut map = ValueMap::new();
        map.insert("PV", self.pv());
        map.insert("DirtyPV", self.pv());
        map.insert("CleanPV", self.clean_pv());
        map.insert("Accrued", self.accrued());
        for name in ["ParSwapRate", "SwapRate", "Rate", "FairPremium"] {
            map.insert(name, self.par_swap_rate);
        }
        map.insert("FixedDV01", self.fixed.dv01());
        map.insert("FloatingDV01", self.floating.dv01());
        map.insert("CalcTime", self.fixed.calc_time + self.floating.calc_time);
        map.extend_prefixed("Fixed", &self.fixed.to_value_map());
        map.extend_prefixed("Floating", &self.floating.to_value_map());
        map
    }
}

impl FixFloatComponent {
    /// Creates a swap; both legs must be in the same currency.
    pub fn new(name: impl Into<String>, fixed: FixedStream, floating: FloatingStream) -> ProductResult<Self> {
        let name = name.into();
        ensure_same_currency(&name, fixed.currency(), floating.currency())?;
        Ok(Self { name, fixed, floating })
    }

    /// Fixed leg.
    #[must_use]
    pub fn fixed_leg(&self) -> &FixedStream {
        &self.fixed
    }

    /// Floating leg.
    #[must_use]
    pub fn floating_leg(&self) -> &FloatingStream {
        &self.floating
    }

    /// Values both legs and derives the par swap rate.
    pub fn value(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
    ) -> ProductResult<SwapMeasures> {
        let fixed = self.fixed.value(valuation, pricer, market, quoting)?;
        let floating = self.floating.value(valuation, pricer, market, quoting)?;
        let annuity = nonzero(fixed.clean_dv01(), "fixed leg clean DV01")?;
        let par_swap_rate = (0.0001 * floating.clean_pv() / annuity).abs();
        Ok(SwapMeasures {
            fixed,
            floating,
            par_swap_rate,
        })
    }

    /// Funding constraint: both legs in discount-factor space.
    fn funding_prwc(
        &self,
        valuation: &ValuationParams,
        market: &MarketParams,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let quote = quotes.select(&ACCEPTED_QUOTES, &self.name)?;
        let mut prwc = match quote {
            Quote::Rate(rate) | Quote::SwapRate(rate) => {
                self.fixed.generic().funding_prwc(valuation, market, Some(rate))?
            }
            Quote::Pv(pv) => {
                let cash_df = self.fixed.generic().cash_settle_df(valuation, market)?;
                let mut prwc = self.fixed.generic().funding_prwc(valuation, market, None)?;
                prwc.update_value(pv * cash_df);
                prwc.update_d_value_d_manifest_measure("PV", cash_df);
                prwc
            }
            _ => return Err(ProductError::quote_mismatch(&self.name, "unexpected funding quote")),
        };

        let floating = self.floating.generic();
        let own_forward_curve = floating
            .index()
            .is_some_and(|index| market.forward_curve(&index.label()).is_some());
        let floating_prwc = if own_forward_curve {
            floating.funding_prwc(valuation, market, None)?
        } else {
            floating.funding_forward_prwc(valuation, market)?
        };
        prwc.absorb(&floating_prwc);
        Ok(prwc)
    }

    /// Forward constraint: floating forwards against the fixed leg at the quote.
    fn forward_prwc(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let quote = quotes.select(&ACCEPTED_QUOTES, &self.name)?;
        let cash_df = self.fixed.generic().cash_settle_df(valuation, market)?;
        let (fixed, quoted_pv) = match quote {
            Quote::Rate(rate) | Quote::SwapRate(rate) => (self.fixed.with_coupon(rate), 0.0),
            Quote::Pv(pv) => (self.fixed.clone(), pv),
            _ => return Err(ProductError::quote_mismatch(&self.name, "unexpected forward quote")),
        };
        let fixed_measures = fixed.value(valuation, pricer, market, quoting)?;

        let mut prwc = self.floating.generic().contractual_forward_prwc(valuation, market)?;
        prwc.update_value((quoted_pv - fixed_measures.clean_pv()) * cash_df);
        match quote {
            Quote::Pv(_) => prwc.update_d_value_d_manifest_measure("PV", cash_df),
            _ => prwc.update_d_value_d_manifest_measure(
                quote.measure_name(),
                -fixed_measures.clean_dv01() * 10_000.0 * cash_df,
            ),
        }
        Ok(prwc)
    }
}

impl Component for FixFloatComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn currency(&self) -> Currency {
        self.fixed.currency()
    }

    fn effective(&self) -> Date {
        self.fixed.effective().min(self.floating.effective())
    }

    fn maturity(&self) -> Date {
        self.fixed.maturity().max(self.floating.maturity())
    }

    fn initial_notional(&self) -> f64 {
        self.fixed.initial_notional()
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
        let fixed = self
            .fixed
            .jack_d_dirty_pv_d_manifest_measure(valuation, pricer, market, measure)?;
        let floating = self
            .floating
            .jack_d_dirty_pv_d_manifest_measure(valuation, pricer, market, measure)?;
        combine_leg_jacobians(&fixed, &floating, self.initial_notional())
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
            LatentState::Funding => self.funding_prwc(valuation, market, quotes),
            LatentState::Forward => self.forward_prwc(valuation, pricer, market, quoting, quotes),
        });
        logged(&self.name, "calibration constraint", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;
    use approx::assert_relative_eq;
    use meridian_core::daycounts::DayCountConvention;
    use meridian_core::types::{FloatingRateIndex, Frequency};
    use meridian_curves::{DiscountCurve, ZeroNodeCurve};
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn curve() -> ZeroNodeCurve {
        ZeroNodeCurve::new(
            d(2025, 1, 2),
            Currency::USD,
            &[(d(2026, 1, 2), 0.040), (d(2028, 1, 3), 0.042), (d(2030, 1, 2), 0.044)],
        )
        .unwrap()
    }

    fn swap(rate: f64) -> FixFloatComponent {
        let schedule = Schedule::new(d(2025, 1, 6), d(2028, 1, 6), Frequency::SemiAnnual);
        let fixed = FixedStream::new(Currency::USD, 1e6, &schedule, DayCountConvention::Thirty360US, rate).unwrap();
        let float_schedule = Schedule::new(d(2025, 1, 6), d(2028, 1, 6), Frequency::Quarterly);
        let floating = FloatingStream::new(-1e6, &float_schedule, FloatingRateIndex::sofr_3m(), 0.0).unwrap();
        FixFloatComponent::new("USD.IRS.3Y", fixed, floating).unwrap()
    }

    fn setup() -> (ValuationParams, PricerParams, MarketParams, QuotingParams) {
        (
            ValuationParams::spot(d(2025, 1, 2)),
            PricerParams::default(),
            MarketParams::new().with_funding_curve(Arc::new(curve())),
            QuotingParams::default(),
        )
    }

    #[test]
    fn test_net_pv_is_sum_of_legs() {
        let (val, pricer, market, quoting) = setup();
        let irs = swap(0.04);
        let m = irs.value(&val, &pricer, &market, &quoting).unwrap();
        let map = irs.value_map(&val, &pricer, &market, &quoting).unwrap();
        assert_relative_eq!(map.get("PV").unwrap(), m.fixed.pv() + m.floating.pv());
        assert_relative_eq!(map.get("fixedpv").unwrap(), m.fixed.pv());
        assert_relative_eq!(map.get("FloatingCleanDV01").unwrap(), m.floating.clean_dv01());
    }

    #[test]
    fn test_par_rate_round_trip() {
        let (val, pricer, market, quoting) = setup();
        let par = swap(0.04).value(&val, &pricer, &market, &quoting).unwrap().par_swap_rate;
        let at_par = swap(par).value(&val, &pricer, &market, &quoting).unwrap();
        assert_relative_eq!(at_par.clean_pv(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(at_par.par_swap_rate, par, max_relative = 1e-12);
    }

    #[test]
    fn test_funding_prwc_holds_at_par() {
        let (val, pricer, market, quoting) = setup();
        let par = swap(0.04).value(&val, &pricer, &market, &quoting).unwrap().par_swap_rate;
        let prwc = swap(0.04)
            .generate_calib_prwc(
                &val,
                &pricer,
                &market,
                &quoting,
                LatentState::Funding,
                &ProductQuoteSet::single(Quote::Rate(par)),
            )
            .unwrap();
        let funding = curve();
        let residual = prwc.evaluate(|date| funding.df(date)).unwrap();
        assert_relative_eq!(residual, 0.0, epsilon = 1e-6);
        assert!(prwc.d_weight_d_manifest_measure("Rate").is_some());
    }

    #[test]
    fn test_forward_prwc_only_records_quoted_measure() {
        let (val, pricer, market, quoting) = setup();
        let prwc = swap(0.04)
            .generate_calib_prwc(
                &val,
                &pricer,
                &market,
                &quoting,
                LatentState::Forward,
                &ProductQuoteSet::single(Quote::SwapRate(0.041)),
            )
            .unwrap();
        assert!(prwc.d_value_d_manifest_measure("SwapRate").unwrap() < 0.0);
        assert!(prwc.d_value_d_manifest_measure("DerivedParBasisSpread").is_none());
        assert!(prwc.d_value_d_manifest_measure("ReferenceParBasisSpread").is_none());
    }

    #[test]
    fn test_quote_mismatch() {
        let (val, pricer, market, quoting) = setup();
        let err = swap(0.04)
            .generate_calib_prwc(
                &val,
                &pricer,
                &market,
                &quoting,
                LatentState::Funding,
                &ProductQuoteSet::single(Quote::Price(99.0)),
            )
            .unwrap_err();
        assert!(matches!(err, ProductError::QuoteTypeMismatch { .. }));
    }

    #[test]
    fn test_cross_currency_legs_rejected() {
        let schedule = Schedule::new(d(2025, 1, 6), d(2026, 1, 6), Frequency::Annual);
        let fixed = FixedStream::new(Currency::EUR, 1e6, &schedule, DayCountConvention::Act360, 0.03).unwrap();
        let floating = FloatingStream::new(-1e6, &schedule, FloatingRateIndex::sofr_3m(), 0.0).unwrap();
        assert!(matches!(
            FixFloatComponent::new("XCCY", fixed, floating),
            Err(ProductError::IncompatibleParameterSpace { .. })
        ));
    }

    #[test]
    fn test_jacobian_per_unit_notional() {
        let (val, pricer, market, _) = setup();
        let irs = swap(0.04);
        let jack = irs
            .jack_d_dirty_pv_d_manifest_measure(&val, &pricer, &market, "ZeroRate")
            .unwrap();
        let fixed = irs
            .fixed_leg()
            .jack_d_dirty_pv_d_manifest_measure(&val, &pricer, &market, "ZeroRate")
            .unwrap();
        let floating = irs
            .floating_leg()
            .jack_d_dirty_pv_d_manifest_measure(&val, &pricer, &market, "ZeroRate")
            .unwrap();
        for k in 0..jack.cols() {
            assert_relative_eq!(
                jack.get(0, k).unwrap(),
                (fixed.get(0, k).unwrap() + floating.get(0, k).unwrap()) / 1e6,
                max_relative = 1e-12
            );
        }
    }
}
