//! Forward rate agreement.

use serde::{Deserialize, Serialize};

use meridian_core::types::{Currency, Date, FloatingRateIndex};
use meridian_curves::{MarketParams, WengertJacobian};

use super::{logged, point_forward_prwc, Component};
use crate::calibration::{LatentState, PredictorResponseWeightConstraint, ProductQuoteSet, Quote, QuoteKind};
use crate::error::{ensure_live, nonzero, ProductError, ProductResult};
use crate::factor::FactorSchedule;
use crate::measures::ValueMap;
use crate::params::{PricerParams, QuotingParams, ValuationParams};
use crate::period::Period;
use crate::stream::generic::{GenericStream, BP};

const ACCEPTED_QUOTES: [QuoteKind; 2] = [QuoteKind::ForwardRate, QuoteKind::Rate];

/// Pays `N tau (F - K) / (1 + F tau)` on the start date.
///
/// A positive notional receives the index rate against the strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraComponent {
    name: String,
    stream: GenericStream,
    strike: f64,
}

/// Projection state shared by valuation and the Jacobian.
struct FraState {
    forward: f64,
    dcf: f64,
    df_start: f64,
    cash_df: f64,
    known: bool,
    single_curve: bool,
}

impl FraComponent {
    /// Creates an FRA on `index` over `start..end` struck at `strike`.
    pub fn new(
        name: impl Into<String>,
        index: FloatingRateIndex,
        start: Date,
        end: Date,
        notional: f64,
        strike: f64,
    ) -> ProductResult<Self> {
        let currency = index.currency;
        let period = Period::floating(start, end, end, index, 0.0)?;
        Ok(Self {
            name: name.into(),
            stream: GenericStream::new(currency, notional, vec![period], FactorSchedule::bullet())?,
            strike,
        })
    }

    /// Contract rate.
    #[must_use]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    fn period(&self) -> &Period {
        &self.stream.periods()[0]
    }

    fn state(&self, valuation: &ValuationParams, market: &MarketParams) -> ProductResult<FraState> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.effective())?;
        let funding = self.stream.funding_curve(market)?;
        let period = self.period();
        let metrics = period.coupon_metrics(value_date, market, funding)?;
        Ok(FraState {
            forward: metrics.index_rate,
            dcf: period.dcf(),
            df_start: funding.df(period.start())?,
            cash_df: self.stream.cash_settle_df(valuation, market)?,
            known: metrics.known,
            single_curve: metrics.single_curve,
        })
    }

    fn measures(&self, valuation: &ValuationParams, market: &MarketParams) -> ProductResult<ValueMap> {
        let s = self.state(valuation, market)?;
        let notional = self.initial_notional();
        let growth = nonzero(1.0 + s.forward * s.dcf, "FRA settlement discount")?;
        let pv = notional * s.dcf * (s.forward - self.strike) / growth * s.df_start / s.cash_df;
        let dv01 = notional * s.dcf * (1.0 + self.strike * s.dcf) / (growth * growth) * s.df_start * BP / s.cash_df;

        let mut map = ValueMap::new();
        map.insert("PV", pv);
        map.insert("DirtyPV", pv);
        map.insert("ParForward", s.forward);
        map.insert("ForwardRate", s.forward);
        map.insert("Rate", s.forward);
        map.insert("Strike", self.strike);
        map.insert("DV01", dv01);
        Ok(map)
    }

    fn funding_prwc(
        &self,
        valuation: &ValuationParams,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        ensure_live(valuation.value_date, self.effective())?;
        let quote = quotes.select(&ACCEPTED_QUOTES, &self.name)?;
        let (Quote::ForwardRate(rate) | Quote::Rate(rate)) = quote else {
            return Err(ProductError::quote_mismatch(&self.name, "unexpected funding quote"));
        };
        let dcf = self.period().dcf();
        let forward_df = 1.0 / nonzero(1.0 + rate * dcf, "FRA growth factor")?;
        let mut prwc = self.stream.discount_latent_state_prwc(valuation, forward_df)?;
        prwc.add_d_weight_d_manifest_measure(
            quote.measure_name(),
            self.effective(),
            -self.initial_notional() * dcf * forward_df * forward_df,
        );
        Ok(prwc)
    }

    fn forward_prwc(
        &self,
        valuation: &ValuationParams,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        ensure_live(valuation.value_date, self.effective())?;
        let quote = quotes.select(&ACCEPTED_QUOTES, &self.name)?;
        let (Quote::ForwardRate(rate) | Quote::Rate(rate)) = quote else {
            return Err(ProductError::quote_mismatch(&self.name, "unexpected forward quote"));
        };
        Ok(point_forward_prwc(self.maturity(), rate, quote.measure_name(), 1.0))
    }
}

impl Component for FraComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn currency(&self) -> Currency {
        self.stream.currency()
    }

    fn effective(&self) -> Date {
        self.stream.effective()
    }

    fn maturity(&self) -> Date {
        self.stream.maturity()
    }

    fn initial_notional(&self) -> f64 {
        self.stream.initial_notional()
    }

    fn value_map(
        &self,
        valuation: &ValuationParams,
        _pricer: &PricerParams,
        market: &MarketParams,
        _quoting: &QuotingParams,
    ) -> ProductResult<ValueMap> {
        logged(&self.name, "valuation", self.measures(valuation, market))
    }

    /// Off one curve the payoff collapses to `N (df(start) - (1 + K tau) df(end))`;
    /// with its own forward curve only the settlement discount moves.
    fn jack_d_dirty_pv_d_manifest_measure(
        &self,
        valuation: &ValuationParams,
        _pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        let s = self.state(valuation, market)?;
        let funding = self.stream.funding_curve(market)?;
        let period = self.period();
        let unavailable = || ProductError::JacobianUnavailable {
            measure: measure.to_string(),
        };

        let d_start = funding
            .jack_d_df_d_manifest_measure(period.start(), measure)
            .ok_or_else(unavailable)?;
        let growth = nonzero(1.0 + s.forward * s.dcf, "FRA settlement discount")?;
        let undiscounted = s.dcf * (s.forward - self.strike) / growth * s.df_start;
        let jack = if s.single_curve && !s.known {
            let d_end = funding
                .jack_d_df_d_manifest_measure(period.end(), measure)
                .ok_or_else(unavailable)?;
            let mut jack = d_start;
            jack.accumulate_scaled(&d_end, -(1.0 + self.strike * s.dcf))?;
            jack
        } else {
            d_start.scaled(s.dcf * (s.forward - self.strike) / growth)
        };
        let jack = self
            .stream
            .cash_settled_jacobian(&jack, undiscounted, valuation, market, measure)?;
        Ok(jack.scaled(self.initial_notional().signum()))
    }

    fn generate_calib_prwc(
        &self,
        valuation: &ValuationParams,
        _pricer: &PricerParams,
        _market: &MarketParams,
        _quoting: &QuotingParams,
        state: LatentState,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let result = match state {
            LatentState::Funding => self.funding_prwc(valuation, quotes),
            LatentState::Forward => self.forward_prwc(valuation, quotes),
        };
        logged(&self.name, "calibration constraint", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meridian_curves::{DiscountCurve, NodeForwardCurve, ZeroNodeCurve};
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn curve() -> ZeroNodeCurve {
        ZeroNodeCurve::new(
            d(2025, 1, 2),
            Currency::USD,
            &[(d(2025, 7, 2), 0.043), (d(2026, 1, 2), 0.041), (d(2027, 1, 4), 0.040)],
        )
        .unwrap()
    }

    fn setup() -> (ValuationParams, PricerParams, MarketParams, QuotingParams) {
        (
            ValuationParams::spot(d(2025, 1, 2)),
            PricerParams::default(),
            MarketParams::new().with_funding_curve(Arc::new(curve())),
            QuotingParams::default(),
        )
    }

    fn fra(strike: f64) -> FraComponent {
        FraComponent::new(
            "USD.FRA.3x6",
            FloatingRateIndex::sofr_3m(),
            d(2025, 4, 7),
            d(2025, 7, 7),
            1e6,
            strike,
        )
        .unwrap()
    }

    #[test]
    fn test_at_par_strike_is_worthless() {
        let (val, pricer, market, quoting) = setup();
        let par = fra(0.04)
            .measure_value(&val, &pricer, &market, &quoting, "ParForward")
            .unwrap();
        let pv = fra(par).measure_value(&val, &pricer, &market, &quoting, "PV").unwrap();
        assert_relative_eq!(pv, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_curve_pv_identity() {
        let (val, pricer, market, quoting) = setup();
        let f = fra(0.035);
        let pv = f.measure_value(&val, &pricer, &market, &quoting, "PV").unwrap();
        let curve = curve();
        let dcf = f.period().dcf();
        let expected = 1e6 * (curve.df(d(2025, 4, 7)).unwrap() - (1.0 + 0.035 * dcf) * curve.df(d(2025, 7, 7)).unwrap());
        assert_relative_eq!(pv, expected, max_relative = 1e-10);
    }

    #[test]
    fn test_forward_curve_drives_forward() {
        let (val, pricer, market, quoting) = setup();
        let fwd = NodeForwardCurve::flat(FloatingRateIndex::sofr_3m(), d(2025, 1, 2), 0.05, &[d(2026, 1, 2)]).unwrap();
        let market = market.with_forward_curve(Arc::new(fwd));
        let map = fra(0.04).value_map(&val, &pricer, &market, &quoting).unwrap();
        assert_relative_eq!(map.get("ForwardRate").unwrap(), 0.05, max_relative = 1e-12);
        assert!(map.get("PV").unwrap() > 0.0);
    }

    #[test]
    fn test_expired_on_effective_date() {
        let (_, pricer, market, quoting) = setup();
        let val = ValuationParams::spot(d(2025, 4, 7));
        assert!(matches!(
            fra(0.04).value_map(&val, &pricer, &market, &quoting),
            Err(ProductError::Expired { .. })
        ));
    }

    #[test]
    fn test_constraint_shapes() {
        let (val, pricer, market, quoting) = setup();
        let quotes = ProductQuoteSet::single(Quote::ForwardRate(0.042));
        let forward = fra(0.04)
            .generate_calib_prwc(&val, &pricer, &market, &quoting, LatentState::Forward, &quotes)
            .unwrap();
        assert_eq!(forward.weight(d(2025, 7, 7)), 1.0);
        assert_eq!(forward.value(), 0.042);
        assert_eq!(forward.d_value_d_manifest_measure("ForwardRate"), Some(1.0));

        let funding = fra(0.04)
            .generate_calib_prwc(&val, &pricer, &market, &quoting, LatentState::Funding, &quotes)
            .unwrap();
        assert_eq!(funding.predictor_weights().len(), 2);
        assert_relative_eq!(funding.weight(d(2025, 7, 7)), -1e6);
    }

    #[test]
    fn test_jacobian_matches_bumped_curve() {
        let (val, pricer, _, quoting) = setup();
        let f = fra(0.035);
        let base = curve();
        let market = MarketParams::new().with_funding_curve(Arc::new(base.clone()));
        let jack = f
            .jack_d_dirty_pv_d_manifest_measure(&val, &pricer, &market, "ZeroRate")
            .unwrap();

        let eps = 1e-4;
        for k in 0..base.parameter_count() {
            let pv = |delta: f64| {
                let bumped = MarketParams::new().with_funding_curve(Arc::new(base.bumped(k, delta).unwrap()));
                f.measure_value(&val, &pricer, &bumped, &quoting, "PV").unwrap()
            };
            let fd = (pv(eps) - pv(-eps)) / (2.0 * eps) / 1e6;
            assert_relative_eq!(jack.get(0, k).unwrap(), fd, epsilon = 1e-6);
        }
    }
}
