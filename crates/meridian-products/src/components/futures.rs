//! Short-term interest rate futures.

use serde::{Deserialize, Serialize};

use meridian_core::types::{Currency, Date, FloatingRateIndex};
use meridian_curves::traits::curve_time;
use meridian_curves::{LatentStateLabel, MarketParams, WengertJacobian};

use super::{logged, point_forward_prwc, Component};
use crate::calibration::{LatentState, PredictorResponseWeightConstraint, ProductQuoteSet, Quote, QuoteKind};
use crate::error::{ensure_live, nonzero, ProductError, ProductResult};
use crate::factor::FactorSchedule;
use crate::measures::ValueMap;
use crate::params::{PricerParams, QuotingParams, ValuationParams};
use crate::period::Period;
use crate::stream::generic::{GenericStream, BP};

const ACCEPTED_QUOTES: [QuoteKind; 2] = [QuoteKind::Price, QuoteKind::Rate];

/// A futures contract on an index rate, quoted as `100 * (1 - rate)`.
///
/// Daily margining leaves the PV undiscounted. The futures rate exceeds the
/// forward by `0.5 sigma^2 t_start t_end` when a volatility is registered
/// for the index forward state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturesComponent {
    name: String,
    stream: GenericStream,
    trade_price: f64,
}

impl FuturesComponent {
    /// Creates a contract on `index` over `start..end` bought at `trade_price`.
    pub fn new(
        name: impl Into<String>,
        index: FloatingRateIndex,
        start: Date,
        end: Date,
        notional: f64,
        trade_price: f64,
    ) -> ProductResult<Self> {
        let currency = index.currency;
        let period = Period::floating(start, end, end, index, 0.0)?;
        Ok(Self {
            name: name.into(),
            stream: GenericStream::new(currency, notional, vec![period], FactorSchedule::bullet())?,
            trade_price,
        })
    }

    /// Price paid for the contract.
    #[must_use]
    pub fn trade_price(&self) -> f64 {
        self.trade_price
    }

    fn period(&self) -> &Period {
        &self.stream.periods()[0]
    }

    /// `futures rate - forward rate`; zero without a forward volatility.
    pub fn convexity_adjustment(&self, value_date: Date, pricer: &PricerParams, market: &MarketParams) -> f64 {
        if !pricer.apply_convexity {
            return 0.0;
        }
        let period = self.period();
        let Some(index) = period.index() else {
            return 0.0;
        };
        let Some(vol) = market.volatility(&LatentStateLabel::Forward(index.label())) else {
            return 0.0;
        };
        let sigma = vol.vol(period.start());
        0.5 * sigma * sigma * curve_time(value_date, period.start()) * curve_time(value_date, period.end())
    }

    /// Forward rate implied by a quote, net of the convexity adjustment, and
    /// its derivative with respect to the quote.
    fn implied_forward(&self, quote: Quote, adjustment: f64) -> ProductResult<(f64, f64)> {
        match quote {
            Quote::Price(price) => Ok((1.0 - price / 100.0 - adjustment, -0.01)),
            Quote::Rate(rate) => Ok((rate - adjustment, 1.0)),
            _ => Err(ProductError::quote_mismatch(&self.name, "futures take a price or a rate")),
        }
    }

    fn measures(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
    ) -> ProductResult<ValueMap> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.effective())?;
        let funding = self.stream.funding_curve(market)?;
        let period = self.period();
        let forward = period.coupon_metrics(value_date, market, funding)?.index_rate;
        let adjustment = self.convexity_adjustment(value_date, pricer, market);
        let rate = forward + adjustment;
        let price = 100.0 * (1.0 - rate);
        let notional = self.initial_notional();

        let mut map = ValueMap::new();
        map.insert("Price", price);
        map.insert("Rate", rate);
        map.insert("ForwardRate", forward);
        map.insert("ConvexityAdjustment", adjustment);
        map.insert("PV", notional * period.dcf() * (price - self.trade_price) / 100.0);
        map.insert("DV01", -notional * period.dcf() * BP);
        Ok(map)
    }

    fn prwc(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        state: LatentState,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        ensure_live(valuation.value_date, self.effective())?;
        let quote = quotes.select(&ACCEPTED_QUOTES, &self.name)?;
        let adjustment = self.convexity_adjustment(valuation.value_date, pricer, market);
        let (forward, d_forward) = self.implied_forward(quote, adjustment)?;

        match state {
            LatentState::Forward => Ok(point_forward_prwc(
                self.maturity(),
                forward,
                quote.measure_name(),
                d_forward,
            )),
            LatentState::Funding => {
                let dcf = self.period().dcf();
                let forward_df = 1.0 / nonzero(1.0 + forward * dcf, "futures growth factor")?;
                let mut prwc = self.stream.discount_latent_state_prwc(valuation, forward_df)?;
                prwc.add_d_weight_d_manifest_measure(
                    quote.measure_name(),
                    self.effective(),
                    -self.initial_notional() * dcf * forward_df * forward_df * d_forward,
                );
                Ok(prwc)
            }
        }
    }
}

impl Component for FuturesComponent {
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
        pricer: &PricerParams,
        market: &MarketParams,
        _quoting: &QuotingParams,
    ) -> ProductResult<ValueMap> {
        logged(&self.name, "valuation", self.measures(valuation, pricer, market))
    }

    /// `-tau dF/dp` when the forward comes off the funding curve, a zero row
    /// otherwise.
    fn jack_d_dirty_pv_d_manifest_measure(
        &self,
        valuation: &ValuationParams,
        _pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.effective())?;
        let funding = self.stream.funding_curve(market)?;
        let period = self.period();
        let metrics = period.coupon_metrics(value_date, market, funding)?;
        if metrics.known || !metrics.single_curve {
            return Ok(WengertJacobian::zeros(1, funding.parameter_count()));
        }

        let d_forward = funding
            .jack_d_forward_d_manifest_measure(period.start(), period.end(), measure, period.dcf())
            .ok_or_else(|| ProductError::JacobianUnavailable {
                measure: measure.to_string(),
            })?;
        Ok(d_forward.scaled(-period.dcf() * self.initial_notional().signum()))
    }

    fn generate_calib_prwc(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        _quoting: &QuotingParams,
        state: LatentState,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        logged(
            &self.name,
            "calibration constraint",
            self.prwc(valuation, pricer, market, state, quotes),
        )
    }
}
