//! Cash deposit.

use serde::{Deserialize, Serialize};

use meridian_core::daycounts::DayCountConvention;
use meridian_core::types::{Currency, Date};
use meridian_curves::{MarketParams, WengertJacobian};

use super::{logged, point_forward_prwc, Component};
use crate::calibration::{LatentState, PredictorResponseWeightConstraint, ProductQuoteSet, Quote, QuoteKind};
use crate::error::{ensure_live, nonzero, ProductError, ProductResult};
use crate::factor::FactorSchedule;
use crate::measures::ValueMap;
use crate::params::{CashSettleParams, PricerParams, QuotingParams, ValuationParams};
use crate::period::Period;
use crate::stream::generic::{GenericStream, BP};

const FUNDING_QUOTES: [QuoteKind; 2] = [QuoteKind::Rate, QuoteKind::Pv];
const FORWARD_QUOTES: [QuoteKind; 1] = [QuoteKind::Rate];

/// A single-period loan: principal out on start, principal plus interest
/// back on end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositComponent {
    name: String,
    stream: GenericStream,
    rate: f64,
}

impl DepositComponent {
    /// Creates a deposit at a contractual `rate`.
    pub fn new(
        name: impl Into<String>,
        currency: Currency,
        start: Date,
        end: Date,
        day_count: DayCountConvention,
        notional: f64,
        rate: f64,
    ) -> ProductResult<Self> {
        let period = Period::fixed(start, end, end, day_count, rate)?;
        Ok(Self {
            name: name.into(),
            stream: GenericStream::new(currency, notional, vec![period], FactorSchedule::bullet())?,
            rate,
        })
    }

    /// Settles cash with a lag from the value date.
    #[must_use]
    pub fn with_cash_settle(mut self, params: CashSettleParams) -> Self {
        self.stream = self.stream.with_cash_settle(params);
        self
    }

    /// Contractual rate.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    fn period(&self) -> &Period {
        &self.stream.periods()[0]
    }

    /// True while the principal exchange on the start date is still ahead.
    fn principal_outstanding(&self, value_date: Date) -> bool {
        self.period().start() >= value_date
    }

    fn measures(
        &self,
        valuation: &ValuationParams,
        market: &MarketParams,
    ) -> ProductResult<ValueMap> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.maturity())?;
        let funding = self.stream.funding_curve(market)?;
        let cash_df = self.stream.cash_settle_df(valuation, market)?;

        let period = self.period();
        let notional = self.initial_notional();
        let dcf = period.dcf();
        let df_start = funding.df(period.start().max(value_date))?;
        let df_end = funding.df(period.end())?;
        let forward_df = df_end / nonzero(df_start, "deposit start discount factor")?;

        let mut pv = notional * (1.0 + self.rate * dcf) * df_end;
        if self.principal_outstanding(value_date) {
            pv -= notional * df_start;
        }

        let mut map = ValueMap::new();
        map.insert("PV", pv / cash_df);
        map.insert("DirtyPV", pv / cash_df);
        map.insert("Rate", (1.0 / forward_df - 1.0) / nonzero(dcf, "deposit accrual")?);
        map.insert("DV01", notional * dcf * df_end * BP / cash_df);
        map.insert("DiscountFactor", df_end);
        map.insert("ForwardDF", forward_df);
        Ok(map)
    }

    fn funding_prwc(
        &self,
        valuation: &ValuationParams,
        market: &MarketParams,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        ensure_live(valuation.value_date, self.maturity())?;
        let period = self.period();
        let notional = self.initial_notional();
        let dcf = period.dcf();
        match quotes.select(&FUNDING_QUOTES, &self.name)? {
            Quote::Rate(rate) => {
                let forward_df = 1.0 / nonzero(1.0 + rate * dcf, "deposit growth factor")?;
                let mut prwc = self.stream.discount_latent_state_prwc(valuation, forward_df)?;
                prwc.add_d_weight_d_manifest_measure(
                    "Rate",
                    period.start(),
                    -notional * dcf * forward_df * forward_df,
                );
                Ok(prwc)
            }
            Quote::Pv(pv) => {
                let cash_df = self.stream.cash_settle_df(valuation, market)?;
                let mut prwc = PredictorResponseWeightConstraint::new();
                prwc.add_predictor_response_weight(period.end(), notional * (1.0 + self.rate * dcf));
                if self.principal_outstanding(valuation.value_date) {
                    prwc.add_predictor_response_weight(period.start(), -notional);
                }
                prwc.update_value(pv * cash_df);
                prwc.update_d_value_d_manifest_measure("PV", cash_df);
                Ok(prwc)
            }
            _ => Err(ProductError::quote_mismatch(&self.name, "unexpected funding quote")),
        }
    }

    fn forward_prwc(
        &self,
        valuation: &ValuationParams,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        ensure_live(valuation.value_date, self.maturity())?;
        match quotes.select(&FORWARD_QUOTES, &self.name)? {
            Quote::Rate(rate) => Ok(point_forward_prwc(self.maturity(), rate, "Rate", 1.0)),
            _ => Err(ProductError::quote_mismatch(&self.name, "unexpected forward quote")),
        }
    }
}

impl Component for DepositComponent {
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

    fn jack_d_dirty_pv_d_manifest_measure(
        &self,
        valuation: &ValuationParams,
        _pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        let value_date = valuation.value_date;
        ensure_live(value_date, self.maturity())?;
        let funding = self.stream.funding_curve(market)?;
        let period = self.period();
        let unavailable = || ProductError::JacobianUnavailable {
            measure: measure.to_string(),
        };

        let d_end = funding
            .jack_d_df_d_manifest_measure(period.end(), measure)
            .ok_or_else(unavailable)?;
        let growth = 1.0 + self.rate * period.dcf();
        let mut jack = d_end.scaled(growth);
        let mut undiscounted = growth * funding.df(period.end())?;
        if self.principal_outstanding(value_date) {
            let d_start = funding
                .jack_d_df_d_manifest_measure(period.start(), measure)
                .ok_or_else(unavailable)?;
            jack.accumulate_scaled(&d_start, -1.0)?;
            undiscounted -= funding.df(period.start())?;
        }
        let jack = self
            .stream
            .cash_settled_jacobian(&jack, undiscounted, valuation, market, measure)?;
        Ok(jack.scaled(self.initial_notional().signum()))
    }

    fn generate_calib_prwc(
        &self,
        valuation: &ValuationParams,
        _pricer: &PricerParams,
        market: &MarketParams,
        _quoting: &QuotingParams,
        state: LatentState,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint> {
        let result = match state {
            LatentState::Funding => self.funding_prwc(valuation, market, quotes),
            LatentState::Forward => self.forward_prwc(valuation, quotes),
        };
        logged(&self.name, "calibration constraint", result)
    }
}
