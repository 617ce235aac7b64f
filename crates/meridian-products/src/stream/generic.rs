//! Generic stream: the period aggregator behind every leg.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use meridian_core::types::{Currency, Date, FloatingRateIndex};
use meridian_curves::{DiscountCurve, MarketParams};

use crate::error::{ensure_live, nonzero, ProductError, ProductResult};
use crate::factor::FactorSchedule;
use crate::measures::{ChannelMeasures, ConvexityChannel, StreamMeasures, ValueMap};
use crate::params::{CashSettleParams, PricerParams, QuotingParams, ValuationParams};
use crate::period::{ConvexityMultipliers, CouponMetrics, Period};

/// Basis-point scale between rate units and DV01 units.
pub(crate) const BP: f64 = 0.0001;

/// An ordered, contiguous, non-empty list of periods in one currency.
///
/// The sign of the initial notional gives the direction: positive receives
/// the coupons, negative pays them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StreamDefinition")]
pub struct GenericStream {
    currency: Currency,
    initial_notional: f64,
    periods: Vec<Period>,
    factors: FactorSchedule,
    index: Option<FloatingRateIndex>,
    cash_settle: Option<CashSettleParams>,
}

/// Serialized form of a [`GenericStream`], rebuilt through [`GenericStream::new`].
#[derive(Deserialize)]
struct StreamDefinition {
    currency: Currency,
    initial_notional: f64,
    periods: Vec<Period>,
    #[serde(default)]
    factors: FactorSchedule,
    #[serde(default)]
    cash_settle: Option<CashSettleParams>,
}

impl TryFrom<StreamDefinition> for GenericStream {
    type Error = ProductError;

    fn try_from(definition: StreamDefinition) -> ProductResult<Self> {
        let stream = Self::new(
            definition.currency,
            definition.initial_notional,
            definition.periods,
            definition.factors,
        )?;
        Ok(match definition.cash_settle {
            Some(params) => stream.with_cash_settle(params),
            None => stream,
        })
    }
}

/// Bookkeeping taken from the first live period.
struct FirstLive {
    accrued01: f64,
    accrued: f64,
    reset_date: Date,
    reset_rate: f64,
    total_coupon: f64,
    period_dv01: f64,
}

impl GenericStream {
    /// Builds a stream from its periods.
    ///
    /// Periods must be non-empty, contiguous (`end == next start`) and either
    /// all fixed or all floating on one index. Each period's notional factor
    /// is set to the schedule's average factor over its accrual.
    pub fn new(
        currency: Currency,
        initial_notional: f64,
        periods: Vec<Period>,
        factors: FactorSchedule,
    ) -> ProductResult<Self> {
        let Some(first) = periods.first() else {
            return Err(ProductError::invalid_stream("stream has no periods"));
        };
        if !initial_notional.is_finite() {
            return Err(ProductError::UnresolvableNotional { date: first.start() });
        }
        for pair in periods.windows(2) {
            if pair[0].end() != pair[1].start() {
                return Err(ProductError::invalid_stream(format!(
                    "gap between period ending {} and period starting {}",
                    pair[0].end(),
                    pair[1].start()
                )));
            }
        }

        let index = first.index().cloned();
        if periods.iter().any(|p| p.index() != index.as_ref()) {
            return Err(ProductError::invalid_stream("periods mix coupon types or indices"));
        }

        let periods = periods
            .into_iter()
            .map(|p| {
                let factor = factors.factor_between(p.start(), p.end());
                p.with_factor(factor)
            })
            .collect();

        Ok(Self {
            currency,
            initial_notional,
            periods,
            factors,
            index,
            cash_settle: None,
        })
    }

    /// Settles cash with a lag from the value date instead of on the valuation's cash pay date.
    #[must_use]
    pub fn with_cash_settle(mut self, params: CashSettleParams) -> Self {
        self.cash_settle = Some(params);
        self
    }

    /// Stream currency.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Signed initial notional.
    #[must_use]
    pub fn initial_notional(&self) -> f64 {
        self.initial_notional
    }

    /// Periods in order.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Floating index, `None` for a fixed leg.
    #[must_use]
    pub fn index(&self) -> Option<&FloatingRateIndex> {
        self.index.as_ref()
    }

    /// Notional factor schedule.
    #[must_use]
    pub fn factors(&self) -> &FactorSchedule {
        &self.factors
    }

    /// Cash-settle parameters.
    #[must_use]
    pub fn cash_settle(&self) -> Option<&CashSettleParams> {
        self.cash_settle.as_ref()
    }

    /// Start of the first period.
    #[must_use]
    pub fn effective(&self) -> Date {
        self.periods[0].start()
    }

    /// End of the last period.
    #[must_use]
    pub fn maturity(&self) -> Date {
        self.periods[self.periods.len() - 1].end()
    }

    /// Pay date of the first period.
    #[must_use]
    pub fn first_coupon_date(&self) -> Date {
        self.periods[0].pay()
    }

    /// Notional in force on `date`.
    pub fn notional(&self, date: Date) -> ProductResult<f64> {
        let notional = self.initial_notional * self.factors.factor(date);
        if notional.is_finite() {
            Ok(notional)
        } else {
            Err(ProductError::UnresolvableNotional { date })
        }
    }

    /// Average notional over `[start, end)`.
    pub fn notional_between(&self, start: Date, end: Date) -> ProductResult<f64> {
        let notional = self.initial_notional * self.factors.factor_between(start, end);
        if notional.is_finite() {
            Ok(notional)
        } else {
            Err(ProductError::UnresolvableNotional { date: start })
        }
    }

    /// Notional of one period.
    pub(crate) fn period_notional(&self, period: &Period) -> ProductResult<f64> {
        let notional = self.initial_notional * period.factor();
        if notional.is_finite() {
            Ok(notional)
        } else {
            Err(ProductError::UnresolvableNotional { date: period.start() })
        }
    }

    /// Funding curve of the stream currency.
    pub(crate) fn funding_curve<'a>(&self, market: &'a MarketParams) -> ProductResult<&'a dyn DiscountCurve> {
        market
            .funding_curve(self.currency)
            .ok_or(ProductError::MissingCurve {
                currency: self.currency,
            })
    }

    /// Date cash settles for this valuation.
    #[must_use]
    pub fn cash_settle_date(&self, valuation: &ValuationParams) -> Date {
        self.cash_settle
            .map_or(valuation.cash_pay_date, |c| c.settle_date(valuation.value_date))
    }

    /// Funding discount factor to the cash settle date.
    pub fn cash_settle_df(&self, valuation: &ValuationParams, market: &MarketParams) -> ProductResult<f64> {
        let df = self.funding_curve(market)?.df(self.cash_settle_date(valuation))?;
        nonzero(df, "cash settle discount factor")
    }

    /// Coupon metrics of the period accruing on `date`.
    pub fn coupon(&self, date: Date, value_date: Date, market: &MarketParams) -> ProductResult<CouponMetrics> {
        let period = self
            .periods
            .iter()
            .find(|p| p.contains(date))
            .ok_or_else(|| {
                ProductError::date_ordering(format!(
                    "{date} is outside the stream {} to {}",
                    self.effective(),
                    self.maturity()
                ))
            })?;
        period.coupon_metrics(value_date, market, self.funding_curve(market)?)
    }

    /// Values the stream.
    ///
    /// Periods paying on or after the value date contribute
    /// `0.0001 * dcf * df(pay) * notional` of DV01 per channel, scaled by the
    /// channel's convexity multiplier, and that DV01 times the coupon rate in
    /// basis points of PV. The sums are divided once by the discount factor
    /// to the cash settle date. Accrued comes from the first live period.
    pub fn value(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
    ) -> ProductResult<StreamMeasures> {
        let timer = Instant::now();
        let value_date = valuation.value_date;
        ensure_live(value_date, self.maturity())?;
        let funding = self.funding_curve(market)?;

        let mut dv01 = [0.0_f64; 9];
        let mut pv = [0.0_f64; 9];
        let mut first: Option<FirstLive> = None;

        for period in self.periods.iter().filter(|p| p.pay() >= value_date) {
            let metrics = period.coupon_metrics(value_date, market, funding)?;
            let multipliers = if pricer.apply_convexity {
                period.convexity_multipliers(value_date, self.currency, &metrics, market)
            } else {
                ConvexityMultipliers::unity()
            };
            let notional = self.period_notional(period)?;
            let rate = metrics.coupon_rate;
            let period_dv01 = BP * period.dcf() * funding.df(period.pay())? * notional;

            for channel in ConvexityChannel::ALL {
                let channel_dv01 = period_dv01 * multipliers.get(channel);
                dv01[channel.slot()] += channel_dv01;
                pv[channel.slot()] += channel_dv01 * 10_000.0 * rate;
            }

            if first.is_none() {
                let accrued01 = BP * period.accrual_dcf(value_date)? * notional;
                first = Some(FirstLive {
                    accrued01,
                    accrued: accrued01 * 10_000.0 * rate,
                    reset_date: period.reset(),
                    reset_rate: metrics.index_rate,
                    total_coupon: rate,
                    period_dv01,
                });
            }
        }

        let first = first.ok_or_else(|| ProductError::invalid_stream("no period pays after the value date"))?;
        let cash_df = self.cash_settle_df(valuation, market)?;
        let value_notional = self.notional(value_date)?;

        let mut channels = [ChannelMeasures::default(); 9];
        for channel in ConvexityChannel::ALL {
            let slot = channel.slot();
            let dirty_dv01 = dv01[slot] / cash_df;
            let dirty_pv = pv[slot] / cash_df;
            let clean_dv01 = dirty_dv01 - first.accrued01;
            let clean_pv = dirty_pv - first.accrued;
            let annuity = nonzero(clean_dv01, &format!("{channel} clean DV01"))?;

            let priced = value_notional != 0.0;
            channels[slot] = ChannelMeasures {
                clean_dv01,
                clean_pv,
                dirty_dv01,
                dirty_pv,
                fair_premium: BP * clean_pv / annuity,
                upfront: priced.then(|| clean_pv / value_notional),
                clean_price: priced.then(|| quoting.price_scale * (1.0 + clean_pv / value_notional)),
                dirty_price: priced.then(|| quoting.price_scale * (1.0 + dirty_pv / value_notional)),
            };
        }

        let mut measures = StreamMeasures::new(
            channels,
            first.accrued,
            first.accrued01,
            first.reset_date,
            first.reset_rate,
            first.total_coupon,
            first.period_dv01 / cash_df,
            cash_df,
        );
        measures.calc_time = timer.elapsed().as_secs_f64();
        Ok(measures)
    }

    /// Values the stream into named measures.
    pub fn value_map(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
    ) -> ProductResult<ValueMap> {
        Ok(self.value(valuation, pricer, market, quoting)?.to_value_map())
    }

    /// One named measure.
    pub fn measure_value(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
        name: &str,
    ) -> ProductResult<f64> {
        self.value_map(valuation, pricer, market, quoting)?
            .get(name)
            .ok_or_else(|| ProductError::UnknownMeasure { name: name.to_string() })
    }

    /// Copy of the stream with every period mapped through `f`.
    ///
    /// `f` must keep period dates, so contiguity still holds.
    #[must_use]
    pub(crate) fn map_periods(&self, f: impl Fn(&Period) -> Period) -> Self {
        Self {
            periods: self.periods.iter().map(f).collect(),
            ..self.clone()
        }
    }

    /// Fallible [`GenericStream::map_periods`].
    pub(crate) fn try_map_periods(&self, f: impl Fn(&Period) -> ProductResult<Period>) -> ProductResult<Self> {
        Ok(Self {
            periods: self.periods.iter().map(f).collect::<ProductResult<_>>()?,
            ..self.clone()
        })
    }
}
