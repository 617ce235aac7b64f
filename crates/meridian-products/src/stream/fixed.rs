//! Fixed-coupon leg.

use serde::{Deserialize, Serialize};

use meridian_core::daycounts::DayCountConvention;
use meridian_core::types::Currency;

use super::{GenericStream, Stream};
use crate::error::ProductResult;
use crate::factor::FactorSchedule;
use crate::params::CashSettleParams;
use crate::period::{CouponSpec, Period};
use crate::schedule::Schedule;

/// A leg paying a constant fixed coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedStream {
    stream: GenericStream,
    coupon: f64,
}

impl FixedStream {
    /// Bullet-notional fixed leg over a schedule.
    pub fn new(
        currency: Currency,
        notional: f64,
        schedule: &Schedule,
        day_count: DayCountConvention,
        coupon: f64,
    ) -> ProductResult<Self> {
        Self::amortizing(currency, notional, schedule, day_count, coupon, FactorSchedule::bullet())
    }

    /// Fixed leg whose notional follows `factors`.
    pub fn amortizing(
        currency: Currency,
        notional: f64,
        schedule: &Schedule,
        day_count: DayCountConvention,
        coupon: f64,
        factors: FactorSchedule,
    ) -> ProductResult<Self> {
        let periods = schedule
            .periods()?
            .into_iter()
            .map(|a| Period::fixed(a.start, a.end, a.pay, day_count, coupon))
            .collect::<ProductResult<Vec<_>>>()?;
        Ok(Self {
            stream: GenericStream::new(currency, notional, periods, factors)?,
            coupon,
        })
    }

    /// Settles cash with a lag from the value date.
    #[must_use]
    pub fn with_cash_settle(mut self, params: CashSettleParams) -> Self {
        self.stream = self.stream.with_cash_settle(params);
        self
    }

    /// Fixed coupon rate.
    #[must_use]
    pub fn coupon_rate(&self) -> f64 {
        self.coupon
    }

    /// Same leg paying `coupon` instead.
    #[must_use]
    pub fn with_coupon(&self, coupon: f64) -> Self {
        Self {
            stream: self
                .stream
                .map_periods(|p| p.clone().with_coupon(CouponSpec::Fixed { rate: coupon })),
            coupon,
        }
    }
}

impl Stream for FixedStream {
    fn generic(&self) -> &GenericStream {
        &self.stream
    }
}
