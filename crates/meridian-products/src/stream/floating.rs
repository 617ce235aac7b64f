//! Floating-coupon leg.

use serde::{Deserialize, Serialize};

use meridian_core::types::{FloatingRateIndex, Frequency};

use super::{GenericStream, Stream};
use crate::error::ProductResult;
use crate::factor::FactorSchedule;
use crate::params::CashSettleParams;
use crate::period::{CompoundingMethod, CouponSpec, Period};
use crate::schedule::Schedule;

/// A leg paying an index rate plus a constant spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingStream {
    stream: GenericStream,
    spread: f64,
}

impl FloatingStream {
    /// Bullet-notional floating leg in the index currency.
    pub fn new(notional: f64, schedule: &Schedule, index: FloatingRateIndex, spread: f64) -> ProductResult<Self> {
        Self::amortizing(notional, schedule, index, spread, FactorSchedule::bullet())
    }

    /// Floating leg whose notional follows `factors`.
    pub fn amortizing(
        notional: f64,
        schedule: &Schedule,
        index: FloatingRateIndex,
        spread: f64,
        factors: FactorSchedule,
    ) -> ProductResult<Self> {
        let currency = index.currency;
        let periods = schedule
            .periods()?
            .into_iter()
            .map(|a| Period::floating(a.start, a.end, a.pay, index.clone(), spread))
            .collect::<ProductResult<Vec<_>>>()?;
        Ok(Self {
            stream: GenericStream::new(currency, notional, periods, factors)?,
            spread,
        })
    }

    /// Compounds the index over sub-periods of `frequency` in every period.
    pub fn with_compounding(self, method: CompoundingMethod, frequency: Frequency) -> ProductResult<Self> {
        Ok(Self {
            stream: self
                .stream
                .try_map_periods(|p| p.clone().with_compounding(method, frequency))?,
            spread: self.spread,
        })
    }

    /// Settles cash with a lag from the value date.
    #[must_use]
    pub fn with_cash_settle(mut self, params: CashSettleParams) -> Self {
        self.stream = self.stream.with_cash_settle(params);
        self
    }

    /// Spread over the index (decimal).
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Same leg at a different spread.
    #[must_use]
    pub fn with_spread(&self, spread: f64) -> Self {
        Self {
            stream: self.stream.map_periods(|p| match p.coupon() {
                CouponSpec::Floating { index, .. } => p.clone().with_coupon(CouponSpec::Floating {
                    index: index.clone(),
                    spread,
                }),
                CouponSpec::Fixed { .. } => p.clone(),
            }),
            spread,
        }
    }
}

impl Stream for FloatingStream {
    fn generic(&self) -> &GenericStream {
        &self.stream
    }
}
