//! Cash-flow streams.
//!
//! A stream is one leg: an ordered, contiguous list of [`Period`]s in one
//! currency. [`GenericStream`] carries the valuation, Jacobian and
//! constraint logic; [`FixedStream`] and [`FloatingStream`] build it from a
//! schedule and expose leg-specific helpers.

mod constraint;
pub mod fixed;
pub mod floating;
pub mod generic;
mod jacobian;

use std::fmt;

pub use fixed::FixedStream;
pub use floating::FloatingStream;
pub use generic::GenericStream;

use meridian_core::types::{Currency, Date, FloatingRateIndex};
use meridian_curves::{MarketParams, WengertJacobian};

use crate::error::ProductResult;
use crate::measures::{StreamMeasures, ValueMap};
use crate::params::{PricerParams, QuotingParams, ValuationParams};
use crate::period::{CouponMetrics, Period};

/// The leg contract shared by every stream type.
///
/// Implementors only provide [`Stream::generic`]; every other method
/// delegates to the underlying [`GenericStream`].
pub trait Stream: fmt::Debug + Send + Sync {
    /// The period aggregator backing this leg.
    fn generic(&self) -> &GenericStream;

    /// Stream currency.
    fn currency(&self) -> Currency {
        self.generic().currency()
    }

    /// Signed initial notional.
    fn initial_notional(&self) -> f64 {
        self.generic().initial_notional()
    }

    /// Periods in order.
    fn periods(&self) -> &[Period] {
        self.generic().periods()
    }

    /// Floating index, `None` for a fixed leg.
    fn index(&self) -> Option<&FloatingRateIndex> {
        self.generic().index()
    }

    /// Start of the first period.
    fn effective(&self) -> Date {
        self.generic().effective()
    }

    /// End of the last period.
    fn maturity(&self) -> Date {
        self.generic().maturity()
    }

    /// Pay date of the first period.
    fn first_coupon_date(&self) -> Date {
        self.generic().first_coupon_date()
    }

    /// Notional in force on `date`.
    fn notional(&self, date: Date) -> ProductResult<f64> {
        self.generic().notional(date)
    }

    /// Average notional over `[start, end)`.
    fn notional_between(&self, start: Date, end: Date) -> ProductResult<f64> {
        self.generic().notional_between(start, end)
    }

    /// Coupon metrics of the period accruing on `date`.
    fn coupon(&self, date: Date, value_date: Date, market: &MarketParams) -> ProductResult<CouponMetrics> {
        self.generic().coupon(date, value_date, market)
    }

    /// Values the leg.
    fn value(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
    ) -> ProductResult<StreamMeasures> {
        self.generic().value(valuation, pricer, market, quoting)
    }

    /// Values the leg into named measures.
    fn value_map(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
    ) -> ProductResult<ValueMap> {
        self.generic().value_map(valuation, pricer, market, quoting)
    }

    /// One named measure, as a calibrator reads it.
    fn calib_measure_value(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
        name: &str,
    ) -> ProductResult<f64> {
        self.generic().measure_value(valuation, pricer, market, quoting, name)
    }

    /// Names of every measure [`Stream::value_map`] produces.
    fn measure_names(&self) -> Vec<String> {
        StreamMeasures::measure_names()
    }

    /// `d DirtyPV / d measure` against the funding curve.
    fn jack_d_dirty_pv_d_manifest_measure(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        self.generic()
            .jack_d_dirty_pv_d_manifest_measure(valuation, pricer, market, measure)
    }

    /// `d measure_name / d measure` for a quoted leg measure.
    fn manifest_measure_df_micro_jack(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        measure_name: &str,
        measure: &str,
    ) -> ProductResult<WengertJacobian> {
        self.generic()
            .manifest_measure_df_micro_jack(valuation, pricer, market, measure_name, measure)
    }
}

impl Stream for GenericStream {
    fn generic(&self) -> &GenericStream {
        self
    }
}
