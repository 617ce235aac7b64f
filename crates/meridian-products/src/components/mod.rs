//! Calibration instruments.
//!
//! A component owns one or two streams (or a single period) and is what a
//! calibrator sees: it values itself into a [`ValueMap`], reports its curve
//! Jacobian and turns its market quote into a
//! [`PredictorResponseWeightConstraint`].

pub mod deposit;
pub mod fix_float;
pub mod float_float;
pub mod fra;
pub mod futures;

use std::fmt;

pub use deposit::DepositComponent;
pub use fix_float::{FixFloatComponent, IrsComponent, SwapMeasures};
pub use float_float::{BasisSwapMeasures, FloatFloatComponent};
pub use fra::FraComponent;
pub use futures::FuturesComponent;

use log::warn;

use meridian_core::types::{Currency, Date};
use meridian_curves::{MarketParams, WengertJacobian};

use crate::calibration::{LatentState, PredictorResponseWeightConstraint, ProductQuoteSet};
use crate::error::{ProductError, ProductResult};
use crate::measures::ValueMap;
use crate::params::{PricerParams, QuotingParams, ValuationParams};

/// The calibration-instrument contract.
pub trait Component: fmt::Debug + Send + Sync {
    /// Instrument name, e.g. `"USD.IRS.5Y"`.
    fn name(&self) -> &str;

    /// Instrument currency.
    fn currency(&self) -> Currency;

    /// First accrual date.
    fn effective(&self) -> Date;

    /// Last accrual date.
    fn maturity(&self) -> Date;

    /// Signed notional at inception.
    fn initial_notional(&self) -> f64;

    /// Values the instrument into named measures.
    fn value_map(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
    ) -> ProductResult<ValueMap>;

    /// One named measure.
    fn measure_value(
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

    /// `d DirtyPV / d measure` against the funding curve, per unit notional.
    fn jack_d_dirty_pv_d_manifest_measure(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        measure: &str,
    ) -> ProductResult<WengertJacobian>;

    /// Calibration constraint for `state` from the instrument's quote.
    fn generate_calib_prwc(
        &self,
        valuation: &ValuationParams,
        pricer: &PricerParams,
        market: &MarketParams,
        quoting: &QuotingParams,
        state: LatentState,
        quotes: &ProductQuoteSet,
    ) -> ProductResult<PredictorResponseWeightConstraint>;
}

/// Logs a failed component operation before handing the error back.
pub(crate) fn logged<T>(component: &str, operation: &str, result: ProductResult<T>) -> ProductResult<T> {
    if let Err(err) = &result {
        warn!("{component}: {operation} aborted: {err}");
    }
    result
}

/// Values every component against one frozen market.
///
/// With the `parallel` feature the components are valued on the rayon pool.
/// Results come back in input order; one failure does not stop the others.
pub fn value_components(
    components: &[Box<dyn Component>],
    valuation: &ValuationParams,
    pricer: &PricerParams,
    market: &MarketParams,
    quoting: &QuotingParams,
) -> Vec<ProductResult<ValueMap>> {
    let value = |c: &dyn Component| c.value_map(valuation, pricer, market, quoting);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        components.par_iter().map(|c| value(c.as_ref())).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        components.iter().map(|c| value(c.as_ref())).collect()
    }
}

/// Fails with `IncompatibleParameterSpace` unless both legs share a currency.
pub(crate) fn ensure_same_currency(name: &str, a: Currency, b: Currency) -> ProductResult<()> {
    if a == b {
        Ok(())
    } else {
        Err(ProductError::IncompatibleParameterSpace {
            reason: format!("{name} legs are in {a} and {b}"),
        })
    }
}

/// `(J1 + J2) / |notional|`, rejecting legs of different widths.
pub(crate) fn combine_leg_jacobians(
    first: &WengertJacobian,
    second: &WengertJacobian,
    notional: f64,
) -> ProductResult<WengertJacobian> {
    if first.cols() != second.cols() {
        return Err(ProductError::IncompatibleParameterSpace {
            reason: format!(
                "leg jacobians have {} and {} parameters",
                first.cols(),
                second.cols()
            ),
        });
    }
    let scale = crate::error::nonzero(notional.abs(), "component notional")?;
    Ok(first.add(second)?.scaled(1.0 / scale))
}

/// Forward constraint `{end: 1}` with target `rate`, recording
/// `d target / d measure`.
pub(crate) fn point_forward_prwc(
    end: Date,
    rate: f64,
    measure: &str,
    d_rate_d_quote: f64,
) -> PredictorResponseWeightConstraint {
    let mut prwc = PredictorResponseWeightConstraint::new();
    prwc.add_predictor_response_weight(end, 1.0);
    prwc.update_value(rate);
    prwc.update_d_value_d_manifest_measure(measure, d_rate_d_quote);
    prwc
}
