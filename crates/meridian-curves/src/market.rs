//! Market data bundle handed to valuation calls.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use meridian_core::types::{Currency, Date};

use crate::traits::{DiscountCurve, ForwardCurve};
use crate::volatility::VolatilityTermStructure;

/// A latent state that can carry volatility in convexity adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LatentStateLabel {
    /// Funding (discount) state of a currency.
    Funding(Currency),
    /// Forward state of an index, keyed by index label.
    Forward(String),
    /// Credit state of an issuer in a currency.
    Credit(Currency),
    /// FX state of a currency against the base.
    Fx(Currency),
}

impl fmt::Display for LatentStateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatentStateLabel::Funding(ccy) => write!(f, "FUNDING::{ccy}"),
            LatentStateLabel::Forward(index) => write!(f, "FORWARD::{index}"),
            LatentStateLabel::Credit(ccy) => write!(f, "CREDIT::{ccy}"),
            LatentStateLabel::Fx(ccy) => write!(f, "FX::{ccy}"),
        }
    }
}

/// Curves, fixings and volatility surfaces for one valuation.
///
/// Curves are shared read-only through `Arc`; a calibration loop that owns a
/// curve republishes it with [`set_funding_curve`](Self::set_funding_curve)
/// between iterations.
#[derive(Debug, Clone, Default)]
pub struct MarketParams {
    funding_curves: HashMap<Currency, Arc<dyn DiscountCurve>>,
    forward_curves: HashMap<String, Arc<dyn ForwardCurve>>,
    fixings: BTreeMap<(String, Date), f64>,
    volatilities: HashMap<LatentStateLabel, VolatilityTermStructure>,
    correlations: HashMap<(LatentStateLabel, LatentStateLabel), f64>,
}

impl MarketParams {
    /// Empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_funding_curve`](Self::set_funding_curve).
    #[must_use]
    pub fn with_funding_curve(mut self, curve: Arc<dyn DiscountCurve>) -> Self {
        self.set_funding_curve(curve);
        self
    }

    /// Builder form of [`set_forward_curve`](Self::set_forward_curve).
    #[must_use]
    pub fn with_forward_curve(mut self, curve: Arc<dyn ForwardCurve>) -> Self {
        self.set_forward_curve(curve);
        self
    }

    /// Registers the funding curve for the curve's currency, replacing any previous one.
    pub fn set_funding_curve(&mut self, curve: Arc<dyn DiscountCurve>) {
        self.funding_curves.insert(curve.currency(), curve);
    }

    /// Registers a forward curve under its index label.
    pub fn set_forward_curve(&mut self, curve: Arc<dyn ForwardCurve>) {
        self.forward_curves.insert(curve.index().label(), curve);
    }

    /// Funding curve of `currency`.
    #[must_use]
    pub fn funding_curve(&self, currency: Currency) -> Option<&dyn DiscountCurve> {
        self.funding_curves.get(&currency).map(|curve| &**curve)
    }

    /// Forward curve registered under `index_label`.
    #[must_use]
    pub fn forward_curve(&self, index_label: &str) -> Option<&dyn ForwardCurve> {
        self.forward_curves.get(index_label).map(|curve| &**curve)
    }

    /// Records an index fixing.
    pub fn add_fixing(&mut self, index_label: impl Into<String>, date: Date, rate: f64) {
        self.fixings.insert((index_label.into(), date), rate);
    }

    /// Fixing of `index_label` on `date`.
    #[must_use]
    pub fn fixing(&self, index_label: &str, date: Date) -> Option<f64> {
        self.fixings.get(&(index_label.to_string(), date)).copied()
    }

    /// Registers the volatility of a latent state.
    pub fn set_volatility(&mut self, label: LatentStateLabel, vts: VolatilityTermStructure) {
        self.volatilities.insert(label, vts);
    }

    /// Volatility of a latent state.
    #[must_use]
    pub fn volatility(&self, label: &LatentStateLabel) -> Option<&VolatilityTermStructure> {
        self.volatilities.get(label)
    }

    /// Registers a correlation; symmetric in its arguments.
    pub fn set_correlation(&mut self, a: LatentStateLabel, b: LatentStateLabel, rho: f64) {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.correlations.insert(key, rho);
    }

    /// Correlation between two latent states; a state is fully correlated with itself.
    #[must_use]
    pub fn correlation(&self, a: &LatentStateLabel, b: &LatentStateLabel) -> Option<f64> {
        if a == b {
            return Some(1.0);
        }
        let key = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        self.correlations.get(&key).copied()
    }
}
