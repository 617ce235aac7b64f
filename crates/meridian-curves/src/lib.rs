//! # Meridian Curves
//!
//! Curve provider contract and market data for the Meridian rates library.
//!
//! - **Traits**: [`DiscountCurve`] and [`ForwardCurve`], the only way streams see curves
//! - **Jacobians**: [`WengertJacobian`], dense forward-mode sensitivities
//! - **Curves**: [`ZeroNodeCurve`] and [`NodeForwardCurve`] node curves
//! - **Volatility**: [`VolatilityTermStructure`] for convexity adjustments
//! - **Market**: [`MarketParams`], curves, fixings and correlations for one valuation
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use meridian_core::types::{Currency, Date};
//! use meridian_curves::prelude::*;
//!
//! let today = Date::from_ymd(2025, 1, 2).unwrap();
//! let curve = ZeroNodeCurve::flat(
//!     today,
//!     Currency::USD,
//!     0.04,
//!     &[Date::from_ymd(2030, 1, 2).unwrap()],
//! )
//! .unwrap();
//!
//! let df = curve.df(Date::from_ymd(2026, 1, 2).unwrap()).unwrap();
//! assert!((df - (-0.04f64).exp()).abs() < 1e-12);
//!
//! let market = MarketParams::new().with_funding_curve(Arc::new(curve));
//! assert!(market.funding_curve(Currency::USD).is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]

pub mod curves;
pub mod error;
pub mod jacobian;
pub mod market;
pub mod traits;
pub mod volatility;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::curves::{NodeForwardCurve, ZeroNodeCurve, FORWARD_RATE_MEASURE, ZERO_RATE_MEASURE};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::jacobian::WengertJacobian;
    pub use crate::market::{LatentStateLabel, MarketParams};
    pub use crate::traits::{curve_time, DiscountCurve, ForwardCurve};
    pub use crate::volatility::VolatilityTermStructure;
}

pub use curves::{NodeForwardCurve, ZeroNodeCurve};
pub use error::{CurveError, CurveResult};
pub use jacobian::WengertJacobian;
pub use market::{LatentStateLabel, MarketParams};
pub use traits::{DiscountCurve, ForwardCurve};
pub use volatility::VolatilityTermStructure;
