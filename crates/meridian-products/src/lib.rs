//! # Meridian Products
//!
//! Cash-flow stream valuation and curve-calibration constraints for rates
//! instruments.
//!
//! - **Streams**: [`GenericStream`], [`FixedStream`] and [`FloatingStream`]
//!   aggregate discounted period cash flows into PV, DV01 and par measures
//!   across eight convexity channels
//! - **Jacobians**: curve sensitivities of dirty PV and par rates, chained
//!   from the curve's own node Jacobians
//! - **Constraints**: [`PredictorResponseWeightConstraint`]s that a
//!   calibrator solves for the funding or forward latent state
//! - **Components**: deposits, FRAs, futures, fix-float and float-float swaps
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use meridian_core::daycounts::DayCountConvention;
//! use meridian_core::types::{Currency, Date, Frequency};
//! use meridian_curves::{MarketParams, ZeroNodeCurve};
//! use meridian_products::prelude::*;
//!
//! let today = Date::from_ymd(2025, 1, 2).unwrap();
//! let curve = ZeroNodeCurve::flat(today, Currency::USD, 0.04, &[Date::from_ymd(2030, 1, 2).unwrap()]).unwrap();
//! let market = MarketParams::new().with_funding_curve(Arc::new(curve));
//!
//! let schedule = Schedule::new(
//!     Date::from_ymd(2025, 1, 6).unwrap(),
//!     Date::from_ymd(2028, 1, 6).unwrap(),
//!     Frequency::SemiAnnual,
//! );
//! let leg = FixedStream::new(Currency::USD, 1e6, &schedule, DayCountConvention::Thirty360US, 0.04).unwrap();
//! let measures = leg
//!     .value(
//!         &ValuationParams::spot(today),
//!         &PricerParams::default(),
//!         &market,
//!         &QuotingParams::default(),
//!     )
//!     .unwrap();
//!
//! assert!((measures.fair_premium() - 0.04).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_arguments)]

pub mod calibration;
pub mod components;
pub mod config;
pub mod error;
pub mod factor;
pub mod measures;
pub mod params;
pub mod period;
pub mod schedule;
pub mod stream;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calibration::{
        BasisLeg, LatentState, PredictorResponseWeightConstraint, ProductQuoteSet, Quote, QuoteKind,
    };
    pub use crate::components::{
        value_components, Component, DepositComponent, FixFloatComponent, FloatFloatComponent, FraComponent,
        FuturesComponent, IrsComponent,
    };
    pub use crate::config::{Validate, ValuationConfig};
    pub use crate::error::{ProductError, ProductResult};
    pub use crate::factor::FactorSchedule;
    pub use crate::measures::{ChannelMeasures, ConvexityChannel, StreamMeasures, ValueMap};
    pub use crate::params::{CashSettleParams, PricerParams, QuotingParams, ValuationParams};
    pub use crate::period::{CompoundingMethod, CouponSpec, Period};
    pub use crate::schedule::Schedule;
    pub use crate::stream::{FixedStream, FloatingStream, GenericStream, Stream};
}

pub use calibration::{LatentState, PredictorResponseWeightConstraint, ProductQuoteSet, Quote};
pub use components::{Component, DepositComponent, FixFloatComponent, FloatFloatComponent, FraComponent, FuturesComponent};
pub use error::{ProductError, ProductResult};
pub use measures::{StreamMeasures, ValueMap};
pub use stream::{FixedStream, FloatingStream, GenericStream, Stream};
