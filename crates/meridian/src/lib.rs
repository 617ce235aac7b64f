//! # Meridian
//!
//! Rates analytics in one dependency: cash-flow stream valuation, curve
//! Jacobians and calibration constraints.
//!
//! This crate only re-exports the workspace crates:
//!
//! - [`meridian_core`]: dates, currencies, rate indices, day counts and calendars
//! - [`meridian_curves`]: the curve provider contract, Wengert Jacobians and market data
//! - [`meridian_products`]: streams, components and calibration constraints
//!
//! ```rust
//! use meridian::prelude::*;
//!
//! let date = Date::from_ymd(2025, 1, 2).unwrap();
//! let quotes = ProductQuoteSet::single(Quote::Rate(0.04));
//! assert_eq!(quotes.quotes().len(), 1);
//! assert_eq!(date.year(), 2025);
//! ```

#![warn(missing_docs)]

pub use meridian_core;
pub use meridian_curves;
pub use meridian_products;

/// Everything a typical valuation or calibration run needs.
pub mod prelude {
    pub use meridian_core::daycounts::DayCountConvention;
    pub use meridian_core::types::{Currency, Date, FloatingRateIndex, Frequency};
    pub use meridian_curves::prelude::*;
    pub use meridian_products::prelude::*;
}
