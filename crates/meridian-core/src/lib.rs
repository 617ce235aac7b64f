//! # Meridian Core
//!
//! Foundational types for the Meridian rates analytics library.
//!
//! - **Types**: [`Date`], [`Currency`], [`Frequency`], [`Tenor`], [`FloatingRateIndex`]
//! - **Day Count Conventions**: accrual fractions between two dates
//! - **Business Day Calendars**: weekend calendar and roll conventions
//!
//! ## Example
//!
//! ```rust
//! use meridian_core::prelude::*;
//!
//! let start = Date::from_ymd(2025, 1, 15).unwrap();
//! let end = start.add_months(6).unwrap();
//! let dcf = DayCountConvention::Act360.year_fraction_f64(start, end).unwrap();
//! assert!(dcf > 0.49 && dcf < 0.51);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]

pub mod calendars;
pub mod daycounts;
pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calendars::{BusinessDayConvention, Calendar, HolidayCalendar, WeekendCalendar};
    pub use crate::daycounts::{DayCount, DayCountConvention};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{Currency, Date, FloatingRateIndex, Frequency, Tenor};
}

pub use error::{CoreError, CoreResult};
pub use types::{Currency, Date, FloatingRateIndex, Frequency, Tenor};
