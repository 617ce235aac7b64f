//! Domain types.

mod currency;
mod date;
mod frequency;
mod index;
mod tenor;

pub use currency::Currency;
pub use date::{days_in_month, Date};
pub use frequency::Frequency;
pub use index::FloatingRateIndex;
pub use tenor::{Tenor, TenorUnit};
