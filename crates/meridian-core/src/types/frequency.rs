//! Coupon frequency.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment frequency of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Frequency {
    /// Annual payments (1 per year)
    Annual,
    /// Semi-annual payments (2 per year)
    #[default]
    SemiAnnual,
    /// Quarterly payments (4 per year)
    Quarterly,
    /// Monthly payments (12 per year)
    Monthly,
    /// Single payment at maturity
    Zero,
}

impl Frequency {
    /// Returns the number of periods per year.
    #[must_use]
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::Zero => 0,
        }
    }

    /// Returns the number of months per period (0 for a single bullet period).
    #[must_use]
    pub fn months_per_period(&self) -> u32 {
        match self {
            Frequency::Annual => 12,
            Frequency::SemiAnnual => 6,
            Frequency::Quarterly => 3,
            Frequency::Monthly => 1,
            Frequency::Zero => 0,
        }
    }

    /// Returns true for a single-period (bullet) schedule.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Frequency::Zero)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Annual => "Annual",
            Frequency::SemiAnnual => "Semi-Annual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
            Frequency::Zero => "Zero Coupon",
        };
        write!(f, "{name}")
    }
}
