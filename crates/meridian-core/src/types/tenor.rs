//! Tenors ("3M", "1Y", "ON") and date advancement.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Date;
use crate::error::{CoreError, CoreResult};

/// Unit of a [`Tenor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TenorUnit {
    /// Calendar days
    Day,
    /// Weeks of seven days
    Week,
    /// Calendar months
    Month,
    /// Calendar years
    Year,
}

/// A length of time expressed in market terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tenor {
    /// Number of units.
    pub count: u32,
    /// The unit.
    pub unit: TenorUnit,
}

impl Tenor {
    /// Creates a tenor.
    #[must_use]
    pub const fn new(count: u32, unit: TenorUnit) -> Self {
        Self { count, unit }
    }

    /// Tenor of `n` months.
    #[must_use]
    pub const fn months(n: u32) -> Self {
        Self::new(n, TenorUnit::Month)
    }

    /// Tenor of `n` years.
    #[must_use]
    pub const fn years(n: u32) -> Self {
        Self::new(n, TenorUnit::Year)
    }

    /// Overnight (one day).
    #[must_use]
    pub const fn overnight() -> Self {
        Self::new(1, TenorUnit::Day)
    }

    /// Advances `date` by this tenor (unadjusted).
    pub fn advance(&self, date: Date) -> CoreResult<Date> {
        let n = self.count as i32;
        match self.unit {
            TenorUnit::Day => Ok(date.add_days(i64::from(n))),
            TenorUnit::Week => Ok(date.add_days(7 * i64::from(n))),
            TenorUnit::Month => date.add_months(n),
            TenorUnit::Year => date.add_years(n),
        }
    }

    /// Approximate length in years.
    #[must_use]
    pub fn year_fraction(&self) -> f64 {
        let n = f64::from(self.count);
        match self.unit {
            TenorUnit::Day => n / 365.0,
            TenorUnit::Week => 7.0 * n / 365.0,
            TenorUnit::Month => n / 12.0,
            TenorUnit::Year => n,
        }
    }
}

impl FromStr for Tenor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_uppercase();
        match text.as_str() {
            "ON" | "O/N" => return Ok(Self::overnight()),
            "TN" | "T/N" => return Ok(Self::new(2, TenorUnit::Day)),
            _ => {}
        }

        let Some(last) = text.chars().last() else {
            return Err(CoreError::invalid_tenor(s));
        };
        let unit = match last {
            'D' => TenorUnit::Day,
            'W' => TenorUnit::Week,
            'M' => TenorUnit::Month,
            'Y' => TenorUnit::Year,
            _ => return Err(CoreError::invalid_tenor(s)),
        };
        let count: u32 = text[..text.len() - 1]
            .parse()
            .map_err(|_| CoreError::invalid_tenor(s))?;
        if count == 0 {
            return Err(CoreError::invalid_tenor(s));
        }
        Ok(Self::new(count, unit))
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TenorUnit::Day => 'D',
            TenorUnit::Week => 'W',
            TenorUnit::Month => 'M',
            TenorUnit::Year => 'Y',
        };
        write!(f, "{}{unit}", self.count)
    }
}
