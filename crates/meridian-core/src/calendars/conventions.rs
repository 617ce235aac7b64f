//! Business day roll conventions.

use serde::{Deserialize, Serialize};

use super::Calendar;
use crate::error::CoreError;
use crate::types::Date;

/// How a date falling on a non-business day is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BusinessDayConvention {
    /// No adjustment.
    Unadjusted,

    /// Next business day.
    #[default]
    Following,

    /// Next business day unless that crosses a month end, then the preceding one.
    ModifiedFollowing,

    /// Previous business day.
    Preceding,

    /// Previous business day unless that crosses a month start, then the following one.
    ModifiedPreceding,
}

impl std::fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BusinessDayConvention::Unadjusted => "Unadjusted",
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "Modified Following",
            BusinessDayConvention::Preceding => "Preceding",
            BusinessDayConvention::ModifiedPreceding => "Modified Preceding",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for BusinessDayConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "unadjusted" | "none" => Ok(BusinessDayConvention::Unadjusted),
            "following" | "f" => Ok(BusinessDayConvention::Following),
            "modifiedfollowing" | "mf" => Ok(BusinessDayConvention::ModifiedFollowing),
            "preceding" | "p" => Ok(BusinessDayConvention::Preceding),
            "modifiedpreceding" | "mp" => Ok(BusinessDayConvention::ModifiedPreceding),
            _ => Err(CoreError::CalendarError {
                reason: format!("unknown business day convention: {s}"),
            }),
        }
    }
}

/// Rolls `date` onto a business day of `calendar`.
pub(crate) fn adjust<C: Calendar + ?Sized>(
    date: Date,
    convention: BusinessDayConvention,
    calendar: &C,
) -> Date {
    if calendar.is_business_day(date) {
        return date;
    }

    match convention {
        BusinessDayConvention::Unadjusted => date,

        BusinessDayConvention::Following => following(date, calendar),

        BusinessDayConvention::ModifiedFollowing => {
            let adjusted = following(date, calendar);
            if adjusted.month() == date.month() {
                adjusted
            } else {
                preceding(date, calendar)
            }
        }

        BusinessDayConvention::Preceding => preceding(date, calendar),

        BusinessDayConvention::ModifiedPreceding => {
            let adjusted = preceding(date, calendar);
            if adjusted.month() == date.month() {
                adjusted
            } else {
                following(date, calendar)
            }
        }
    }
}

fn following<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(1);
    }
    date
}

fn preceding<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(-1);
    }
    date
}
