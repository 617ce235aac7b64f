//! Error types for core date, tenor and day count operations.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The error type for core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid or out-of-range date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// Tenor string could not be parsed.
    #[error("Invalid tenor: {tenor}")]
    InvalidTenor {
        /// The offending tenor text.
        tenor: String,
    },

    /// Day count calculation error.
    #[error("Day count error: {reason}")]
    DayCountError {
        /// Description of the error.
        reason: String,
    },

    /// Currency code is not supported.
    #[error("Unknown currency: {code}")]
    UnknownCurrency {
        /// The offending currency code.
        code: String,
    },

    /// Calendar or business day error.
    #[error("Calendar error: {reason}")]
    CalendarError {
        /// Description of the error.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid tenor error.
    #[must_use]
    pub fn invalid_tenor(tenor: impl Into<String>) -> Self {
        Self::InvalidTenor {
            tenor: tenor.into(),
        }
    }

    /// Creates a day count error.
    #[must_use]
    pub fn day_count(reason: impl Into<String>) -> Self {
        Self::DayCountError {
            reason: reason.into(),
        }
    }
}
