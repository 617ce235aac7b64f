//! Error types for product valuation and calibration.

use meridian_core::types::{Currency, Date};
use meridian_core::CoreError;
use meridian_curves::CurveError;
use thiserror::Error;

/// A specialized Result type for product operations.
pub type ProductResult<T> = Result<T, ProductError>;

/// Errors raised while valuing streams and components or building constraints.
///
/// Valuation and constraint generation fail closed: any of these aborts the
/// whole call and no partial measures or constraints are returned.
#[derive(Error, Debug, Clone)]
pub enum ProductError {
    /// No funding curve is registered for the currency.
    #[error("No funding curve for {currency}")]
    MissingCurve {
        /// Currency whose curve is missing.
        currency: Currency,
    },

    /// Period or instrument dates are out of order.
    #[error("Invalid date ordering: {reason}")]
    InvalidDateOrdering {
        /// Description of the violation.
        reason: String,
    },

    /// Notional could not be resolved on a date.
    #[error("Unresolvable notional on {date}")]
    UnresolvableNotional {
        /// Date of the lookup.
        date: Date,
    },

    /// The quote set does not carry exactly one usable quote.
    #[error("Quote type mismatch for {instrument}: {reason}")]
    QuoteTypeMismatch {
        /// Instrument name.
        instrument: String,
        /// What was wrong with the quote set.
        reason: String,
    },

    /// An arithmetic step left its domain (zero annuity, non-positive discount factor, ...).
    #[error("Arithmetic domain error: {reason}")]
    ArithmeticDomainError {
        /// Description of the failing operation.
        reason: String,
    },

    /// The instrument has matured or settled as of the value date.
    #[error("Instrument expired: value date {value_date} is not before {boundary}")]
    Expired {
        /// Valuation date.
        value_date: Date,
        /// Maturity, or effective date for forward-starting instruments.
        boundary: Date,
    },

    /// A period has reset but no fixing is available.
    #[error("Missing fixing for {index} on {date}")]
    MissingFixing {
        /// Index label.
        index: String,
        /// Fixing date.
        date: Date,
    },

    /// The stream violates a structural invariant.
    #[error("Invalid stream: {reason}")]
    InvalidStream {
        /// Description of the violation.
        reason: String,
    },

    /// No period produced a sensitivity for the requested measure.
    #[error("Jacobian unavailable for manifest measure {measure}")]
    JacobianUnavailable {
        /// Manifest measure name.
        measure: String,
    },

    /// Period Jacobians disagree on the curve parameter count.
    #[error("Jacobian dimension mismatch: expected {expected} parameters, got {got}")]
    JacobianDimensionMismatch {
        /// Width of the first contributing Jacobian.
        expected: usize,
        /// Width of the offending Jacobian.
        got: usize,
    },

    /// Leg Jacobians live in different parameter spaces and cannot be combined.
    #[error("Incompatible parameter space: {reason}")]
    IncompatibleParameterSpace {
        /// Description of the incompatibility.
        reason: String,
    },

    /// The component cannot generate a constraint for the latent state.
    #[error("{component} does not calibrate the {state} latent state")]
    UnsupportedLatentState {
        /// Component name.
        component: String,
        /// Latent state name.
        state: String,
    },

    /// Measure name not produced by the instrument.
    #[error("Unknown measure: {name}")]
    UnknownMeasure {
        /// Requested name.
        name: String,
    },

    /// Error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from the curves crate.
    #[error(transparent)]
    Curve(#[from] CurveError),
}

impl ProductError {
    /// Creates an invalid date ordering error.
    #[must_use]
    pub fn date_ordering(reason: impl Into<String>) -> Self {
        Self::InvalidDateOrdering {
            reason: reason.into(),
        }
    }

    /// Creates an arithmetic domain error.
    #[must_use]
    pub fn domain(reason: impl Into<String>) -> Self {
        Self::ArithmeticDomainError {
            reason: reason.into(),
        }
    }

    /// Creates an invalid stream error.
    #[must_use]
    pub fn invalid_stream(reason: impl Into<String>) -> Self {
        Self::InvalidStream {
            reason: reason.into(),
        }
    }

    /// Creates a quote type mismatch error.
    #[must_use]
    pub fn quote_mismatch(instrument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QuoteTypeMismatch {
            instrument: instrument.into(),
            reason: reason.into(),
        }
    }
}

/// Fails with `Expired` unless `value_date < boundary`.
pub(crate) fn ensure_live(value_date: Date, boundary: Date) -> ProductResult<()> {
    if value_date < boundary {
        Ok(())
    } else {
        Err(ProductError::Expired {
            value_date,
            boundary,
        })
    }
}

/// Fails with `ArithmeticDomainError` unless `value` is finite and non-zero.
pub(crate) fn nonzero(value: f64, what: &str) -> ProductResult<f64> {
    if value.is_finite() && value != 0.0 {
        Ok(value)
    } else {
        Err(ProductError::domain(format!("{what} is {value}")))
    }
}
