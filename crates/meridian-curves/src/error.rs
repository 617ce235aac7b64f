//! Error types for curve operations.

use meridian_core::CoreError;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve operations.
#[derive(Error, Debug, Clone)]
pub enum CurveError {
    /// Curve data is malformed (non-finite values, empty node set, ...).
    #[error("Invalid curve data: {reason}")]
    InvalidData {
        /// Description of the problem.
        reason: String,
    },

    /// Not enough nodes to build the curve.
    #[error("Insufficient points: need at least {required}, got {got}")]
    InsufficientPoints {
        /// Minimum required points.
        required: usize,
        /// Actual number of points provided.
        got: usize,
    },

    /// Node times are not strictly increasing.
    #[error("Non-monotonic nodes at index {index}: {prev:.6} >= {current:.6}")]
    NonMonotonicNodes {
        /// Index where monotonicity violation occurred.
        index: usize,
        /// Previous node time.
        prev: f64,
        /// Current node time.
        current: f64,
    },

    /// Node or Jacobian index out of range.
    #[error("Index ({row}, {col}) out of range for {rows}x{cols}")]
    IndexOutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Two Jacobians being combined have different shapes.
    #[error("Jacobian shape mismatch: {left_rows}x{left_cols} vs {right_rows}x{right_cols}")]
    ShapeMismatch {
        /// Rows of the left operand.
        left_rows: usize,
        /// Columns of the left operand.
        left_cols: usize,
        /// Rows of the right operand.
        right_rows: usize,
        /// Columns of the right operand.
        right_cols: usize,
    },

    /// A forward rate was requested over a degenerate accrual.
    #[error("Degenerate accrual fraction {dcf} for forward rate")]
    DegenerateAccrual {
        /// The offending accrual fraction.
        dcf: f64,
    },

    /// Error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CurveError {
    /// Creates an invalid data error.
    #[must_use]
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CurveError::invalid_data("NaN zero rate");
        assert_eq!(err.to_string(), "Invalid curve data: NaN zero rate");

        let err = CurveError::ShapeMismatch {
            left_rows: 1,
            left_cols: 4,
            right_rows: 1,
            right_cols: 5,
        };
        assert!(err.to_string().contains("1x4 vs 1x5"));
    }

    #[test]
    fn test_from_core() {
        let err: CurveError = CoreError::invalid_date("2025-02-30").into();
        assert!(matches!(err, CurveError::Core(_)));
    }
}
