//! Dense forward-mode Jacobians.
//!
//! A [`WengertJacobian`] holds the partial derivatives of a set of outputs
//! (rows) with respect to a curve's parameters (columns). Stream measures are
//! single outputs, so their Jacobians are `1 x N` rows; a curve quote Jacobian
//! `dz/dq` is `N x M`.

use nalgebra::{DMatrix, DVector};

use crate::error::{CurveError, CurveResult};

/// Dense Jacobian matrix accumulated by the chain rule.
#[derive(Debug, Clone, PartialEq)]
pub struct WengertJacobian {
    matrix: DMatrix<f64>,
}

impl WengertJacobian {
    /// Creates a zero Jacobian of the given shape.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(rows, cols),
        }
    }

    /// Creates a single-row Jacobian from partials.
    #[must_use]
    pub fn from_row(partials: &[f64]) -> Self {
        Self {
            matrix: DMatrix::from_row_slice(1, partials.len(), partials),
        }
    }

    /// Wraps an existing matrix.
    #[must_use]
    pub fn from_matrix(matrix: DMatrix<f64>) -> Self {
        Self { matrix }
    }

    /// Number of outputs.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of parameters.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Partial derivative at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.matrix.get((row, col)).copied()
    }

    /// Adds `value` to the partial at `(row, col)`.
    pub fn accumulate_partial_first_derivative(
        &mut self,
        row: usize,
        col: usize,
        value: f64,
    ) -> CurveResult<()> {
        let (rows, cols) = self.matrix.shape();
        match self.matrix.get_mut((row, col)) {
            Some(entry) => {
                *entry += value;
                Ok(())
            }
            None => Err(CurveError::IndexOutOfRange {
                row,
                col,
                rows,
                cols,
            }),
        }
    }

    /// Adds `factor * other` in place.
    pub fn accumulate_scaled(&mut self, other: &WengertJacobian, factor: f64) -> CurveResult<()> {
        self.check_shape(other)?;
        self.matrix += &other.matrix * factor;
        Ok(())
    }

    /// Returns `self + other`.
    pub fn add(&self, other: &WengertJacobian) -> CurveResult<WengertJacobian> {
        self.check_shape(other)?;
        Ok(Self {
            matrix: &self.matrix + &other.matrix,
        })
    }

    /// Returns every partial multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> WengertJacobian {
        Self {
            matrix: &self.matrix * factor,
        }
    }

    /// Chain rule: `self (R x N) * inner (N x M)`.
    pub fn chain(&self, inner: &DMatrix<f64>) -> CurveResult<WengertJacobian> {
        if self.cols() != inner.nrows() {
            return Err(CurveError::ShapeMismatch {
                left_rows: self.rows(),
                left_cols: self.cols(),
                right_rows: inner.nrows(),
                right_cols: inner.ncols(),
            });
        }
        Ok(Self {
            matrix: &self.matrix * inner,
        })
    }

    /// Copies out one row.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<DVector<f64>> {
        (row < self.rows()).then(|| self.matrix.row(row).transpose())
    }

    /// Row `0` as a plain vector, the common case for scalar measures.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        if self.rows() == 0 {
            return Vec::new();
        }
        self.matrix.row(0).iter().copied().collect()
    }

    /// Underlying matrix.
    #[must_use]
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// True when every partial is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.matrix.iter().all(|v| v.is_finite())
    }

    fn check_shape(&self, other: &WengertJacobian) -> CurveResult<()> {
        if self.matrix.shape() == other.matrix.shape() {
            Ok(())
        } else {
            Err(CurveError::ShapeMismatch {
                left_rows: self.rows(),
                left_cols: self.cols(),
                right_rows: other.rows(),
                right_cols: other.cols(),
            })
        }
    }
}
