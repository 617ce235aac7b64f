//! Curve provider contract.
//!
//! Streams consume curves only through these traits. "Insufficient state" is
//! always reported as `Err` or `None`, never as a panic; Jacobian queries
//! return `None` when the curve cannot differentiate with respect to the
//! requested manifest measure.

use std::fmt::Debug;

use meridian_core::daycounts::DayCountConvention;
use meridian_core::types::{Currency, Date, FloatingRateIndex};

use crate::error::{CurveError, CurveResult};
use crate::jacobian::WengertJacobian;

/// Curve time: ACT/365F years from `reference` to `date`.
#[must_use]
pub fn curve_time(reference: Date, date: Date) -> f64 {
    reference.days_between(&date) as f64 / 365.0
}

/// A discount (funding) curve for one currency.
pub trait DiscountCurve: Send + Sync + Debug {
    /// Currency the curve discounts.
    fn currency(&self) -> Currency;

    /// Curve anchor date.
    fn reference_date(&self) -> Date;

    /// Discount factor to `date`. Dates on or before the anchor give `1.0`.
    fn df(&self, date: Date) -> CurveResult<f64>;

    /// Number of calibration parameters (Jacobian width).
    fn parameter_count(&self) -> usize;

    /// Simple forward rate over `[start, end]` with an ACT/360 accrual.
    fn libor(&self, start: Date, end: Date) -> CurveResult<f64> {
        let dcf = DayCountConvention::Act360.year_fraction_f64(start, end)?;
        self.libor_with_dcf(start, end, dcf)
    }

    /// Simple forward rate over `[start, end]` with the given accrual fraction.
    fn libor_with_dcf(&self, start: Date, end: Date, dcf: f64) -> CurveResult<f64> {
        if !(dcf.is_finite() && dcf > 0.0) {
            return Err(CurveError::DegenerateAccrual { dcf });
        }
        let df_start = self.df(start)?;
        let df_end = self.df(end)?;
        if df_end <= 0.0 {
            return Err(CurveError::invalid_data(format!(
                "non-positive discount factor {df_end} at {end}"
            )));
        }
        Ok((df_start / df_end - 1.0) / dcf)
    }

    /// `d df(date) / d measure`, a `1 x N` row.
    fn jack_d_df_d_manifest_measure(&self, date: Date, measure: &str) -> Option<WengertJacobian>;

    /// `d libor(start, end) / d measure` for a forward projected off this curve.
    fn jack_d_forward_d_manifest_measure(
        &self,
        start: Date,
        end: Date,
        measure: &str,
        dcf: f64,
    ) -> Option<WengertJacobian> {
        if !(dcf.is_finite() && dcf > 0.0) {
            return None;
        }
        let df_start = self.df(start).ok()?;
        let df_end = self.df(end).ok()?;
        if df_end <= 0.0 {
            return None;
        }
        let jack_start = self.jack_d_df_d_manifest_measure(start, measure)?;
        let jack_end = self.jack_d_df_d_manifest_measure(end, measure)?;

        // F = (P_s / P_e - 1) / dcf
        let mut jack = jack_start.scaled(1.0 / (df_end * dcf));
        jack.accumulate_scaled(&jack_end, -df_start / (df_end * df_end * dcf))
            .ok()?;
        Some(jack)
    }
}

/// A projection curve for one floating rate index.
pub trait ForwardCurve: Send + Sync + Debug {
    /// The index this curve projects.
    fn index(&self) -> &FloatingRateIndex;

    /// Curve anchor date.
    fn reference_date(&self) -> Date;

    /// Forward rate for the accrual period ending on `date`.
    fn forward(&self, date: Date) -> CurveResult<f64>;

    /// Number of calibration parameters (Jacobian width).
    fn parameter_count(&self) -> usize;

    /// `d forward(date) / d measure`, a `1 x N` row.
    fn jack_d_forward_d_manifest_measure(&self, date: Date, measure: &str) -> Option<WengertJacobian>;
}
