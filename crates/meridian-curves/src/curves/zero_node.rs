//! Discount curve on node zero rates.

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use meridian_core::types::{Currency, Date};

use super::{node_times, upper_node};
use crate::error::{CurveError, CurveResult};
use crate::jacobian::WengertJacobian;
use crate::traits::{curve_time, DiscountCurve};

/// Manifest measure naming the curve's own node zero rates.
pub const ZERO_RATE_MEASURE: &str = "ZeroRate";

/// Discount curve on continuously compounded node zero rates.
///
/// `y(t) = z(t) t` is linear between nodes (the anchor counts as a node with
/// `y = 0`), so discount factors `exp(-y)` are log-linear. Beyond the last
/// node the zero rate is held flat.
///
/// The curve parameters are the node zero rates, exposed under the
/// [`ZERO_RATE_MEASURE`] manifest measure. A quote Jacobian `dz/dq` registered
/// with [`with_quote_jacobian`](Self::with_quote_jacobian) chains the curve's
/// sensitivities onto any other measure name.
#[derive(Debug, Clone)]
pub struct ZeroNodeCurve {
    reference_date: Date,
    currency: Currency,
    node_dates: Vec<Date>,
    node_times: Vec<f64>,
    zero_rates: Vec<f64>,
    quote_jacobians: BTreeMap<String, DMatrix<f64>>,
}

impl ZeroNodeCurve {
    /// Builds a curve from `(node date, zero rate)` pairs.
    pub fn new(reference_date: Date, currency: Currency, nodes: &[(Date, f64)]) -> CurveResult<Self> {
        let node_dates: Vec<Date> = nodes.iter().map(|(d, _)| *d).collect();
        let zero_rates: Vec<f64> = nodes.iter().map(|(_, z)| *z).collect();
        let node_times = node_times(reference_date, &node_dates, &zero_rates)?;
        Ok(Self {
            reference_date,
            currency,
            node_dates,
            node_times,
            zero_rates,
            quote_jacobians: BTreeMap::new(),
        })
    }

    /// Flat curve with one node per date.
    pub fn flat(reference_date: Date, currency: Currency, rate: f64, node_dates: &[Date]) -> CurveResult<Self> {
        let nodes: Vec<(Date, f64)> = node_dates.iter().map(|d| (*d, rate)).collect();
        Self::new(reference_date, currency, &nodes)
    }

    /// Registers `dz/dq` for the manifest measure `measure` (`N x M`).
    pub fn with_quote_jacobian(mut self, measure: &str, dz_dq: DMatrix<f64>) -> CurveResult<Self> {
        if dz_dq.nrows() != self.zero_rates.len() {
            return Err(CurveError::ShapeMismatch {
                left_rows: 1,
                left_cols: self.zero_rates.len(),
                right_rows: dz_dq.nrows(),
                right_cols: dz_dq.ncols(),
            });
        }
        self.quote_jacobians.insert(measure.to_ascii_uppercase(), dz_dq);
        Ok(self)
    }

    /// Node dates.
    #[must_use]
    pub fn node_dates(&self) -> &[Date] {
        &self.node_dates
    }

    /// Node zero rates.
    #[must_use]
    pub fn zero_rates(&self) -> &[f64] {
        &self.zero_rates
    }

    /// Overwrites node `k`'s zero rate.
    pub fn set_zero_rate(&mut self, k: usize, rate: f64) -> CurveResult<()> {
        if !rate.is_finite() {
            return Err(CurveError::invalid_data(format!("non-finite zero rate {rate}")));
        }
        let cols = self.zero_rates.len();
        let slot = self
            .zero_rates
            .get_mut(k)
            .ok_or(CurveError::IndexOutOfRange {
                row: 0,
                col: k,
                rows: 1,
                cols,
            })?;
        *slot = rate;
        Ok(())
    }

    /// Copy of the curve with node `k` moved by `delta`.
    pub fn bumped(&self, k: usize, delta: f64) -> CurveResult<Self> {
        let current = *self.zero_rates.get(k).ok_or(CurveError::IndexOutOfRange {
            row: 0,
            col: k,
            rows: 1,
            cols: self.zero_rates.len(),
        })?;
        let mut bumped = self.clone();
        bumped.set_zero_rate(k, current + delta)?;
        Ok(bumped)
    }

    /// Continuously compounded zero rate to `date`.
    #[must_use]
    pub fn zero_rate(&self, date: Date) -> f64 {
        let t = curve_time(self.reference_date, date);
        if t <= 0.0 {
            return self.zero_rates[0];
        }
        self.log_discount(t) / t
    }

    /// `y(t) = -ln df(t)`.
    fn log_discount(&self, t: f64) -> f64 {
        self.log_discount_weights(t)
            .iter()
            .map(|(k, w)| w * self.zero_rates[*k])
            .sum()
    }

    /// `dy/dz_k` for the nodes that influence `t`.
    fn log_discount_weights(&self, t: f64) -> Vec<(usize, f64)> {
        if t <= 0.0 {
            return Vec::new();
        }
        match upper_node(&self.node_times, t) {
            None => vec![(self.node_times.len() - 1, t)],
            Some(0) => vec![(0, t)],
            Some(hi) => {
                let lo = hi - 1;
                let (t_lo, t_hi) = (self.node_times[lo], self.node_times[hi]);
                let w = (t - t_lo) / (t_hi - t_lo);
                vec![(lo, (1.0 - w) * t_lo), (hi, w * t_hi)]
            }
        }
    }
}

impl DiscountCurve for ZeroNodeCurve {
    fn currency(&self) -> Currency {
        self.currency
    }

    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn df(&self, date: Date) -> CurveResult<f64> {
        let t = curve_time(self.reference_date, date);
        Ok((-self.log_discount(t)).exp())
    }

    fn parameter_count(&self) -> usize {
        self.zero_rates.len()
    }

    fn jack_d_df_d_manifest_measure(&self, date: Date, measure: &str) -> Option<WengertJacobian> {
        let t = curve_time(self.reference_date, date);
        let df = (-self.log_discount(t)).exp();

        let mut jack = WengertJacobian::zeros(1, self.zero_rates.len());
        for (k, dy_dz) in self.log_discount_weights(t) {
            jack.accumulate_partial_first_derivative(0, k, -df * dy_dz).ok()?;
        }

        if measure.eq_ignore_ascii_case(ZERO_RATE_MEASURE) {
            return Some(jack);
        }
        let dz_dq = self.quote_jacobians.get(&measure.to_ascii_uppercase())?;
        jack.chain(dz_dq).ok()
    }
}
