//! Projection curve on node forward rates.

use meridian_core::types::{Date, FloatingRateIndex};

use super::{node_times, upper_node};
use crate::error::{CurveError, CurveResult};
use crate::jacobian::WengertJacobian;
use crate::traits::{curve_time, ForwardCurve};

/// Manifest measure naming the curve's node forward rates.
pub const FORWARD_RATE_MEASURE: &str = "ForwardRate";

/// Forward curve for one index, linear in the node forwards.
///
/// Node dates are accrual end dates. Forwards are held flat before the first
/// node and after the last one.
#[derive(Debug, Clone)]
pub struct NodeForwardCurve {
    index: FloatingRateIndex,
    reference_date: Date,
    node_dates: Vec<Date>,
    node_times: Vec<f64>,
    forwards: Vec<f64>,
}

impl NodeForwardCurve {
    /// Builds a curve from `(accrual end date, forward)` pairs.
    pub fn new(index: FloatingRateIndex, reference_date: Date, nodes: &[(Date, f64)]) -> CurveResult<Self> {
        let node_dates: Vec<Date> = nodes.iter().map(|(d, _)| *d).collect();
        let forwards: Vec<f64> = nodes.iter().map(|(_, f)| *f).collect();
        let node_times = node_times(reference_date, &node_dates, &forwards)?;
        Ok(Self {
            index,
            reference_date,
            node_dates,
            node_times,
            forwards,
        })
    }

    /// Flat curve with one node per date.
    pub fn flat(
        index: FloatingRateIndex,
        reference_date: Date,
        rate: f64,
        node_dates: &[Date],
    ) -> CurveResult<Self> {
        let nodes: Vec<(Date, f64)> = node_dates.iter().map(|d| (*d, rate)).collect();
        Self::new(index, reference_date, &nodes)
    }

    /// Node dates.
    #[must_use]
    pub fn node_dates(&self) -> &[Date] {
        &self.node_dates
    }

    /// Node forwards.
    #[must_use]
    pub fn forwards(&self) -> &[f64] {
        &self.forwards
    }

    /// Overwrites node `k`'s forward.
    pub fn set_forward(&mut self, k: usize, rate: f64) -> CurveResult<()> {
        if !rate.is_finite() {
            return Err(CurveError::invalid_data(format!("non-finite forward {rate}")));
        }
        let cols = self.forwards.len();
        let slot = self.forwards.get_mut(k).ok_or(CurveError::IndexOutOfRange {
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
        let current = *self.forwards.get(k).ok_or(CurveError::IndexOutOfRange {
            row: 0,
            col: k,
            rows: 1,
            cols: self.forwards.len(),
        })?;
        let mut bumped = self.clone();
        bumped.set_forward(k, current + delta)?;
        Ok(bumped)
    }

    fn weights(&self, t: f64) -> Vec<(usize, f64)> {
        match upper_node(&self.node_times, t) {
            None => vec![(self.node_times.len() - 1, 1.0)],
            Some(0) => vec![(0, 1.0)],
            Some(hi) => {
                let lo = hi - 1;
                let w = (t - self.node_times[lo]) / (self.node_times[hi] - self.node_times[lo]);
                vec![(lo, 1.0 - w), (hi, w)]
            }
        }
    }
}

impl ForwardCurve for NodeForwardCurve {
    fn index(&self) -> &FloatingRateIndex {
        &self.index
    }

    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn forward(&self, date: Date) -> CurveResult<f64> {
        let t = curve_time(self.reference_date, date);
        Ok(self.weights(t).iter().map(|(k, w)| w * self.forwards[*k]).sum())
    }

    fn parameter_count(&self) -> usize {
        self.forwards.len()
    }

    fn jack_d_forward_d_manifest_measure(&self, date: Date, measure: &str) -> Option<WengertJacobian> {
        if !measure.eq_ignore_ascii_case(FORWARD_RATE_MEASURE) {
            return None;
        }
        let t = curve_time(self.reference_date, date);
        let mut jack = WengertJacobian::zeros(1, self.forwards.len());
        for (k, w) in self.weights(t) {
            jack.accumulate_partial_first_derivative(0, k, w).ok()?;
        }
        Some(jack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn curve() -> NodeForwardCurve {
        NodeForwardCurve::new(
            FloatingRateIndex::sofr_3m(),
            d(2025, 1, 2),
            &[(d(2025, 4, 2), 0.04), (d(2026, 1, 2), 0.05)],
        )
        .unwrap()
    }

    #[test]
    fn test_flat_ends() {
        let c = curve();
        assert_relative_eq!(c.forward(d(2025, 2, 1)).unwrap(), 0.04);
        assert_relative_eq!(c.forward(d(2030, 1, 1)).unwrap(), 0.05);
    }

    #[test]
    fn test_linear_between_nodes() {
        let c = curve();
        let f = c.forward(d(2025, 8, 17)).unwrap();
        assert!(f > 0.04 && f < 0.05);
        let jack = c.jack_d_forward_d_manifest_measure(d(2025, 8, 17), "forwardrate").unwrap();
        assert_relative_eq!(jack.get(0, 0).unwrap() + jack.get(0, 1).unwrap(), 1.0, epsilon = 1e-14);
        assert_relative_eq!(
            jack.get(0, 0).unwrap() * 0.04 + jack.get(0, 1).unwrap() * 0.05,
            f,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_unknown_measure() {
        assert!(curve().jack_d_forward_d_manifest_measure(d(2025, 6, 1), "ZeroRate").is_none());
    }

    #[test]
    fn test_bumped() {
        let c = curve().bumped(1, 0.01).unwrap();
        assert_relative_eq!(c.forward(d(2030, 1, 1)).unwrap(), 0.06);
        assert!(curve().bumped(2, 0.01).is_err());
    }
}
