//! Concrete node curves.
//!
//! - [`ZeroNodeCurve`]: discount curve on continuously compounded node zero
//!   rates, log-linear in discount factors
//! - [`NodeForwardCurve`]: projection curve on piecewise-linear node forwards

mod node_forward;
mod zero_node;

pub use node_forward::{NodeForwardCurve, FORWARD_RATE_MEASURE};
pub use zero_node::{ZeroNodeCurve, ZERO_RATE_MEASURE};

use meridian_core::types::Date;

use crate::error::{CurveError, CurveResult};
use crate::traits::curve_time;

/// Validates node dates against the anchor and returns their curve times.
fn node_times(reference: Date, dates: &[Date], values: &[f64]) -> CurveResult<Vec<f64>> {
    if dates.is_empty() {
        return Err(CurveError::InsufficientPoints {
            required: 1,
            got: 0,
        });
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(CurveError::invalid_data(format!("non-finite node value {bad}")));
    }

    let times: Vec<f64> = dates.iter().map(|d| curve_time(reference, *d)).collect();
    if times[0] <= 0.0 {
        return Err(CurveError::invalid_data(format!(
            "first node {} is not after the reference date {reference}",
            dates[0]
        )));
    }
    for (index, pair) in times.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(CurveError::NonMonotonicNodes {
                index: index + 1,
                prev: pair[0],
                current: pair[1],
            });
        }
    }
    Ok(times)
}

/// Index of the first node at or after `t`, or `None` beyond the last node.
fn upper_node(times: &[f64], t: f64) -> Option<usize> {
    let idx = times.partition_point(|&x| x < t);
    (idx < times.len()).then_some(idx)
}
