//! Predictor-response weight constraints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use meridian_core::types::Date;

/// A linear constraint on a latent-state curve.
///
/// A curve `f` satisfies the constraint when
/// `sum(weight(d) * f(d)) == value`. The constraint also records how the
/// target and the weights move with the quoted manifest measures, so a
/// calibrator can propagate quote sensitivities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictorResponseWeightConstraint {
    predictor_weights: BTreeMap<Date, f64>,
    value: f64,
    d_value_d_manifest_measure: BTreeMap<String, f64>,
    d_weight_d_manifest_measure: BTreeMap<String, BTreeMap<Date, f64>>,
}

impl PredictorResponseWeightConstraint {
    /// Creates an empty constraint with a zero target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight` to the predictor at `date`.
    pub fn add_predictor_response_weight(&mut self, date: Date, weight: f64) {
        *self.predictor_weights.entry(date).or_insert(0.0) += weight;
    }

    /// Adds `delta` to the target value.
    pub fn update_value(&mut self, delta: f64) {
        self.value += delta;
    }

    /// Adds `delta` to `d value / d measure`.
    pub fn update_d_value_d_manifest_measure(&mut self, measure: &str, delta: f64) {
        *self
            .d_value_d_manifest_measure
            .entry(measure.to_string())
            .or_insert(0.0) += delta;
    }

    /// Adds `delta` to `d weight(date) / d measure`.
    pub fn add_d_weight_d_manifest_measure(&mut self, measure: &str, date: Date, delta: f64) {
        *self
            .d_weight_d_manifest_measure
            .entry(measure.to_string())
            .or_default()
            .entry(date)
            .or_insert(0.0) += delta;
    }

    /// Merges another constraint into this one, summing weights, targets and sensitivities.
    pub fn absorb(&mut self, other: &PredictorResponseWeightConstraint) {
        for (date, weight) in &other.predictor_weights {
            self.add_predictor_response_weight(*date, *weight);
        }
        self.update_value(other.value);
        for (measure, delta) in &other.d_value_d_manifest_measure {
            self.update_d_value_d_manifest_measure(measure, *delta);
        }
        for (measure, weights) in &other.d_weight_d_manifest_measure {
            for (date, delta) in weights {
                self.add_d_weight_d_manifest_measure(measure, *date, *delta);
            }
        }
    }

    /// Predictor dates and their weights, in date order.
    #[must_use]
    pub fn predictor_weights(&self) -> &BTreeMap<Date, f64> {
        &self.predictor_weights
    }

    /// Weight at `date`, zero when the date is not a predictor.
    #[must_use]
    pub fn weight(&self, date: Date) -> f64 {
        self.predictor_weights.get(&date).copied().unwrap_or(0.0)
    }

    /// Target value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// `d value / d measure`, if recorded.
    #[must_use]
    pub fn d_value_d_manifest_measure(&self, measure: &str) -> Option<f64> {
        self.d_value_d_manifest_measure.get(measure).copied()
    }

    /// `d weight / d measure` by predictor date, if recorded.
    #[must_use]
    pub fn d_weight_d_manifest_measure(&self, measure: &str) -> Option<&BTreeMap<Date, f64>> {
        self.d_weight_d_manifest_measure.get(measure)
    }

    /// Latest predictor date.
    #[must_use]
    pub fn last_predictor_date(&self) -> Option<Date> {
        self.predictor_weights.keys().next_back().copied()
    }

    /// Residual `sum(weight(d) * f(d)) - value` for a candidate curve `f`.
    pub fn evaluate<E>(&self, mut f: impl FnMut(Date) -> Result<f64, E>) -> Result<f64, E> {
        let mut total = 0.0;
        for (date, weight) in &self.predictor_weights {
            total += weight * f(*date)?;
        }
        Ok(total - self.value)
    }
}

/// Two-point discount-factor constraint of a single-period deposit.
///
/// `notional * forward_df * df(start) - notional * df(end) == 0`, where
/// `forward_df = df(end) / df(start)` is implied by the quote.
#[must_use]
pub fn discount_latent_state_prwc(
    start: Date,
    end: Date,
    notional: f64,
    forward_df: f64,
) -> PredictorResponseWeightConstraint {
    let mut prwc = PredictorResponseWeightConstraint::new();
    prwc.add_predictor_response_weight(start, notional * forward_df);
    prwc.add_predictor_response_weight(end, -notional);
    prwc
}
