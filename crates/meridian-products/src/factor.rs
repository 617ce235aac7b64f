//! Notional factor schedules.

use serde::{Deserialize, Serialize};

use meridian_core::types::Date;

use crate::error::{ProductError, ProductResult};

/// Step schedule of notional factors.
///
/// A step `(date, factor)` applies from `date` until the next step. Before the
/// first step the factor is `1.0`, so an empty schedule is a bullet notional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FactorSteps")]
pub struct FactorSchedule {
    steps: Vec<(Date, f64)>,
}

#[derive(Deserialize)]
struct FactorSteps {
    steps: Vec<(Date, f64)>,
}

impl TryFrom<FactorSteps> for FactorSchedule {
    type Error = ProductError;

    fn try_from(raw: FactorSteps) -> ProductResult<Self> {
        Self::new(raw.steps)
    }
}

impl FactorSchedule {
    /// Constant factor of one.
    #[must_use]
    pub fn bullet() -> Self {
        Self::default()
    }

    /// Builds a schedule from `(date, factor)` steps.
    pub fn new(mut steps: Vec<(Date, f64)>) -> ProductResult<Self> {
        steps.sort_by_key(|(date, _)| *date);
        for pair in steps.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(ProductError::date_ordering(format!(
                    "duplicate notional step on {}",
                    pair[0].0
                )));
            }
        }
        if let Some((date, _)) = steps.iter().find(|(_, f)| !f.is_finite()) {
            return Err(ProductError::UnresolvableNotional { date: *date });
        }
        Ok(Self { steps })
    }

    /// Straight-line amortization: the factor drops by `1/n` on each date.
    pub fn linear_amortization(dates: &[Date]) -> ProductResult<Self> {
        let n = dates.len() as f64;
        let steps = dates
            .iter()
            .enumerate()
            .map(|(i, date)| (*date, 1.0 - (i + 1) as f64 / n))
            .collect();
        Self::new(steps)
    }

    /// Steps of the schedule.
    #[must_use]
    pub fn steps(&self) -> &[(Date, f64)] {
        &self.steps
    }

    /// Factor in force on `date`.
    #[must_use]
    pub fn factor(&self, date: Date) -> f64 {
        let idx = self.steps.partition_point(|(d, _)| *d <= date);
        if idx == 0 {
            1.0
        } else {
            self.steps[idx - 1].1
        }
    }

    /// Time-weighted average factor over `[start, end)`.
    ///
    /// Falls back to the factor on `start` for empty intervals.
    #[must_use]
    pub fn factor_between(&self, start: Date, end: Date) -> f64 {
        let total = start.days_between(&end);
        if total <= 0 {
            return self.factor(start);
        }

        let mut weighted = 0.0;
        let mut cursor = start;
        for (date, _) in self.steps.iter().filter(|(d, _)| *d > start && *d < end) {
            weighted += self.factor(cursor) * cursor.days_between(date) as f64;
            cursor = *date;
        }
        weighted += self.factor(cursor) * cursor.days_between(&end) as f64;
        weighted / total as f64
    }
}
