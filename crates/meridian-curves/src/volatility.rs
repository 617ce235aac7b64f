//! Volatility term structures for convexity adjustments.

use meridian_core::types::Date;

use crate::error::{CurveError, CurveResult};
use crate::traits::curve_time;

/// Piecewise-constant instantaneous volatility of one latent state.
///
/// Pillar `i` carries the volatility over `(date_{i-1}, date_i]`; the last
/// volatility is held flat afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityTermStructure {
    reference_date: Date,
    pillar_times: Vec<f64>,
    vols: Vec<f64>,
    terminal_vol: f64,
}

impl VolatilityTermStructure {
    /// Builds a term structure from `(pillar date, volatility)` pairs.
    pub fn new(reference_date: Date, pillars: &[(Date, f64)]) -> CurveResult<Self> {
        let Some(&(_, terminal_vol)) = pillars.last() else {
            return Err(CurveError::InsufficientPoints {
                required: 1,
                got: 0,
            });
        };
        let mut pillar_times = Vec::with_capacity(pillars.len());
        let mut vols = Vec::with_capacity(pillars.len());
        for (index, (date, vol)) in pillars.iter().enumerate() {
            if !(vol.is_finite() && *vol >= 0.0) {
                return Err(CurveError::invalid_data(format!("invalid volatility {vol} at {date}")));
            }
            let t = curve_time(reference_date, *date);
            if let Some(&prev) = pillar_times.last() {
                if t <= prev {
                    return Err(CurveError::NonMonotonicNodes {
                        index,
                        prev,
                        current: t,
                    });
                }
            }
            pillar_times.push(t);
            vols.push(*vol);
        }
        Ok(Self {
            reference_date,
            pillar_times,
            vols,
            terminal_vol,
        })
    }

    /// Constant volatility.
    pub fn flat(reference_date: Date, vol: f64) -> CurveResult<Self> {
        if !(vol.is_finite() && vol >= 0.0) {
            return Err(CurveError::invalid_data(format!("invalid volatility {vol}")));
        }
        Ok(Self {
            reference_date,
            pillar_times: Vec::new(),
            vols: Vec::new(),
            terminal_vol: vol,
        })
    }

    /// Anchor date.
    #[must_use]
    pub fn reference_date(&self) -> Date {
        self.reference_date
    }

    /// Instantaneous volatility at curve time `t`.
    #[must_use]
    pub fn vol_at_time(&self, t: f64) -> f64 {
        let idx = self.pillar_times.partition_point(|&x| x < t);
        self.vols.get(idx).copied().unwrap_or(self.terminal_vol)
    }

    /// Instantaneous volatility at `date`.
    #[must_use]
    pub fn vol(&self, date: Date) -> f64 {
        self.vol_at_time(curve_time(self.reference_date, date))
    }

    /// `integral of sigma_self * sigma_other` over `[start, end]`.
    ///
    /// Returns `0.0` for empty or reversed intervals.
    #[must_use]
    pub fn integrated_covariance(&self, other: &VolatilityTermStructure, start: Date, end: Date) -> f64 {
        let t0 = curve_time(self.reference_date, start).max(0.0);
        let t1 = curve_time(self.reference_date, end);
        if t1 <= t0 {
            return 0.0;
        }

        let shift = curve_time(self.reference_date, other.reference_date);
        let mut breaks: Vec<f64> = self
            .pillar_times
            .iter()
            .copied()
            .chain(other.pillar_times.iter().map(|t| t + shift))
            .filter(|t| *t > t0 && *t < t1)
            .collect();
        breaks.push(t0);
        breaks.push(t1);
        breaks.sort_by(f64::total_cmp);
        breaks.dedup();

        breaks
            .windows(2)
            .map(|w| {
                let mid = 0.5 * (w[0] + w[1]);
                self.vol_at_time(mid) * other.vol_at_time(mid - shift) * (w[1] - w[0])
            })
            .sum()
    }

    /// `integral of sigma^2` over `[start, end]`.
    #[must_use]
    pub fn integrated_variance(&self, start: Date, end: Date) -> f64 {
        self.integrated_covariance(self, start, end)
    }
}
