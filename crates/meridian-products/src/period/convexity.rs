//! Convexity multipliers of a period.
//!
//! Each channel pairs two latent states `(a, b)` and multiplies the period
//! cash flow by `exp(rho_ab * integral sigma_a sigma_b)` from the value date
//! to the channel horizon: the period start for channels involving the
//! forward state, the pay date otherwise. A channel whose volatilities or
//! correlation are not in the market bundle contributes `1.0`.

use meridian_core::types::{Currency, Date};
use meridian_curves::{LatentStateLabel, MarketParams};

use super::{CompoundingMethod, CouponMetrics, Period};
use crate::measures::ConvexityChannel;

/// Multipliers of the eight adjusted channels for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexityMultipliers {
    /// Geometric compounding correction.
    pub compounding: f64,
    /// Credit / forward.
    pub credit_forward: f64,
    /// Credit / funding.
    pub credit_funding: f64,
    /// Credit / FX.
    pub credit_fx: f64,
    /// Forward / funding.
    pub forward_funding: f64,
    /// Forward / FX.
    pub forward_fx: f64,
    /// Funding / FX.
    pub funding_fx: f64,
}

impl ConvexityMultipliers {
    /// All multipliers equal to one.
    #[must_use]
    pub fn unity() -> Self {
        Self {
            compounding: 1.0,
            credit_forward: 1.0,
            credit_funding: 1.0,
            credit_fx: 1.0,
            forward_funding: 1.0,
            forward_fx: 1.0,
            funding_fx: 1.0,
        }
    }

    /// Product of the seven individual multipliers.
    #[must_use]
    pub fn cumulative(&self) -> f64 {
        self.compounding
            * self.credit_forward
            * self.credit_funding
            * self.credit_fx
            * self.forward_funding
            * self.forward_fx
            * self.funding_fx
    }

    /// Multiplier applied to `channel`.
    #[must_use]
    pub fn get(&self, channel: ConvexityChannel) -> f64 {
        match channel {
            ConvexityChannel::Unadjusted => 1.0,
            ConvexityChannel::Compounding => self.compounding,
            ConvexityChannel::CreditForward => self.credit_forward,
            ConvexityChannel::CreditFunding => self.credit_funding,
            ConvexityChannel::CreditFx => self.credit_fx,
            ConvexityChannel::Cumulative => self.cumulative(),
            ConvexityChannel::ForwardFunding => self.forward_funding,
            ConvexityChannel::ForwardFx => self.forward_fx,
            ConvexityChannel::FundingFx => self.funding_fx,
        }
    }
}

impl Default for ConvexityMultipliers {
    fn default() -> Self {
        Self::unity()
    }
}

fn pair_multiplier(
    market: &MarketParams,
    a: &LatentStateLabel,
    b: &LatentStateLabel,
    value_date: Date,
    horizon: Date,
) -> f64 {
    let (Some(vol_a), Some(vol_b), Some(rho)) =
        (market.volatility(a), market.volatility(b), market.correlation(a, b))
    else {
        return 1.0;
    };
    (rho * vol_a.integrated_covariance(vol_b, value_date, horizon)).exp()
}

impl Period {
    /// Convexity multipliers of the period's cash flow.
    #[must_use]
    pub fn convexity_multipliers(
        &self,
        value_date: Date,
        currency: Currency,
        metrics: &CouponMetrics,
        market: &MarketParams,
    ) -> ConvexityMultipliers {
        let funding = LatentStateLabel::Funding(currency);
        let credit = LatentStateLabel::Credit(currency);
        let fx = LatentStateLabel::Fx(currency);

        let mut m = ConvexityMultipliers {
            credit_funding: pair_multiplier(market, &credit, &funding, value_date, self.pay()),
            credit_fx: pair_multiplier(market, &credit, &fx, value_date, self.pay()),
            funding_fx: pair_multiplier(market, &funding, &fx, value_date, self.pay()),
            ..ConvexityMultipliers::unity()
        };

        let Some(index) = self.index() else {
            return m;
        };
        let forward = LatentStateLabel::Forward(index.label());
        m.credit_forward = pair_multiplier(market, &credit, &forward, value_date, self.start());
        m.forward_funding = pair_multiplier(market, &forward, &funding, value_date, self.start());
        m.forward_fx = pair_multiplier(market, &forward, &fx, value_date, self.start());

        let geometric = self
            .compounding()
            .is_some_and(|c| c.method == CompoundingMethod::Geometric);
        if geometric && metrics.geometric_index_rate != 0.0 {
            if let Some(vol) = market.volatility(&forward) {
                let variance = vol.integrated_variance(value_date, self.start());
                let weight = (metrics.geometric_index_rate - metrics.arithmetic_index_rate)
                    / metrics.geometric_index_rate;
                m.compounding = 1.0 + weight * (variance.exp() - 1.0);
            }
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meridian_core::daycounts::DayCountConvention;
    use meridian_core::types::FloatingRateIndex;
    use meridian_curves::traits::curve_time;
    use meridian_curves::VolatilityTermStructure;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn metrics(rate: f64) -> CouponMetrics {
        CouponMetrics {
            coupon_rate: rate,
            index_rate: rate,
            arithmetic_index_rate: rate,
            geometric_index_rate: rate,
            known: false,
            single_curve: true,
        }
    }

    #[test]
    fn test_no_surfaces_gives_unity() {
        let p = Period::floating(d(2026, 1, 5), d(2026, 4, 6), d(2026, 4, 6), FloatingRateIndex::sofr_3m(), 0.0)
            .unwrap();
        let m = p.convexity_multipliers(d(2025, 1, 2), Currency::USD, &metrics(0.04), &MarketParams::new());
        assert_eq!(m, ConvexityMultipliers::unity());
        assert_eq!(m.get(ConvexityChannel::Cumulative), 1.0);
    }

    #[test]
    fn test_forward_funding_channel() {
        let today = d(2025, 1, 2);
        let index = FloatingRateIndex::sofr_3m();
        let fwd = LatentStateLabel::Forward(index.label());
        let fund = LatentStateLabel::Funding(Currency::USD);

        let mut market = MarketParams::new();
        market.set_volatility(fwd.clone(), VolatilityTermStructure::flat(today, 0.2).unwrap());
        market.set_volatility(fund.clone(), VolatilityTermStructure::flat(today, 0.1).unwrap());
        market.set_correlation(fwd, fund, -0.5);

        let p = Period::floating(d(2026, 1, 5), d(2026, 4, 6), d(2026, 4, 6), index, 0.0).unwrap();
        let m = p.convexity_multipliers(today, Currency::USD, &metrics(0.04), &market);
        let t = curve_time(today, d(2026, 1, 5));
        assert_relative_eq!(m.forward_funding, (-0.5 * 0.2 * 0.1 * t).exp(), epsilon = 1e-14);
        assert_eq!(m.funding_fx, 1.0);
        assert_relative_eq!(m.cumulative(), m.forward_funding, epsilon = 1e-15);
    }

    #[test]
    fn test_fixed_period_ignores_forward_channels() {
        let today = d(2025, 1, 2);
        let fund = LatentStateLabel::Funding(Currency::USD);
        let fx = LatentStateLabel::Fx(Currency::USD);
        let mut market = MarketParams::new();
        market.set_volatility(fund.clone(), VolatilityTermStructure::flat(today, 0.1).unwrap());
        market.set_volatility(fx.clone(), VolatilityTermStructure::flat(today, 0.1).unwrap());
        market.set_correlation(fund, fx, 0.3);

        let p = Period::fixed(d(2025, 1, 6), d(2026, 1, 6), d(2026, 1, 6), DayCountConvention::Act360, 0.03).unwrap();
        let m = p.convexity_multipliers(today, Currency::USD, &metrics(0.03), &market);
        assert!(m.funding_fx > 1.0);
        assert_eq!(m.forward_funding, 1.0);
        assert_eq!(m.credit_forward, 1.0);
    }
}
