//! Curve provider contract tests.

use std::sync::Arc;

use approx::assert_relative_eq;
use proptest::prelude::*;

use meridian_core::types::{Currency, Date, FloatingRateIndex};
use meridian_curves::prelude::*;

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

fn usd_curve() -> ZeroNodeCurve {
    ZeroNodeCurve::new(
        d(2025, 1, 2),
        Currency::USD,
        &[
            (d(2025, 7, 2), 0.043),
            (d(2026, 1, 2), 0.041),
            (d(2028, 1, 3), 0.038),
            (d(2035, 1, 2), 0.040),
        ],
    )
    .unwrap()
}

#[test]
fn libor_matches_discount_factor_ratio() {
    let curve = usd_curve();
    let (s, e) = (d(2026, 3, 18), d(2026, 6, 17));
    let dcf = 91.0 / 360.0;
    let fwd = curve.libor_with_dcf(s, e, dcf).unwrap();
    let implied = (1.0 + fwd * dcf) * curve.df(e).unwrap();
    assert_relative_eq!(implied, curve.df(s).unwrap(), epsilon = 1e-15);
    assert_relative_eq!(curve.libor(s, e).unwrap(), fwd, epsilon = 1e-15);
}

#[test]
fn degenerate_accrual_is_an_error() {
    let curve = usd_curve();
    let s = d(2026, 3, 18);
    assert!(matches!(
        curve.libor_with_dcf(s, s, 0.0),
        Err(CurveError::DegenerateAccrual { .. })
    ));
    assert!(curve.jack_d_forward_d_manifest_measure(s, s, ZERO_RATE_MEASURE, 0.0).is_none());
}

#[test]
fn jacobian_before_anchor_is_zero() {
    let curve = usd_curve();
    let jack = curve
        .jack_d_df_d_manifest_measure(d(2024, 12, 1), ZERO_RATE_MEASURE)
        .unwrap();
    assert_eq!(jack.cols(), curve.parameter_count());
    assert!(jack.to_vec().iter().all(|v| *v == 0.0));
}

#[test]
fn market_republishes_recalibrated_curve() {
    let mut market = MarketParams::new().with_funding_curve(Arc::new(usd_curve()));
    let before = market.funding_curve(Currency::USD).unwrap().df(d(2027, 1, 4)).unwrap();

    let bumped = usd_curve().bumped(2, 0.001).unwrap();
    market.set_funding_curve(Arc::new(bumped));
    let after = market.funding_curve(Currency::USD).unwrap().df(d(2027, 1, 4)).unwrap();
    assert!(after < before);
}

#[test]
fn forward_curve_keyed_by_index_label() {
    let index = FloatingRateIndex::euribor_6m();
    let fwd = NodeForwardCurve::flat(index.clone(), d(2025, 1, 2), 0.025, &[d(2027, 1, 4)]).unwrap();
    let market = MarketParams::new().with_forward_curve(Arc::new(fwd));
    let curve = market.forward_curve(&index.label()).unwrap();
    assert_relative_eq!(curve.forward(d(2026, 7, 2)).unwrap(), 0.025);
    assert_eq!(curve.parameter_count(), 1);
}

proptest! {
    #[test]
    fn discount_factors_positive_and_decreasing_for_positive_rates(
        z1 in 0.001f64..0.10,
        z2 in 0.001f64..0.10,
        days in 1i64..5000,
    ) {
        let r = d(2025, 1, 2);
        let curve = ZeroNodeCurve::new(
            r,
            Currency::EUR,
            &[(d(2026, 1, 2), z1), (d(2031, 1, 2), z2.max(z1 * 0.2))],
        )
        .unwrap();
        let early = curve.df(r.add_days(days)).unwrap();
        let late = curve.df(r.add_days(days + 30)).unwrap();
        prop_assert!(early > 0.0 && early <= 1.0);
        prop_assert!(late < early);
    }
}
