//! Valuation invariants of streams and swaps.

use std::sync::Arc;

use approx::assert_relative_eq;
use proptest::prelude::*;

use meridian_core::daycounts::DayCountConvention;
use meridian_core::types::{Currency, Date, FloatingRateIndex, Frequency};
use meridian_curves::{DiscountCurve, MarketParams, ZeroNodeCurve};
use meridian_products::prelude::*;

// =============================================================================
// FIXTURES
// =============================================================================

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

fn market() -> MarketParams {
    MarketParams::new().with_funding_curve(Arc::new(usd_curve()))
}

fn params(value_date: Date) -> (ValuationParams, PricerParams, QuotingParams) {
    (
        ValuationParams::spot(value_date),
        PricerParams::default(),
        QuotingParams::default(),
    )
}

fn fixed_leg(effective: Date, maturity: Date, rate: f64) -> FixedStream {
    let schedule = Schedule::new(effective, maturity, Frequency::SemiAnnual);
    FixedStream::new(Currency::USD, 1e6, &schedule, DayCountConvention::Thirty360US, rate).unwrap()
}

// =============================================================================
// FIXED STREAM
// =============================================================================

#[test]
fn fixed_annuity_pv_is_coupon_times_annuity() {
    let (val, pricer, quoting) = params(d(2025, 1, 2));
    let market = market();
    let leg = fixed_leg(d(2025, 1, 6), d(2030, 1, 6), 0.05);
    let m = leg.value(&val, &pricer, &market, &quoting).unwrap();

    let curve = usd_curve();
    let annuity: f64 = leg
        .periods()
        .iter()
        .map(|p| p.dcf() * curve.df(p.pay()).unwrap())
        .sum();
    assert_relative_eq!(m.pv(), 1e6 * 0.05 * annuity, max_relative = 1e-12);
    assert_relative_eq!(m.dv01(), 1e6 * annuity * 1e-4, max_relative = 1e-12);
}

#[test]
fn stream_pv_is_additive_over_periods() {
    let (val, pricer, quoting) = params(d(2025, 1, 2));
    let market = market();
    let whole = fixed_leg(d(2025, 1, 6), d(2028, 1, 6), 0.04);
    let front = fixed_leg(d(2025, 1, 6), d(2026, 7, 6), 0.04);
    let back = fixed_leg(d(2026, 7, 6), d(2028, 1, 6), 0.04);

    let pv = |leg: &FixedStream| leg.value(&val, &pricer, &market, &quoting).unwrap().pv();
    assert_relative_eq!(pv(&whole), pv(&front) + pv(&back), max_relative = 1e-12);
}

#[test]
fn clean_plus_accrued_is_dirty_mid_period() {
    let (val, pricer, quoting) = params(d(2025, 3, 14));
    let market = market();
    let leg = fixed_leg(d(2025, 1, 6), d(2027, 1, 6), 0.045);
    let m = leg.value(&val, &pricer, &market, &quoting).unwrap();

    assert!(m.accrued > 0.0);
    assert_relative_eq!(m.clean_pv() + m.accrued, m.pv(), max_relative = 1e-12);
    assert_relative_eq!(m.clean_dv01() + m.accrued01, m.dv01(), max_relative = 1e-12);
    // accrued is known coupon, so the fair premium is unchanged by it
    assert_relative_eq!(m.fair_premium(), 0.045, max_relative = 1e-12);
}

#[test]
fn expired_stream_fails_closed() {
    let (_, pricer, quoting) = params(d(2025, 1, 2));
    let market = market();
    let leg = fixed_leg(d(2025, 1, 6), d(2026, 1, 6), 0.04);

    let on_maturity = ValuationParams::spot(d(2026, 1, 6));
    assert!(matches!(
        leg.value(&on_maturity, &pricer, &market, &quoting),
        Err(ProductError::Expired { .. })
    ));

    let day_before = ValuationParams::spot(d(2026, 1, 5));
    assert!(leg.value(&day_before, &pricer, &market, &quoting).is_ok());
}

#[test]
fn missing_curve_is_reported() {
    let (val, pricer, quoting) = params(d(2025, 1, 2));
    let leg = FixedStream::new(
        Currency::EUR,
        1e6,
        &Schedule::new(d(2025, 1, 6), d(2026, 1, 6), Frequency::Annual),
        DayCountConvention::Act360,
        0.03,
    )
    .unwrap();
    assert!(matches!(
        leg.value(&val, &pricer, &market(), &quoting),
        Err(ProductError::MissingCurve { currency: Currency::EUR })
    ));
}

#[test]
fn channels_collapse_without_volatility() {
    let (val, pricer, quoting) = params(d(2025, 1, 2));
    let market = market();
    let schedule = Schedule::new(d(2025, 1, 6), d(2027, 1, 6), Frequency::Quarterly);
    let leg = FloatingStream::new(1e6, &schedule, FloatingRateIndex::sofr_3m(), 0.001).unwrap();
    let m = leg.value(&val, &pricer, &market, &quoting).unwrap();

    let unadjusted = m.channel(ConvexityChannel::Unadjusted).dirty_pv;
    for channel in ConvexityChannel::ALL {
        assert_relative_eq!(m.channel(channel).dirty_pv, unadjusted, max_relative = 1e-14);
    }
}

// =============================================================================
// SWAPS
// =============================================================================

fn swap(rate: f64) -> FixFloatComponent {
    let fixed = fixed_leg(d(2025, 1, 6), d(2030, 1, 6), rate);
    let schedule = Schedule::new(d(2025, 1, 6), d(2030, 1, 6), Frequency::Quarterly);
    let floating = FloatingStream::new(-1e6, &schedule, FloatingRateIndex::sofr_3m(), 0.0).unwrap();
    FixFloatComponent::new("USD.IRS.5Y", fixed, floating).unwrap()
}

#[test]
fn swap_at_par_rate_has_zero_clean_pv() {
    let (val, pricer, quoting) = params(d(2025, 1, 2));
    let market = market();
    let par = swap(0.03)
        .measure_value(&val, &pricer, &market, &quoting, "ParSwapRate")
        .unwrap();
    let pv = swap(par)
        .measure_value(&val, &pricer, &market, &quoting, "CleanPV")
        .unwrap();
    assert_relative_eq!(pv, 0.0, epsilon = 1e-6);
}

#[test]
fn basis_spread_sign_convention() {
    let (val, pricer, quoting) = params(d(2025, 1, 2));
    let market = market();
    let schedule = Schedule::new(d(2025, 1, 6), d(2027, 1, 6), Frequency::Quarterly);
    let reference = FloatingStream::new(1e6, &schedule, FloatingRateIndex::sofr_3m(), 0.0).unwrap();
    let monthly = Schedule::new(d(2025, 1, 6), d(2027, 1, 6), Frequency::Monthly);
    let derived = FloatingStream::new(-1e6, &monthly, FloatingRateIndex::sofr_1m(), 0.0).unwrap();
    let basis = FloatFloatComponent::new("USD.BASIS.1M3M", reference, derived).unwrap();

    let map = basis.value_map(&val, &pricer, &market, &quoting).unwrap();
    let reference_pv = map.get("ReferenceCleanPV").unwrap();
    let derived_pv = map.get("DerivedCleanPV").unwrap();
    let derived_dv01 = map.get("DerivedCleanDV01").unwrap();
    assert_relative_eq!(
        map.get("DerivedParBasisSpread").unwrap(),
        -(reference_pv + derived_pv) / map.get("ReferenceCleanDV01").unwrap(),
        max_relative = 1e-12
    );
    assert_relative_eq!(
        map.get("ReferenceParBasisSpread").unwrap(),
        -(reference_pv + derived_pv) / derived_dv01,
        max_relative = 1e-12
    );
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn clean_dirty_consistency(
        coupon in 0.0f64..0.10,
        notional in prop::sample::select(vec![-5e6, -1e6, 1e6, 2.5e7]),
        offset in 0i64..700,
    ) {
        let value_date = d(2025, 1, 2).add_days(offset);
        let (val, pricer, quoting) = params(value_date);
        let schedule = Schedule::new(d(2025, 1, 6), d(2027, 1, 6), Frequency::Quarterly);
        let leg = FixedStream::new(Currency::USD, notional, &schedule, DayCountConvention::Act360, coupon).unwrap();
        let m = leg.value(&val, &pricer, &market(), &quoting).unwrap();

        prop_assert!((m.clean_pv() + m.accrued - m.pv()).abs() <= 1e-9 * notional.abs());
        prop_assert!((m.clean_dv01() + m.accrued01 - m.dv01()).abs() <= 1e-12 * notional.abs());
        prop_assert!((m.fair_premium() - coupon).abs() < 1e-10);
    }
}
