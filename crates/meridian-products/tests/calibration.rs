//! Calibration constraints end to end.
//!
//! A small test-only bisection bootstraps a zero curve node by node from
//! the funding constraints of deposits and swaps, then checks that the
//! finished curve reprices every quote.

use std::sync::Arc;

use approx::assert_relative_eq;

use meridian_core::daycounts::DayCountConvention;
use meridian_core::types::{Currency, Date, FloatingRateIndex, Frequency};
use meridian_curves::{DiscountCurve, MarketParams, ZeroNodeCurve};
use meridian_products::prelude::*;

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

fn today() -> Date {
    d(2025, 1, 2)
}

fn deposit(name: &str, end: Date) -> Box<dyn Component> {
    Box::new(
        DepositComponent::new(name, Currency::USD, d(2025, 1, 6), end, DayCountConvention::Act360, 1e6, 0.0)
            .unwrap(),
    )
}

fn swap(name: &str, maturity: Date) -> Box<dyn Component> {
    let fixed = FixedStream::new(
        Currency::USD,
        1e6,
        &Schedule::new(d(2025, 1, 6), maturity, Frequency::Annual),
        DayCountConvention::Act360,
        0.0,
    )
    .unwrap();
    let floating = FloatingStream::new(
        -1e6,
        &Schedule::new(d(2025, 1, 6), maturity, Frequency::Quarterly),
        FloatingRateIndex::sofr_3m(),
        0.0,
    )
    .unwrap();
    Box::new(FixFloatComponent::new(name, fixed, floating).unwrap())
}

fn curve(nodes: &[(Date, f64)]) -> ZeroNodeCurve {
    ZeroNodeCurve::new(today(), Currency::USD, nodes).unwrap()
}

fn market(nodes: &[(Date, f64)]) -> MarketParams {
    MarketParams::new().with_funding_curve(Arc::new(curve(nodes)))
}

fn bisect(mut f: impl FnMut(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    let mut f_lo = f(lo);
    assert!(f_lo * f(hi) < 0.0, "root is not bracketed");
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid * f_lo > 0.0 {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

#[test]
fn bootstrap_reprices_every_quote() {
    let instruments: Vec<(Box<dyn Component>, Quote)> = vec![
        (deposit("USD.DEP.3M", d(2025, 4, 7)), Quote::Rate(0.0435)),
        (deposit("USD.DEP.6M", d(2025, 7, 7)), Quote::Rate(0.0428)),
        (swap("USD.IRS.2Y", d(2027, 1, 6)), Quote::SwapRate(0.0395)),
        (swap("USD.IRS.3Y", d(2028, 1, 6)), Quote::SwapRate(0.0388)),
        (swap("USD.IRS.5Y", d(2030, 1, 7)), Quote::SwapRate(0.0392)),
    ];
    let val = ValuationParams::spot(today());
    let (pricer, quoting) = (PricerParams::default(), QuotingParams::default());

    let mut nodes: Vec<(Date, f64)> = instruments.iter().map(|(c, _)| (c.maturity(), 0.04)).collect();
    for (i, (component, quote)) in instruments.iter().enumerate() {
        let quotes = ProductQuoteSet::single(*quote);
        let prwc = component
            .generate_calib_prwc(&val, &pricer, &market(&nodes), &quoting, LatentState::Funding, &quotes)
            .unwrap();

        let solved = bisect(
            |z| {
                let mut trial = nodes.clone();
                for node in trial.iter_mut().skip(i) {
                    node.1 = z;
                }
                let c = curve(&trial);
                prwc.evaluate(|date| c.df(date)).unwrap() / 1e6
            },
            -0.02,
            0.20,
        );
        for node in nodes.iter_mut().skip(i) {
            node.1 = solved;
        }
    }

    let market = market(&nodes);
    for (component, quote) in &instruments {
        let repriced = component
            .measure_value(&val, &pricer, &market, &quoting, quote.measure_name())
            .unwrap();
        assert_relative_eq!(repriced, quote.value(), epsilon = 1e-9);
    }
}

#[test]
fn deposit_two_point_constraint_pins_forward_df() {
    let dep = deposit("USD.DEP.6M", d(2025, 7, 7));
    let val = ValuationParams::spot(today());
    let prwc = dep
        .generate_calib_prwc(
            &val,
            &PricerParams::default(),
            &market(&[(d(2026, 1, 2), 0.04)]),
            &QuotingParams::default(),
            LatentState::Funding,
            &ProductQuoteSet::single(Quote::Rate(0.04)),
        )
        .unwrap();

    let weights = prwc.predictor_weights();
    assert_eq!(weights.len(), 2);
    assert_relative_eq!(weights[&d(2025, 7, 7)], -1e6);
    let forward_df = weights[&d(2025, 1, 6)] / 1e6;
    let dcf = 182.0 / 360.0;
    assert_relative_eq!(forward_df, 1.0 / (1.0 + 0.04 * dcf), max_relative = 1e-12);
    assert_eq!(prwc.value(), 0.0);
}

#[test]
fn quote_dispatch_requires_exactly_one_match() {
    let irs = swap("USD.IRS.2Y", d(2027, 1, 6));
    let val = ValuationParams::spot(today());
    let market = market(&[(d(2030, 1, 2), 0.04)]);
    let (pricer, quoting) = (PricerParams::default(), QuotingParams::default());
    let prwc = |quotes: &ProductQuoteSet| {
        irs.generate_calib_prwc(&val, &pricer, &market, &quoting, LatentState::Funding, quotes)
    };

    // unrelated quotes are ignored
    let one = ProductQuoteSet::new()
        .with(Quote::SwapRate(0.04))
        .with(Quote::Price(99.5));
    assert!(prwc(&one).is_ok());

    let two = ProductQuoteSet::new().with(Quote::SwapRate(0.04)).with(Quote::Rate(0.04));
    assert!(matches!(prwc(&two), Err(ProductError::QuoteTypeMismatch { .. })));
    assert!(matches!(
        prwc(&ProductQuoteSet::new()),
        Err(ProductError::QuoteTypeMismatch { .. })
    ));
}

#[test]
fn basis_swap_only_calibrates_forward_state() {
    let schedule = Schedule::new(d(2025, 1, 6), d(2027, 1, 6), Frequency::Quarterly);
    let basis = FloatFloatComponent::new(
        "USD.BASIS.1M3M",
        FloatingStream::new(1e6, &schedule, FloatingRateIndex::sofr_3m(), 0.0).unwrap(),
        FloatingStream::new(-1e6, &schedule, FloatingRateIndex::sofr_1m(), 0.0).unwrap(),
    )
    .unwrap();
    let quotes = ProductQuoteSet::single(Quote::ParBasisSpread {
        leg: BasisLeg::Derived,
        spread_bp: 5.0,
    });
    let err = basis
        .generate_calib_prwc(
            &ValuationParams::spot(today()),
            &PricerParams::default(),
            &market(&[(d(2030, 1, 2), 0.04)]),
            &QuotingParams::default(),
            LatentState::Funding,
            &quotes,
        )
        .unwrap_err();
    assert!(matches!(err, ProductError::UnsupportedLatentState { .. }));
}

#[test]
fn batch_valuation_keeps_order_and_isolates_failures() {
    let components: Vec<Box<dyn Component>> = vec![
        deposit("USD.DEP.3M", d(2025, 4, 7)),
        deposit("USD.DEP.1W", d(2025, 1, 13)),
        swap("USD.IRS.2Y", d(2027, 1, 6)),
    ];
    // the swap's first floating period fixed before the value date
    let index = FloatingRateIndex::sofr_3m();
    let mut market = market(&[(d(2030, 1, 2), 0.04)]);
    market.add_fixing(index.label(), index.fixing_date(d(2025, 1, 6)), 0.0433);
    let val = ValuationParams::spot(d(2025, 2, 3));
    let results = value_components(
        &components,
        &val,
        &PricerParams::default(),
        &market,
        &QuotingParams::default(),
    );

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ProductError::Expired { .. })));
    let irs = results[2].as_ref().unwrap();
    assert!(irs.contains("ParSwapRate"));
}

#[test]
fn config_drives_valuation_params() {
    let config = ValuationConfig::from_toml(
        r#"
        name = "eod"
        apply_convexity = false
        cash_settle_lag_days = 2
        "#,
    )
    .unwrap();
    assert!(!config.pricer_params().apply_convexity);
    assert_eq!(config.quoting_params().price_scale, 100.0);

    let val = config.valuation_params(d(2025, 1, 2));
    assert_eq!(val.cash_pay_date, d(2025, 1, 6));

    let bad = ValuationConfig::from_json(r#"{"name": "", "price_scale": -1.0}"#);
    assert!(bad.is_err());
}

fn expired(result: ProductResult<PredictorResponseWeightConstraint>) -> bool {
    matches!(result, Err(ProductError::Expired { .. }))
}

#[test]
fn constraints_are_refused_at_and_after_maturity() {
    let market = market(&[(d(2030, 1, 2), 0.04)]);
    let (pricer, quoting) = (PricerParams::default(), QuotingParams::default());

    let irs = swap("USD.IRS.2Y", d(2027, 1, 6));
    let swap_quote = ProductQuoteSet::single(Quote::SwapRate(0.04));
    let schedule = Schedule::new(d(2025, 1, 6), d(2027, 1, 6), Frequency::Quarterly);
    let basis = FloatFloatComponent::new(
        "USD.BASIS.1M3M",
        FloatingStream::new(1e6, &schedule, FloatingRateIndex::sofr_3m(), 0.0).unwrap(),
        FloatingStream::new(-1e6, &schedule, FloatingRateIndex::sofr_1m(), 0.0).unwrap(),
    )
    .unwrap();
    let basis_quote = ProductQuoteSet::single(Quote::ParBasisSpread {
        leg: BasisLeg::Derived,
        spread_bp: 5.0,
    });

    for value_date in [d(2027, 1, 6), d(2027, 3, 1)] {
        let val = ValuationParams::spot(value_date);
        for state in [LatentState::Funding, LatentState::Forward] {
            assert!(expired(irs.generate_calib_prwc(&val, &pricer, &market, &quoting, state, &swap_quote)));
            assert!(expired(basis.generate_calib_prwc(&val, &pricer, &market, &quoting, state, &basis_quote)));
            // an unrelated quote set still reports the expiry
            assert!(expired(irs.generate_calib_prwc(&val, &pricer, &market, &quoting, state, &basis_quote)));
        }
    }
}

#[test]
fn forward_starting_constraints_are_refused_from_effective() {
    let market = market(&[(d(2030, 1, 2), 0.04)]);
    let (pricer, quoting) = (PricerParams::default(), QuotingParams::default());
    let fra = FraComponent::new(
        "USD.FRA.3x6",
        FloatingRateIndex::sofr_3m(),
        d(2025, 4, 7),
        d(2025, 7, 7),
        1e6,
        0.04,
    )
    .unwrap();
    let quotes = ProductQuoteSet::single(Quote::ForwardRate(0.041));

    for state in [LatentState::Funding, LatentState::Forward] {
        let on_effective = ValuationParams::spot(d(2025, 4, 7));
        assert!(expired(fra.generate_calib_prwc(&on_effective, &pricer, &market, &quoting, state, &quotes)));
        let after = ValuationParams::spot(d(2025, 5, 1));
        assert!(expired(fra.generate_calib_prwc(&after, &pricer, &market, &quoting, state, &quotes)));
        let before = ValuationParams::spot(d(2025, 4, 4));
        assert!(fra.generate_calib_prwc(&before, &pricer, &market, &quoting, state, &quotes).is_ok());
    }
}
