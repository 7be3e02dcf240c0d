use approx::assert_relative_eq;
use option_pricer::{
    bs,
    mc,
    mc_par,
    normal,
    GreeksConvention,
    MarketParams,
    OptionType,
    PathRng,
    PricingError,
};

fn canonical(option_type: OptionType) -> MarketParams {
    MarketParams::new(100.0, 100.0, 0.05, 0.2, 1.0, option_type)
}

#[test]
fn both_pricers_agree_on_canonical_scenario() {
    for option_type in [OptionType::Call, OptionType::Put] {
        let market = canonical(option_type);
        let analytic = bs::price(&market).unwrap().premium;

        let mut deviations = Vec::new();
        for seed in [1, 2, 3, 4] {
            let price = mc::price_monte_carlo(&market, 500_000, &mut PathRng::from_seed(seed)).unwrap();
            deviations.push((price - analytic).abs() / analytic);
        }
        let mean_deviation = deviations.iter().sum::<f64>() / (deviations.len() as f64);
        println!("{option_type:?} bs {analytic} mean deviation {mean_deviation}");
        assert!(mean_deviation < 0.02);
    }
}

#[test]
fn canonical_reference_values() {
    let call = bs::price(&canonical(OptionType::Call)).unwrap();
    let put = bs::price(&canonical(OptionType::Put)).unwrap();
    assert!((call.premium - 10.45).abs() < 0.01);
    assert!((put.premium - 5.57).abs() < 0.01);
    assert_relative_eq!(call.premium - put.premium, 100.0 - 100.0 * (-0.05f64).exp(), max_relative = 1e-6);
}

#[test]
fn serial_and_parallel_estimates_overlap() {
    let market = MarketParams::put(90.0, 100.0, 0.03, 0.3, 0.5);
    let serial = mc::price_monte_carlo_with_stats(&market, 200_000, &mut PathRng::from_seed(21)).unwrap();
    let parallel = mc_par::price_monte_carlo_par(&market, 200_000, &mut PathRng::from_seed(22)).unwrap();
    let combined_error = (serial.std_error.powi(2) + parallel.std_error.powi(2)).sqrt();
    assert!((serial.price - parallel.price).abs() < 5.0 * combined_error);
}

#[test]
fn each_invalid_input_is_rejected() {
    let good = canonical(OptionType::Call);
    let mut rng = PathRng::from_seed(0);
    let bad = [
        MarketParams { spot: 0.0, ..good },
        MarketParams { strike: -5.0, ..good },
        MarketParams { volatility: 0.0, ..good },
        MarketParams { time_to_maturity: 0.0, ..good },
    ];
    for market in bad {
        assert!(matches!(bs::price(&market), Err(PricingError::InvalidInput(_))));
        assert!(matches!(mc::price_monte_carlo(&market, 1_000, &mut rng), Err(PricingError::InvalidInput(_))));
        assert!(matches!(mc_par::price_monte_carlo_par(&market, 1_000, &mut rng), Err(PricingError::InvalidInput(_))));
    }
    assert!(matches!(mc::price_monte_carlo(&good, 0, &mut rng), Err(PricingError::InvalidInput(_))));
}

#[test]
fn implied_volatility_recovers_monte_carlo_inputs() {
    let market = MarketParams::call(95.0, 100.0, 0.02, 0.35, 0.75);
    let quoted = bs::premium(&market).unwrap();
    let solved = bs::implied_volatility(&market.with_volatility(0.1), quoted).unwrap();
    assert_relative_eq!(solved, 0.35, epsilon = 1e-6);

    // the result record's field is only an echo of the input
    let result = bs::price_with(&market, GreeksConvention::Textbook).unwrap();
    assert_eq!(result.implied_volatility, market.volatility);
}

#[test]
fn cdf_properties_hold_on_wide_range() {
    assert!((normal::normal_cdf(0.0) - 0.5).abs() < 1e-6);
    for i in -100..=100 {
        let x = i as f64 / 10.0;
        assert!((normal::normal_cdf(x) + normal::normal_cdf(-x) - 1.0).abs() < 1e-6);
    }
}
