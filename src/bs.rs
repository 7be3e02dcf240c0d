use tracing::{ debug, warn };

use crate::error::{ PricingError, Result };
use crate::market::{ MarketParams, OptionType };
use crate::normal::{ normal_cdf, normal_pdf };

const MIN_VOLATILITY: f64 = 1e-6;
const MAX_VOLATILITY: f64 = 5.0;
const IV_PRICE_TOLERANCE: f64 = 1e-10;
const IV_MAX_ITERATIONS: usize = 100;

/// Which formulas gamma, vega and the decay term of theta use.
///
/// `Legacy` weights them with the normal CDF `N(d1)`. That is what existing
/// consumers of this pricer have always been given, so it stays the default,
/// but it is not the textbook sensitivity. `Textbook` uses the normal density
/// `φ(d1)` and agrees with finite differences of the premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GreeksConvention {
    #[default]
    Legacy,
    Textbook,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingResult {
    pub premium: f64,
    pub days_to_expiry: i64,
    pub delta: f64,
    pub gamma: f64,
    /// Per year
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
    /// Echo of the input volatility. This is not solved from a market price,
    /// use [`implied_volatility`] for that.
    pub implied_volatility: f64,
    pub intrinsic_value: f64,
}

struct Terms {
    d1: f64,
    d2: f64,
    sqrt_t: f64,
    discount: f64,
}

fn terms(market: &MarketParams) -> Terms {
    let sqrt_t = market.time_to_maturity.sqrt();
    let d1 =
        ((market.spot / market.strike).ln() +
            (market.rate + (market.volatility * market.volatility) / 2.0) *
                market.time_to_maturity) /
        (market.volatility * sqrt_t);
    let d2 = d1 - market.volatility * sqrt_t;
    Terms { d1, d2, sqrt_t, discount: market.discount_factor() }
}

fn premium_unchecked(market: &MarketParams, t: &Terms) -> f64 {
    match market.option_type {
        OptionType::Call =>
            market.spot * normal_cdf(t.d1) - market.strike * t.discount * normal_cdf(t.d2),
        OptionType::Put =>
            market.strike * t.discount * normal_cdf(-t.d2) - market.spot * normal_cdf(-t.d1),
    }
}

/// Black-Scholes premium and Greeks with the default convention.
pub fn price(market: &MarketParams) -> Result<PricingResult> {
    price_with(market, GreeksConvention::default())
}

pub fn price_with(market: &MarketParams, convention: GreeksConvention) -> Result<PricingResult> {
    market.validate()?;

    let t = terms(market);
    let spot = market.spot;
    let strike = market.strike;
    let volatility = market.volatility;

    // gamma, vega and theta's decay term share this weight
    let weight = match convention {
        GreeksConvention::Legacy => normal_cdf(t.d1),
        GreeksConvention::Textbook => normal_pdf(t.d1),
    };
    let gamma = weight / (spot * volatility * t.sqrt_t);
    let vega = spot * weight * t.sqrt_t;
    let decay = -(spot * weight * volatility) / (2.0 * t.sqrt_t);

    let (delta, theta, rho) = match market.option_type {
        OptionType::Call =>
            (
                normal_cdf(t.d1),
                decay - market.rate * strike * t.discount * normal_cdf(t.d2),
                strike * market.time_to_maturity * t.discount * normal_cdf(t.d2),
            ),
        OptionType::Put =>
            (
                normal_cdf(t.d1) - 1.0,
                decay + market.rate * strike * t.discount * normal_cdf(-t.d2),
                -strike * market.time_to_maturity * t.discount * normal_cdf(-t.d2),
            ),
    };

    let result = PricingResult {
        premium: premium_unchecked(market, &t),
        days_to_expiry: market.days_to_expiry(),
        delta,
        gamma,
        theta,
        vega,
        rho,
        implied_volatility: volatility,
        intrinsic_value: market.intrinsic_value(),
    };

    debug!(?market, ?convention, premium = result.premium, delta = result.delta, "analytic price");
    Ok(result)
}

/// Premium only, skipping the Greeks.
pub fn premium(market: &MarketParams) -> Result<f64> {
    market.validate()?;
    Ok(premium_unchecked(market, &terms(market)))
}

/// Solves for the volatility at which the Black-Scholes premium equals
/// `market_premium`. `market.volatility` is used as the starting guess.
///
/// Newton steps use the density vega; whenever a step would leave the current
/// bracket the solver bisects instead.
pub fn implied_volatility(market: &MarketParams, market_premium: f64) -> Result<f64> {
    market.validate()?;

    let discounted_strike = market.strike * market.discount_factor();
    let (lower, upper) = match market.option_type {
        OptionType::Call => ((market.spot - discounted_strike).max(0.0), market.spot),
        OptionType::Put => ((discounted_strike - market.spot).max(0.0), discounted_strike),
    };
    if !(market_premium > lower && market_premium < upper) {
        return Err(
            PricingError::InvalidInput(
                format!("premium {market_premium} outside no-arbitrage bounds ({lower}, {upper})")
            )
        );
    }

    let premium_at = |sigma: f64| {
        let trial = market.with_volatility(sigma);
        premium_unchecked(&trial, &terms(&trial))
    };
    if market_premium > premium_at(MAX_VOLATILITY) || market_premium < premium_at(MIN_VOLATILITY) {
        return Err(
            PricingError::InvalidInput(
                format!("premium {market_premium} needs a volatility outside [{MIN_VOLATILITY}, {MAX_VOLATILITY}]")
            )
        );
    }

    let mut lo = MIN_VOLATILITY;
    let mut hi = MAX_VOLATILITY;
    let mut sigma = market.volatility.clamp(lo, hi);

    for iteration in 0..IV_MAX_ITERATIONS {
        let trial = market.with_volatility(sigma);
        let t = terms(&trial);
        let diff = premium_unchecked(&trial, &t) - market_premium;

        if diff.abs() < IV_PRICE_TOLERANCE {
            debug!(iteration, sigma, "implied volatility converged");
            return Ok(sigma);
        }

        // premium is increasing in volatility
        if diff > 0.0 {
            hi = sigma;
        } else {
            lo = sigma;
        }

        let vega = trial.spot * normal_pdf(t.d1) * t.sqrt_t;
        let newton = sigma - diff / vega;
        sigma = if newton.is_finite() && newton > lo && newton < hi {
            newton
        } else {
            debug!(iteration, sigma, vega, "newton step left bracket, bisecting");
            0.5 * (lo + hi)
        };
    }

    warn!(?market, market_premium, sigma, "implied volatility did not converge");
    Err(PricingError::NoConvergence { iterations: IV_MAX_ITERATIONS, last: sigma })
}

#[cfg(test)]
fn canonical(option_type: OptionType) -> MarketParams {
    MarketParams::new(100.0, 100.0, 0.05, 0.2, 1.0, option_type)
}

#[test]
fn canonical_premiums() {
    let call = price(&canonical(OptionType::Call)).unwrap();
    let put = price(&canonical(OptionType::Put)).unwrap();
    println!("bs call {} put {}", call.premium, put.premium);
    assert!((call.premium - 10.4506).abs() < 1e-3);
    assert!((put.premium - 5.5735).abs() < 1e-3);
    assert_eq!(call.days_to_expiry, 365);
    assert_eq!(put.days_to_expiry, 365);
}

#[test]
fn put_call_parity() {
    for &(spot, strike, rate, volatility, years) in &[
        (100.0, 100.0, 0.05, 0.2, 1.0),
        (80.0, 100.0, 0.01, 0.35, 0.25),
        (130.0, 120.0, -0.01, 0.15, 2.0),
        (50.0, 60.0, 0.0, 0.5, 0.1),
    ] {
        let call = price(&MarketParams::call(spot, strike, rate, volatility, years)).unwrap();
        let put = price(&MarketParams::put(spot, strike, rate, volatility, years)).unwrap();
        let forward = spot - strike * (-rate * years).exp();
        approx::assert_relative_eq!(call.premium - put.premium, forward, max_relative = 1e-6, epsilon = 1e-9);
    }
}

#[test]
fn at_the_money_delta_ranges() {
    let call = price(&canonical(OptionType::Call)).unwrap();
    let put = price(&canonical(OptionType::Put)).unwrap();
    assert!(call.delta > 0.0 && call.delta < 1.0);
    assert!(put.delta > -1.0 && put.delta < 0.0);
    approx::assert_relative_eq!(call.delta - put.delta, 1.0, epsilon = 1e-12);
}

#[test]
fn legacy_greeks_follow_cdf_formulas() {
    let call = price(&canonical(OptionType::Call)).unwrap();
    let put = price(&canonical(OptionType::Put)).unwrap();
    let n_d1 = normal_cdf(0.35);
    let n_d2 = normal_cdf(0.15);
    let discount = (-0.05f64).exp();

    approx::assert_relative_eq!(call.gamma, n_d1 / 20.0, max_relative = 1e-12);
    approx::assert_relative_eq!(call.vega, 100.0 * n_d1, max_relative = 1e-12);
    approx::assert_relative_eq!(call.theta, -(100.0 * n_d1 * 0.2) / 2.0 - 0.05 * 100.0 * discount * n_d2, max_relative = 1e-12);
    approx::assert_relative_eq!(call.rho, 100.0 * discount * n_d2, max_relative = 1e-12);

    assert_eq!(put.gamma, call.gamma);
    assert_eq!(put.vega, call.vega);
    approx::assert_relative_eq!(put.rho, -100.0 * discount * (1.0 - n_d2), max_relative = 1e-9);
}

#[test]
fn implied_volatility_field_echoes_input() {
    let market = MarketParams::put(105.0, 100.0, 0.03, 0.27, 0.75);
    assert_eq!(price(&market).unwrap().implied_volatility, 0.27);
}

#[test]
fn intrinsic_value_exact() {
    for spot in [50.0, 99.5, 100.0, 100.5, 150.0] {
        let call = price(&MarketParams::call(spot, 100.0, 0.05, 0.2, 1.0)).unwrap();
        let put = price(&MarketParams::put(spot, 100.0, 0.05, 0.2, 1.0)).unwrap();
        assert_eq!(call.intrinsic_value, (spot - 100.0f64).max(0.0));
        assert_eq!(put.intrinsic_value, (100.0f64 - spot).max(0.0));
        assert!(call.intrinsic_value >= 0.0 && put.intrinsic_value >= 0.0);
    }
}

#[test]
fn textbook_greeks_match_finite_differences() {
    for option_type in [OptionType::Call, OptionType::Put] {
        let market = MarketParams::new(105.0, 100.0, 0.04, 0.25, 0.8, option_type);
        let greeks = price_with(&market, GreeksConvention::Textbook).unwrap();

        let h = 0.01;
        let up = MarketParams { spot: market.spot + h, ..market };
        let down = MarketParams { spot: market.spot - h, ..market };
        let fd_gamma = (price(&up).unwrap().delta - price(&down).unwrap().delta) / (2.0 * h);
        approx::assert_relative_eq!(greeks.gamma, fd_gamma, max_relative = 1e-3);

        let h = 1e-3;
        let fd_vega =
            (premium(&market.with_volatility(0.25 + h)).unwrap() -
                premium(&market.with_volatility(0.25 - h)).unwrap()) / (2.0 * h);
        approx::assert_relative_eq!(greeks.vega, fd_vega, max_relative = 1e-3);

        let up = MarketParams { rate: market.rate + h, ..market };
        let down = MarketParams { rate: market.rate - h, ..market };
        let fd_rho = (premium(&up).unwrap() - premium(&down).unwrap()) / (2.0 * h);
        approx::assert_relative_eq!(greeks.rho, fd_rho, max_relative = 1e-3);

        let h = 0.01;
        let longer = MarketParams { time_to_maturity: market.time_to_maturity + h, ..market };
        let shorter = MarketParams { time_to_maturity: market.time_to_maturity - h, ..market };
        // theta is decay as calendar time passes, so the sign flips
        let fd_theta = -(premium(&longer).unwrap() - premium(&shorter).unwrap()) / (2.0 * h);
        approx::assert_relative_eq!(greeks.theta, fd_theta, max_relative = 1e-3);
    }
}

#[test]
fn textbook_and_legacy_share_premium_delta_rho() {
    let market = canonical(OptionType::Call);
    let legacy = price_with(&market, GreeksConvention::Legacy).unwrap();
    let textbook = price_with(&market, GreeksConvention::Textbook).unwrap();
    assert_eq!(legacy.premium, textbook.premium);
    assert_eq!(legacy.delta, textbook.delta);
    assert_eq!(legacy.rho, textbook.rho);
    assert!(textbook.gamma < legacy.gamma);
}

#[test]
fn rejects_invalid_inputs() {
    let good = canonical(OptionType::Call);
    for market in [
        MarketParams { spot: 0.0, ..good },
        MarketParams { strike: -5.0, ..good },
        MarketParams { volatility: 0.0, ..good },
        MarketParams { time_to_maturity: 0.0, ..good },
    ] {
        assert!(matches!(price(&market), Err(PricingError::InvalidInput(_))));
        assert!(matches!(premium(&market), Err(PricingError::InvalidInput(_))));
    }
}

#[test]
fn implied_volatility_round_trip() {
    for option_type in [OptionType::Call, OptionType::Put] {
        for &(spot, true_vol) in &[(100.0, 0.3), (80.0, 0.15), (125.0, 0.6), (100.0, 1.5)] {
            let market = MarketParams::new(spot, 100.0, 0.03, true_vol, 0.5, option_type);
            let target = premium(&market).unwrap();
            let solved = implied_volatility(&market.with_volatility(0.2), target).unwrap();
            assert!((solved - true_vol).abs() < 1e-6, "{option_type:?} spot {spot}: {solved} vs {true_vol}");
        }
    }
}

#[test]
fn implied_volatility_rejects_arbitrage_premiums() {
    let market = canonical(OptionType::Call);
    assert!(matches!(implied_volatility(&market, 0.0), Err(PricingError::InvalidInput(_))));
    assert!(matches!(implied_volatility(&market, 100.0), Err(PricingError::InvalidInput(_))));
    assert!(matches!(implied_volatility(&market, -1.0), Err(PricingError::InvalidInput(_))));
}
