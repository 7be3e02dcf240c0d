use tracing::debug;

use crate::error::{ PricingError, Result };
use crate::market::MarketParams;
use crate::rng::{ terminal_price, PathRng };

/// Discounted Monte Carlo price with its sampling error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McEstimate {
    pub price: f64,
    /// Standard error of `price`, already discounted
    pub std_error: f64,
    pub num_paths: usize,
}

impl McEstimate {
    /// 95% normal confidence interval around `price`.
    pub fn confidence_interval(&self) -> (f64, f64) {
        (self.price - 1.96 * self.std_error, self.price + 1.96 * self.std_error)
    }
}

/// Running mean and sum of squared deviations of the undiscounted payoffs
/// (Welford). Two accumulators can be merged, which is how the parallel
/// pricer reduces its chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PayoffStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl PayoffStats {
    #[inline(always)]
    pub fn push(&mut self, payoff: f64) {
        self.count += 1;
        let delta = payoff - self.mean;
        self.mean += delta / (self.count as f64);
        self.m2 += delta * (payoff - self.mean);
    }

    pub fn merge(self, other: PayoffStats) -> PayoffStats {
        if self.count == 0 {
            return other;
        }
        if other.count == 0 {
            return self;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let mean = self.mean + (delta * (other.count as f64)) / (count as f64);
        let m2 =
            self.m2 +
            other.m2 +
            (delta * delta * (self.count as f64) * (other.count as f64)) / (count as f64);
        PayoffStats { count, mean, m2 }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance, zero for fewer than two payoffs.
    pub fn variance(&self) -> f64 {
        if self.count < 2 { 0.0 } else { self.m2 / ((self.count - 1) as f64) }
    }

    pub fn into_estimate(self, discount: f64) -> McEstimate {
        let std_error = if self.count == 0 {
            0.0
        } else {
            (self.variance() / (self.count as f64)).sqrt()
        };
        McEstimate {
            price: discount * self.mean,
            std_error: discount * std_error,
            num_paths: self.count,
        }
    }
}

pub(crate) fn validate_paths(num_paths: usize) -> Result<()> {
    if num_paths == 0 {
        return Err(PricingError::InvalidInput("num_paths must be positive, got 0".to_string()));
    }
    Ok(())
}

/// Payoff of one simulated path.
#[inline(always)]
pub(crate) fn sample_payoff(market: &MarketParams, rng: &mut PathRng) -> f64 {
    let z = rng.draw_gaussian(0.0, 1.0);
    market.option_type.payoff(terminal_price(market, z), market.strike)
}

/// Discounted average payoff over `num_paths` terminal prices drawn from
/// risk-neutral GBM. The error shrinks like `1/sqrt(num_paths)`; no variance
/// reduction is applied.
pub fn price_monte_carlo(market: &MarketParams, num_paths: usize, rng: &mut PathRng) -> Result<f64> {
    market.validate()?;
    validate_paths(num_paths)?;

    let mut total_payoff: f64 = 0.0;
    for _ in 0..num_paths {
        total_payoff += sample_payoff(market, rng);
    }

    let option_price = (total_payoff / (num_paths as f64)) * market.discount_factor();
    debug!(?market, num_paths, seed = rng.seed(), option_price, "monte carlo price");
    Ok(option_price)
}

/// Same estimator as [`price_monte_carlo`], also reporting the standard error.
pub fn price_monte_carlo_with_stats(
    market: &MarketParams,
    num_paths: usize,
    rng: &mut PathRng
) -> Result<McEstimate> {
    market.validate()?;
    validate_paths(num_paths)?;

    let mut stats = PayoffStats::default();
    for _ in 0..num_paths {
        stats.push(sample_payoff(market, rng));
    }

    let estimate = stats.into_estimate(market.discount_factor());
    debug!(?market, num_paths, price = estimate.price, std_error = estimate.std_error, "monte carlo estimate");
    Ok(estimate)
}

#[cfg(test)]
use crate::bs;

#[test]
fn valid_price1() {
    let market = MarketParams::call(100.0, 110.0, 0.05, 0.25, 0.5);
    let actual_price = bs::price(&market).unwrap().premium;
    let price = price_monte_carlo(&market, 100_000, &mut PathRng::from_seed(1)).unwrap();
    println!("mc 1 {} vs {}", price, actual_price);
    assert!((actual_price - price).abs() <= 0.25);
}

#[test]
fn valid_price2() {
    let market = MarketParams::call(130.0, 120.0, 0.05, 0.25, 0.5);
    let actual_price = bs::price(&market).unwrap().premium;
    let price = price_monte_carlo(&market, 100_000, &mut PathRng::from_seed(2)).unwrap();
    println!("mc 2 {} vs {}", price, actual_price);
    assert!((actual_price - price).abs() <= 0.25);
}

#[test]
fn valid_price_put() {
    let market = MarketParams::put(50.0, 60.0, 0.05, 0.2, 1.0);
    let actual_price = bs::price(&market).unwrap().premium;
    let price = price_monte_carlo(&market, 100_000, &mut PathRng::from_seed(3)).unwrap();
    println!("mc put {} vs {}", price, actual_price);
    assert!((actual_price - price).abs() <= 0.25);
}

#[test]
fn valid_price_negative_rate() {
    let market = MarketParams::put(100.0, 100.0, -0.01, 0.3, 0.75);
    let actual_price = bs::price(&market).unwrap().premium;
    let price = price_monte_carlo(&market, 100_000, &mut PathRng::from_seed(4)).unwrap();
    println!("mc negative rate {} vs {}", price, actual_price);
    assert!((actual_price - price).abs() <= 0.25);
}

#[test]
fn converges_to_analytic_canonical() {
    for seed in [10, 20, 30] {
        for market in [
            MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0),
            MarketParams::put(100.0, 100.0, 0.05, 0.2, 1.0),
        ] {
            let actual_price = bs::price(&market).unwrap().premium;
            let price = price_monte_carlo(&market, 500_000, &mut PathRng::from_seed(seed)).unwrap();
            let deviation = (price - actual_price).abs() / actual_price;
            assert!(deviation < 0.02, "seed {seed} {:?}: mc {price} vs bs {actual_price}", market.option_type);
        }
    }
}

#[test]
fn std_error_shrinks_with_paths() {
    let market = MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0);
    let mut rng = PathRng::from_seed(99);
    let small = price_monte_carlo_with_stats(&market, 1_000, &mut rng).unwrap();
    let medium = price_monte_carlo_with_stats(&market, 10_000, &mut rng).unwrap();
    let large = price_monte_carlo_with_stats(&market, 100_000, &mut rng).unwrap();
    assert!(small.std_error > medium.std_error);
    assert!(medium.std_error > large.std_error);
    assert_eq!(large.num_paths, 100_000);

    let actual_price = bs::price(&market).unwrap().premium;
    assert!((large.price - actual_price).abs() < 5.0 * large.std_error);
    let (lo, hi) = large.confidence_interval();
    assert!(lo < large.price && large.price < hi);
}

#[test]
fn stats_and_plain_estimators_agree() {
    let market = MarketParams::put(95.0, 100.0, 0.02, 0.3, 0.5);
    let plain = price_monte_carlo(&market, 20_000, &mut PathRng::from_seed(5)).unwrap();
    let stats = price_monte_carlo_with_stats(&market, 20_000, &mut PathRng::from_seed(5)).unwrap();
    approx::assert_relative_eq!(plain, stats.price, max_relative = 1e-9);
}

#[test]
fn prices_are_never_negative() {
    // deep out of the money: most payoffs are zero
    let market = MarketParams::call(50.0, 200.0, 0.05, 0.1, 0.25);
    let price = price_monte_carlo(&market, 1_000, &mut PathRng::from_entropy()).unwrap();
    assert!(price >= 0.0);
}

#[test]
fn rejects_invalid_inputs() {
    let good = MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0);
    let mut rng = PathRng::from_seed(0);
    assert!(matches!(price_monte_carlo(&good, 0, &mut rng), Err(PricingError::InvalidInput(_))));
    assert!(matches!(price_monte_carlo_with_stats(&good, 0, &mut rng), Err(PricingError::InvalidInput(_))));
    for market in [
        MarketParams { spot: 0.0, ..good },
        MarketParams { strike: -5.0, ..good },
        MarketParams { volatility: 0.0, ..good },
        MarketParams { time_to_maturity: 0.0, ..good },
    ] {
        assert!(matches!(price_monte_carlo(&market, 1_000, &mut rng), Err(PricingError::InvalidInput(_))));
    }
}

#[test]
fn merged_stats_match_sequential() {
    let payoffs = [0.0, 3.5, 1.25, 0.0, 9.0, 4.0, 0.5];
    let mut all = PayoffStats::default();
    let mut left = PayoffStats::default();
    let mut right = PayoffStats::default();
    for (i, &p) in payoffs.iter().enumerate() {
        all.push(p);
        if i < 3 { left.push(p) } else { right.push(p) }
    }
    let merged = left.merge(right);
    assert_eq!(merged.count(), all.count());
    approx::assert_relative_eq!(merged.mean(), all.mean(), max_relative = 1e-12);
    approx::assert_relative_eq!(merged.variance(), all.variance(), max_relative = 1e-12);
    assert_eq!(PayoffStats::default().merge(all), all);
}
