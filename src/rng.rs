//! Gaussian sampling for the Monte Carlo pricers.
//!
//! There is no process-wide generator: callers build a [`PathRng`] and pass it
//! by `&mut` into the pricer. Each thread that draws numbers needs its own
//! handle, which [`PathRng::fork`] provides.

use rand::rngs::StdRng;
use rand_core::{ RngCore, SeedableRng };
use rand_distr::{ Distribution, StandardNormal };

use crate::market::MarketParams;

#[derive(Debug, Clone)]
pub struct PathRng {
    inner: StdRng,
    seed: u64,
}

impl PathRng {
    pub fn from_seed(seed: u64) -> Self {
        PathRng { inner: StdRng::seed_from_u64(seed), seed }
    }

    /// Seeds from the thread-local entropy source. The chosen seed is kept so
    /// a run can be replayed with [`PathRng::from_seed`].
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::thread_rng().next_u64())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One sample from N(mean, stddev²).
    #[inline]
    pub fn draw_gaussian(&mut self, mean: f64, stddev: f64) -> f64 {
        let z: f64 = StandardNormal.sample(&mut self.inner);
        mean + stddev * z
    }

    /// Independent child generator, seeded from this one's stream.
    pub fn fork(&mut self) -> PathRng {
        PathRng::from_seed(self.inner.next_u64())
    }
}

/// Terminal stock price under risk-neutral GBM for a standard normal draw `z`.
#[inline(always)]
pub fn terminal_price(market: &MarketParams, z: f64) -> f64 {
    let drift = (market.rate - 0.5 * market.volatility * market.volatility) * market.time_to_maturity;
    let diffusion = market.volatility * market.time_to_maturity.sqrt();
    market.spot * (drift + diffusion * z).exp()
}

#[cfg(test)]
fn test_gaussian_distribution(samples: usize, mean: f64, stddev: f64, diff_limit: f64) {
    let mut rng = PathRng::from_entropy();
    let draws: Vec<f64> = (0..samples).map(|_| rng.draw_gaussian(mean, stddev)).collect();

    let sample_mean = draws.iter().sum::<f64>() / (samples as f64);
    let variance =
        draws
            .iter()
            .map(|x| (x - sample_mean).powi(2))
            .sum::<f64>() / (samples as f64);

    let mean_difference = (sample_mean - mean).abs();
    let stddev_difference = (variance.sqrt() - stddev).abs();

    assert!(mean_difference <= diff_limit, "Mean difference was more than {diff_limit:.5}: {mean_difference:.5}. Expected mean: {mean:.6}, actual mean: {sample_mean:.6}");
    assert!(stddev_difference <= diff_limit, "Std deviation difference was more than {diff_limit:.5}: {stddev_difference:.5}. Expected std deviation: {stddev:.6}, actual: {:.6}", variance.sqrt());
}

#[test]
fn test_standard_normal_100000() {
    test_gaussian_distribution(100_000, 0.0, 1.0, 0.02);
}

#[test]
fn test_shifted_normal_100000() {
    test_gaussian_distribution(100_000, 3.0, 0.5, 0.01);
}

#[test]
fn same_seed_same_stream() {
    let mut a = PathRng::from_seed(7);
    let mut b = PathRng::from_seed(7);
    for _ in 0..100 {
        assert_eq!(a.draw_gaussian(0.0, 1.0), b.draw_gaussian(0.0, 1.0));
    }
}

#[test]
fn forks_are_independent_but_reproducible() {
    let mut parent_a = PathRng::from_seed(11);
    let mut parent_b = PathRng::from_seed(11);
    let mut first = parent_a.fork();
    let mut second = parent_a.fork();
    let mut first_again = parent_b.fork();

    assert_ne!(first.seed(), second.seed());
    assert_eq!(first.seed(), first_again.seed());
    assert_eq!(first.draw_gaussian(0.0, 1.0), first_again.draw_gaussian(0.0, 1.0));
    assert_ne!(first.draw_gaussian(0.0, 1.0), second.draw_gaussian(0.0, 1.0));
}

#[test]
fn terminal_price_at_zero_draw() {
    let market = MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0);
    let expected = 100.0 * ((0.05 - 0.02) * 1.0f64).exp();
    approx::assert_relative_eq!(terminal_price(&market, 0.0), expected, max_relative = 1e-12);
}

#[test]
fn terminal_price_moves_with_draw() {
    let market = MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0);
    assert!(terminal_price(&market, 1.0) > terminal_price(&market, 0.0));
    assert!(terminal_price(&market, -1.0) < terminal_price(&market, 0.0));
    assert!(terminal_price(&market, -10.0) > 0.0);
}
