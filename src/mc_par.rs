use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use tracing::{ debug, trace };

use crate::error::Result;
use crate::market::MarketParams;
use crate::mc::{ sample_payoff, validate_paths, McEstimate, PayoffStats };
use crate::rng::PathRng;

/// Paths simulated by one rayon task.
pub const CHUNK_PATHS: usize = 8192;

/// Parallel version of [`crate::mc::price_monte_carlo_with_stats`].
///
/// Every chunk gets its own generator forked from `rng` before any work is
/// handed to rayon, so no generator state is shared between threads and a
/// fixed seed gives the same estimate regardless of the thread count.
pub fn price_monte_carlo_par(
    market: &MarketParams,
    num_paths: usize,
    rng: &mut PathRng
) -> Result<McEstimate> {
    market.validate()?;
    validate_paths(num_paths)?;

    let chunks: Vec<(usize, PathRng)> = (0..num_paths)
        .step_by(CHUNK_PATHS)
        .map(|start| (CHUNK_PATHS.min(num_paths - start), rng.fork()))
        .collect();
    debug!(num_paths, chunks = chunks.len(), seed = rng.seed(), "parallel monte carlo");

    let stats = chunks
        .into_par_iter()
        .map(|(paths, mut chunk_rng)| {
            let mut stats = PayoffStats::default();
            for _ in 0..paths {
                stats.push(sample_payoff(market, &mut chunk_rng));
            }
            trace!(paths, chunk_seed = chunk_rng.seed(), mean = stats.mean(), "chunk done");
            stats
        })
        .reduce(PayoffStats::default, PayoffStats::merge);

    let estimate = stats.into_estimate(market.discount_factor());
    debug!(?market, price = estimate.price, std_error = estimate.std_error, "parallel monte carlo estimate");
    Ok(estimate)
}

/// Parallel discounted price only.
pub fn price_monte_carlo_par_scalar(
    market: &MarketParams,
    num_paths: usize,
    rng: &mut PathRng
) -> Result<f64> {
    price_monte_carlo_par(market, num_paths, rng).map(|estimate| estimate.price)
}

#[cfg(test)]
use crate::bs;

#[test]
fn valid_price_par1() {
    let market = MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0);
    let actual_price = bs::price(&market).unwrap().premium;
    let estimate = price_monte_carlo_par(&market, 500_000, &mut PathRng::from_seed(42)).unwrap();
    println!("mc_par 1 {} vs {}", estimate.price, actual_price);
    assert!((estimate.price - actual_price).abs() / actual_price < 0.02);
    assert_eq!(estimate.num_paths, 500_000);
}

#[test]
fn valid_price_par_put() {
    let market = MarketParams::put(112.0, 110.0, 0.05, 0.2, 1.0);
    let actual_price = bs::price(&market).unwrap().premium;
    let estimate = price_monte_carlo_par(&market, 200_000, &mut PathRng::from_seed(43)).unwrap();
    println!("mc_par put {} vs {}", estimate.price, actual_price);
    assert!((estimate.price - actual_price).abs() < 5.0 * estimate.std_error);
}

#[test]
fn same_seed_same_estimate() {
    let market = MarketParams::call(105.0, 100.0, 0.03, 0.25, 0.5);
    let first = price_monte_carlo_par(&market, 50_000, &mut PathRng::from_seed(7)).unwrap();
    let second = price_monte_carlo_par(&market, 50_000, &mut PathRng::from_seed(7)).unwrap();
    assert_eq!(first.num_paths, second.num_paths);
    approx::assert_relative_eq!(first.price, second.price, max_relative = 1e-12);
}

#[test]
fn uneven_last_chunk() {
    let market = MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0);
    let estimate = price_monte_carlo_par(&market, CHUNK_PATHS + 5, &mut PathRng::from_seed(8)).unwrap();
    assert_eq!(estimate.num_paths, CHUNK_PATHS + 5);
    let single = price_monte_carlo_par(&market, 1, &mut PathRng::from_seed(8)).unwrap();
    assert_eq!(single.num_paths, 1);
    assert_eq!(single.std_error, 0.0);
}

#[test]
fn rejects_zero_paths() {
    let market = MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0);
    let result = price_monte_carlo_par_scalar(&market, 0, &mut PathRng::from_seed(0));
    assert!(matches!(result, Err(crate::error::PricingError::InvalidInput(_))));
}
