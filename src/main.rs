use option_pricer::{ bs, mc, mc_par, MarketParams, PricingConfig, Result };
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = PricingConfig::from_env()?;
    let mut rng = config.rng();
    info!(num_paths = config.num_paths, seed = rng.seed(), parallel = config.parallel, "pricing");

    let spot = 100.0;
    let strike = 100.0;
    let rate = 0.05;
    let volatility = 0.2;
    let years_to_expiry = 1.0;

    for market in [
        MarketParams::call(spot, strike, rate, volatility, years_to_expiry),
        MarketParams::put(spot, strike, rate, volatility, years_to_expiry),
    ] {
        let analytic = bs::price_with(&market, config.greeks)?;
        let estimate = if config.parallel {
            mc_par::price_monte_carlo_par(&market, config.num_paths, &mut rng)?
        } else {
            mc::price_monte_carlo_with_stats(&market, config.num_paths, &mut rng)?
        };

        println!(
            "European {:?} Black-Scholes price: {:.4}, dte: {}, delta: {:.4}, gamma: {:.4}, theta: {:.4}, vega: {:.4}, rho: {:.4}, implied volatility: {:.4}, intrinsic value: {:.4}",
            market.option_type,
            analytic.premium,
            analytic.days_to_expiry,
            analytic.delta,
            analytic.gamma,
            analytic.theta,
            analytic.vega,
            analytic.rho,
            analytic.implied_volatility,
            analytic.intrinsic_value
        );
        println!(
            "European {:?} Monte-carlo price: {:.4} (std error {:.4}, {} paths)",
            market.option_type,
            estimate.price,
            estimate.std_error,
            estimate.num_paths
        );
    }

    Ok(())
}
