//! European option pricing two ways: the Black-Scholes closed form with its
//! Greeks, and a Monte Carlo estimate over terminal GBM prices.

pub mod bs;
pub mod config;
pub mod error;
pub mod market;
pub mod mc;
pub mod mc_par;
pub mod normal;
pub mod rng;

pub use bs::{ GreeksConvention, PricingResult };
pub use config::PricingConfig;
pub use error::{ PricingError, Result };
pub use market::{ MarketParams, OptionType };
pub use mc::McEstimate;
pub use rng::PathRng;
