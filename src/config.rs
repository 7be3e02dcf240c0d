use crate::bs::GreeksConvention;
use crate::error::{ PricingError, Result };
use crate::rng::PathRng;

pub const DEFAULT_NUM_PATHS: usize = 100_000;

/// Knobs for a pricing run.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    pub num_paths: usize,
    /// `None` seeds from entropy
    pub seed: Option<u64>,
    pub greeks: GreeksConvention,
    pub parallel: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            num_paths: DEFAULT_NUM_PATHS,
            seed: None,
            greeks: GreeksConvention::Legacy,
            parallel: false,
        }
    }
}

impl PricingConfig {
    /// Reads `PRICER_NUM_PATHS`, `PRICER_SEED`, `PRICER_GREEKS` and
    /// `PRICER_PARALLEL`, after loading a `.env` file if there is one.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self> where F: Fn(&str) -> Option<String> {
        let defaults = PricingConfig::default();

        let num_paths = match lookup("PRICER_NUM_PATHS") {
            Some(raw) => {
                let n = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| PricingError::Config(format!("PRICER_NUM_PATHS: {e}")))?;
                if n == 0 {
                    return Err(PricingError::Config("PRICER_NUM_PATHS: must be positive".to_string()));
                }
                n
            }
            None => defaults.num_paths,
        };

        let seed = lookup("PRICER_SEED")
            .map(|raw| raw.trim().parse::<u64>())
            .transpose()
            .map_err(|e| PricingError::Config(format!("PRICER_SEED: {e}")))?;

        let greeks = match lookup("PRICER_GREEKS").as_deref().map(str::trim) {
            None => defaults.greeks,
            Some(raw) if raw.eq_ignore_ascii_case("legacy") => GreeksConvention::Legacy,
            Some(raw) if raw.eq_ignore_ascii_case("textbook") => GreeksConvention::Textbook,
            Some(other) => {
                return Err(
                    PricingError::Config(format!("PRICER_GREEKS: expected legacy or textbook, got {other}"))
                );
            }
        };

        let parallel = lookup("PRICER_PARALLEL")
            .map(|raw| raw.trim().parse::<bool>())
            .transpose()
            .map_err(|e| PricingError::Config(format!("PRICER_PARALLEL: {e}")))?
            .unwrap_or(defaults.parallel);

        Ok(PricingConfig { num_paths, seed, greeks, parallel })
    }

    pub fn rng(&self) -> PathRng {
        match self.seed {
            Some(seed) => PathRng::from_seed(seed),
            None => PathRng::from_entropy(),
        }
    }
}

#[cfg(test)]
fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
}

#[test]
fn empty_environment_gives_defaults() {
    let config = PricingConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(config, PricingConfig::default());
}

#[test]
fn reads_all_settings() {
    let config = PricingConfig::from_lookup(
        lookup_from(
            &[
                ("PRICER_NUM_PATHS", "250000"),
                ("PRICER_SEED", " 42 "),
                ("PRICER_GREEKS", "Textbook"),
                ("PRICER_PARALLEL", "true"),
            ]
        )
    ).unwrap();
    assert_eq!(config.num_paths, 250_000);
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.greeks, GreeksConvention::Textbook);
    assert!(config.parallel);
    assert_eq!(config.rng().seed(), 42);
}

#[test]
fn rejects_bad_values() {
    let cases: [&'static [(&'static str, &'static str)]; 5] = [
        &[("PRICER_NUM_PATHS", "0")],
        &[("PRICER_NUM_PATHS", "lots")],
        &[("PRICER_SEED", "-1")],
        &[("PRICER_GREEKS", "exotic")],
        &[("PRICER_PARALLEL", "maybe")],
    ];
    for pairs in cases {
        let result = PricingConfig::from_lookup(lookup_from(pairs));
        assert!(matches!(result, Err(PricingError::Config(_))), "{pairs:?}");
    }
}
