use thiserror::Error;

/// Errors returned by the pricers.
///
/// Every failure is a deterministic rejection of the caller's inputs; nothing
/// here is transient or worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// A market parameter or simulation setting violates its precondition
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The implied volatility solver ran out of iterations
    #[error("implied volatility did not converge after {iterations} iterations (last guess {last})")]
    NoConvergence { iterations: usize, last: f64 },

    /// An environment setting could not be parsed
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PricingError>;

#[test]
fn invalid_input_message() {
    let err = PricingError::InvalidInput("spot must be positive, got 0".to_string());
    assert_eq!(err.to_string(), "invalid input: spot must be positive, got 0");
}

#[test]
fn no_convergence_message() {
    let err = PricingError::NoConvergence { iterations: 100, last: 0.25 };
    assert_eq!(
        err.to_string(),
        "implied volatility did not converge after 100 iterations (last guess 0.25)"
    );
}
