use crate::error::{PricingError, Result};

/// Average length of a Gregorian calendar year in days.
pub const DAYS_PER_YEAR: f64 = 365.2425;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn from_is_call(is_call: bool) -> Self {
        if is_call {
            OptionType::Call
        } else {
            OptionType::Put
        }
    }

    pub fn is_call(self) -> bool {
        self == OptionType::Call
    }

    /// Payoff at expiry for a given terminal stock price.
    #[inline(always)]
    pub fn payoff(self, terminal_price: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (terminal_price - strike).max(0.0),
            OptionType::Put => (strike - terminal_price).max(0.0),
        }
    }
}

/// Market and contract inputs shared by both pricers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketParams {
    pub spot: f64,
    pub strike: f64,
    /// Continuously compounded, may be zero or negative
    pub rate: f64,
    pub volatility: f64,
    /// In years
    pub time_to_maturity: f64,
    pub option_type: OptionType,
}

impl MarketParams {
    pub fn new(
        spot: f64,
        strike: f64,
        rate: f64,
        volatility: f64,
        time_to_maturity: f64,
        option_type: OptionType
    ) -> Self {
        MarketParams { spot, strike, rate, volatility, time_to_maturity, option_type }
    }

    pub fn call(spot: f64, strike: f64, rate: f64, volatility: f64, time_to_maturity: f64) -> Self {
        Self::new(spot, strike, rate, volatility, time_to_maturity, OptionType::Call)
    }

    pub fn put(spot: f64, strike: f64, rate: f64, volatility: f64, time_to_maturity: f64) -> Self {
        Self::new(spot, strike, rate, volatility, time_to_maturity, OptionType::Put)
    }

    /// Same market, other side of the contract.
    pub fn with_option_type(self, option_type: OptionType) -> Self {
        MarketParams { option_type, ..self }
    }

    pub fn with_volatility(self, volatility: f64) -> Self {
        MarketParams { volatility, ..self }
    }

    /// Rejects anything that would make the log or the square root in the
    /// pricing formulas blow up.
    pub fn validate(&self) -> Result<()> {
        validate_positive("spot", self.spot)?;
        validate_positive("strike", self.strike)?;
        validate_positive("volatility", self.volatility)?;
        validate_positive("time_to_maturity", self.time_to_maturity)?;
        if !self.rate.is_finite() {
            return Err(PricingError::InvalidInput(format!("rate must be finite, got {}", self.rate)));
        }
        Ok(())
    }

    pub fn days_to_expiry(&self) -> i64 {
        (self.time_to_maturity * DAYS_PER_YEAR).round() as i64
    }

    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.time_to_maturity).exp()
    }

    pub fn intrinsic_value(&self) -> f64 {
        self.option_type.payoff(self.spot, self.strike)
    }
}

fn validate_positive(name: &str, value: f64) -> Result<()> {
    // NaN fails the comparison as well
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PricingError::InvalidInput(format!("{name} must be positive, got {value}")))
    }
}

#[test]
fn days_to_expiry_rounds_gregorian_year() {
    assert_eq!(MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0).days_to_expiry(), 365);
    assert_eq!(MarketParams::call(100.0, 100.0, 0.05, 0.2, 0.5).days_to_expiry(), 183);
    assert_eq!(MarketParams::call(100.0, 100.0, 0.05, 0.2, 2.0).days_to_expiry(), 730);
}

#[test]
fn negative_rate_is_valid() {
    assert!(MarketParams::put(100.0, 95.0, -0.01, 0.3, 0.25).validate().is_ok());
    assert!(MarketParams::put(100.0, 95.0, 0.0, 0.3, 0.25).validate().is_ok());
}

#[test]
fn rejects_each_bad_field() {
    let good = MarketParams::call(100.0, 100.0, 0.05, 0.2, 1.0);
    let bad = [
        MarketParams { spot: 0.0, ..good },
        MarketParams { strike: -5.0, ..good },
        MarketParams { volatility: 0.0, ..good },
        MarketParams { time_to_maturity: 0.0, ..good },
        MarketParams { spot: f64::NAN, ..good },
        MarketParams { rate: f64::INFINITY, ..good },
    ];
    for market in bad {
        assert!(
            matches!(market.validate(), Err(PricingError::InvalidInput(_))),
            "{market:?} should be rejected"
        );
    }
}

#[test]
fn intrinsic_value_is_plain_max() {
    let call = MarketParams::call(110.0, 100.0, 0.05, 0.2, 1.0);
    assert_eq!(call.intrinsic_value(), 10.0);
    assert_eq!(call.with_option_type(OptionType::Put).intrinsic_value(), 0.0);

    let put = MarketParams::put(90.0, 100.0, 0.05, 0.2, 1.0);
    assert_eq!(put.intrinsic_value(), 10.0);
    assert_eq!(put.with_option_type(OptionType::Call).intrinsic_value(), 0.0);
}

#[test]
fn option_type_round_trips_flag() {
    assert_eq!(OptionType::from_is_call(true), OptionType::Call);
    assert_eq!(OptionType::from_is_call(false), OptionType::Put);
    assert!(OptionType::Call.is_call());
    assert!(!OptionType::Put.is_call());
}
