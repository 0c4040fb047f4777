use crate::errors::{ScoutError, ScoutResult};

/// Multiplier from the source currency to the display currency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    pub const DEFAULT: ExchangeRate = ExchangeRate(150.0);

    pub fn new(rate: f64) -> ScoutResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ScoutError::InvalidExchangeRate(rate));
        }
        Ok(Self(rate))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// floor(price * rate)
    pub fn convert(&self, price: f64) -> i64 {
        (price * self.0).floor() as i64
    }
}
