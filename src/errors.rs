//! Typed errors for user-supplied search and session settings.
//!
//! Network and I/O plumbing reports through `anyhow`; these are the cases a
//! caller may want to match on and show back to the user verbatim.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoutError {
    /// The search keyword was empty or whitespace.
    #[error("search keyword must not be empty")]
    EmptyKeyword,

    /// Minimum price above maximum price.
    #[error("invalid price range: minimum {min} is greater than maximum {max}")]
    InvertedPriceRange { min: f64, max: f64 },

    /// A price bound was negative or not a number.
    #[error("invalid price bound: {0}")]
    InvalidPrice(f64),

    #[error("requests per minute must be a positive number, got {0}")]
    InvalidRate(f64),

    #[error("exchange rate must be a positive number, got {0}")]
    InvalidExchangeRate(f64),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown country: {0}")]
    UnknownCountry(String),

    #[error("unknown condition: {0} (expected new, used or all)")]
    UnknownCondition(String),
}

pub type ScoutResult<T> = std::result::Result<T, ScoutError>;
