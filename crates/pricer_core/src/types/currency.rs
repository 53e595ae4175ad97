//! Currency types for multi-currency valuation.
//!
//! This module provides ISO 4217 currency codes. Every cashflow carries a
//! currency, and the numeraire simulator declares the currency in which a
//! valuation is reported.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::currency::Currency;
//!
//! let zar: Currency = "zar".parse().unwrap();
//! assert_eq!(zar, Currency::ZAR);
//! assert_eq!(zar.code(), "ZAR");
//! assert_eq!(Currency::JPY.decimal_places(), 0);
//! ```

use std::fmt;
use std::str::FromStr;

use super::error::CurrencyError;

/// ISO 4217 currency codes with decimal precision metadata.
///
/// Ordering follows declaration order and only exists so that currencies
/// can be collected into ordered sets for deterministic iteration.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Currency {
    /// United States Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound Sterling
    GBP,
    /// Japanese Yen (no minor units)
    JPY,
    /// Swiss Franc
    CHF,
    /// South African Rand
    ZAR,
}

impl Currency {
    /// All supported currencies.
    pub const ALL: [Currency; 6] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
        Currency::CHF,
        Currency::ZAR,
    ];

    /// Returns the ISO 4217 three-letter currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::ZAR => "ZAR",
        }
    }

    /// Returns the standard number of decimal places for this currency.
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    /// Parses ISO 4217 currency code (case-insensitive).
    fn from_str(s: &str) -> Result<Self, CurrencyError> {
        let upper = s.trim().to_uppercase();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == upper)
            .ok_or_else(|| CurrencyError::UnknownCurrency(s.to_string()))
    }
}

impl fmt::Display for Currency {
    /// Formats as ISO 4217 code.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
