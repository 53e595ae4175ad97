//! Currency pair identity for FX observables.
//!
//! A [`CurrencyPair`] names an exchange rate, it does not carry one. The
//! convention is BASE/COUNTER: the rate is the number of COUNTER units paid
//! for one unit of BASE. Simulators quote realisations of the rate; the
//! valuation coordinator requests `CurrencyPair(cashflow currency, numeraire
//! currency)` whenever a cashflow is paid in a foreign currency.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::{Currency, CurrencyPair};
//!
//! let usdzar = CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap();
//! assert_eq!(usdzar.to_string(), "USDZAR");
//! assert_eq!(usdzar.inverse().to_string(), "ZARUSD");
//! ```

use std::fmt;
use std::str::FromStr;

use super::currency::Currency;
use super::error::CurrencyError;

/// An ordered pair of distinct currencies.
///
/// Equality and hashing are structural, so two pairs built from the same
/// currencies are the same observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrencyPair {
    base: Currency,
    counter: Currency,
}

impl CurrencyPair {
    /// Creates a new currency pair.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::SameCurrency` if base and counter are the same.
    pub fn new(base: Currency, counter: Currency) -> Result<Self, CurrencyError> {
        if base == counter {
            return Err(CurrencyError::SameCurrency(base.code().to_string()));
        }
        Ok(Self { base, counter })
    }

    /// Returns the base currency.
    #[inline]
    pub fn base(&self) -> Currency {
        self.base
    }

    /// Returns the counter currency.
    #[inline]
    pub fn counter(&self) -> Currency {
        self.counter
    }

    /// Returns the pair with base and counter swapped.
    #[inline]
    pub fn inverse(&self) -> Self {
        Self {
            base: self.counter,
            counter: self.base,
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.counter)
    }
}

impl FromStr for CurrencyPair {
    type Err = CurrencyError;

    /// Parses six-letter codes such as `USDZAR`, optionally separated by `/`.
    fn from_str(s: &str) -> Result<Self, CurrencyError> {
        let compact: String = s.trim().chars().filter(|c| *c != '/').collect();
        if compact.len() != 6 || !compact.is_ascii() {
            return Err(CurrencyError::ParseError(s.to_string()));
        }
        let base: Currency = compact[..3].parse()?;
        let counter: Currency = compact[3..].parse()?;
        CurrencyPair::new(base, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_currency_rejected() {
        assert_eq!(
            CurrencyPair::new(Currency::EUR, Currency::EUR),
            Err(CurrencyError::SameCurrency("EUR".to_string()))
        );
    }

    #[test]
    fn test_parse_with_and_without_separator() {
        let a: CurrencyPair = "EURUSD".parse().unwrap();
        let b: CurrencyPair = "eur/usd".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.base(), Currency::EUR);
        assert_eq!(a.counter(), Currency::USD);
        assert!("EURUS".parse::<CurrencyPair>().is_err());
    }

    #[test]
    fn test_structural_hash() {
        let mut set = HashSet::new();
        set.insert(CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap());
        set.insert(CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap());
        set.insert(CurrencyPair::new(Currency::ZAR, Currency::USD).unwrap());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_inverse_is_involution() {
        let pair = CurrencyPair::new(Currency::GBP, Currency::JPY).unwrap();
        assert_eq!(pair.inverse().inverse(), pair);
    }
}
