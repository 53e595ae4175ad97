//! Market observables: the quantities simulators produce and products consume.
//!
//! [`MarketObservable`] is a closed set of identities with structural
//! equality and hashing, so it can key the observable-to-simulator provider
//! map. The `Display` form is stable and is used in error messages.
//!
//! | Variant | Display |
//! |---------|---------|
//! | `FloatRateIndex` | `ZAR:JIBAR:3M` |
//! | `Share` | `SHARE:ZAR:AAA` |
//! | `CurrencyPair` | `USDZAR` |
//! | `Dividend` | `SHARE:DIVI:ZAR:AAA` |
//! | `DefaultTime` | `DEFAULT:TIME:ACME` |
//! | `DefaultRecovery` | `DEFAULT:RECOVERYRATE:ACME` |
//! | `Custom` | as given |

use std::fmt;

use super::currency::Currency;
use super::currency_pair::CurrencyPair;
use super::time::Tenor;

/// Identity of an observable market quantity.
///
/// # Examples
///
/// ```
/// use pricer_core::types::{Currency, MarketObservable, Tenor};
///
/// let jibar = MarketObservable::float_rate_index(Currency::ZAR, "JIBAR", Tenor::months(3));
/// assert_eq!(jibar.to_string(), "ZAR:JIBAR:3M");
///
/// let share = MarketObservable::share(Currency::ZAR, "aaa");
/// assert_eq!(share.to_string(), "SHARE:ZAR:AAA");
/// assert_eq!(share.dividend().unwrap().to_string(), "SHARE:DIVI:ZAR:AAA");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarketObservable {
    /// A floating interest rate fixing such as 3M JIBAR.
    FloatRateIndex {
        /// Currency of the index
        currency: Currency,
        /// Index family name, upper case
        name: String,
        /// Accrual tenor of the index
        tenor: Tenor,
    },
    /// A listed share price.
    Share {
        /// Currency the share trades in
        currency: Currency,
        /// Exchange code, upper case
        code: String,
    },
    /// An exchange rate.
    CurrencyPair(CurrencyPair),
    /// Dividends paid by a share, accumulated between observation dates.
    Dividend {
        /// Currency the share trades in
        currency: Currency,
        /// Exchange code of the underlying share, upper case
        code: String,
    },
    /// Default time of a reference entity.
    DefaultTime {
        /// Reference entity, upper case
        entity: String,
    },
    /// Recovery rate of a reference entity on default.
    DefaultRecovery {
        /// Reference entity, upper case
        entity: String,
    },
    /// Any other observable, identified by its text.
    Custom(String),
}

impl MarketObservable {
    /// Builds a floating rate index observable.
    pub fn float_rate_index(currency: Currency, name: &str, tenor: Tenor) -> Self {
        MarketObservable::FloatRateIndex {
            currency,
            name: name.trim().to_uppercase(),
            tenor,
        }
    }

    /// Builds a share price observable.
    pub fn share(currency: Currency, code: &str) -> Self {
        MarketObservable::Share {
            currency,
            code: code.trim().to_uppercase(),
        }
    }

    /// Builds an FX rate observable.
    pub fn currency_pair(pair: CurrencyPair) -> Self {
        MarketObservable::CurrencyPair(pair)
    }

    /// Builds a default time observable.
    pub fn default_time(entity: &str) -> Self {
        MarketObservable::DefaultTime {
            entity: entity.trim().to_uppercase(),
        }
    }

    /// Builds a recovery rate observable.
    pub fn default_recovery(entity: &str) -> Self {
        MarketObservable::DefaultRecovery {
            entity: entity.trim().to_uppercase(),
        }
    }

    /// Returns the dividend observable of a share, `None` for other variants.
    pub fn dividend(&self) -> Option<Self> {
        match self {
            MarketObservable::Share { currency, code } => Some(MarketObservable::Dividend {
                currency: *currency,
                code: code.clone(),
            }),
            _ => None,
        }
    }

    /// Returns the share underlying a dividend observable.
    pub fn underlying_share(&self) -> Option<Self> {
        match self {
            MarketObservable::Dividend { currency, code } => Some(MarketObservable::Share {
                currency: *currency,
                code: code.clone(),
            }),
            _ => None,
        }
    }

    /// Currency the observable is denominated in, where it has one.
    pub fn currency(&self) -> Option<Currency> {
        match self {
            MarketObservable::FloatRateIndex { currency, .. }
            | MarketObservable::Share { currency, .. }
            | MarketObservable::Dividend { currency, .. } => Some(*currency),
            MarketObservable::CurrencyPair(pair) => Some(pair.counter()),
            _ => None,
        }
    }
}

impl From<CurrencyPair> for MarketObservable {
    fn from(pair: CurrencyPair) -> Self {
        MarketObservable::CurrencyPair(pair)
    }
}

impl fmt::Display for MarketObservable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketObservable::FloatRateIndex {
                currency,
                name,
                tenor,
            } => write!(f, "{currency}:{name}:{tenor}"),
            MarketObservable::Share { currency, code } => write!(f, "SHARE:{currency}:{code}"),
            MarketObservable::CurrencyPair(pair) => write!(f, "{pair}"),
            MarketObservable::Dividend { currency, code } => {
                write!(f, "SHARE:DIVI:{currency}:{code}")
            }
            MarketObservable::DefaultTime { entity } => write!(f, "DEFAULT:TIME:{entity}"),
            MarketObservable::DefaultRecovery { entity } => {
                write!(f, "DEFAULT:RECOVERYRATE:{entity}")
            }
            MarketObservable::Custom(text) => write!(f, "{text}"),
        }
    }
}
