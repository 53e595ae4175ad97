//! Market data error types.

use thiserror::Error;

use crate::types::{Currency, Date};

/// Market data operation errors.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::MarketDataError;
/// use pricer_core::types::Date;
///
/// let err = MarketDataError::DateBeforeAnchor {
///     date: Date::from_ymd(2023, 12, 31).unwrap(),
///     anchor: Date::from_ymd(2024, 1, 1).unwrap(),
/// };
/// assert_eq!(format!("{}", err), "Date 2023-12-31 precedes curve anchor 2024-01-01");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Query date before the curve anchor date.
    #[error("Date {date} precedes curve anchor {anchor}")]
    DateBeforeAnchor {
        /// Requested date
        date: Date,
        /// Curve anchor date
        anchor: Date,
    },

    /// Forward period of zero or negative length.
    #[error("Invalid forward period: {start} to {end}")]
    InvalidPeriod {
        /// Period start
        start: Date,
        /// Period end
        end: Date,
    },

    /// Curve currencies do not match the FX pair they are combined with.
    #[error("Curve currency {actual} does not match expected {expected}")]
    CurrencyMismatch {
        /// Currency required by the pair
        expected: Currency,
        /// Currency of the supplied curve
        actual: Currency,
    },

    /// Non-positive spot rate.
    #[error("Invalid FX spot: {0}")]
    InvalidSpot(f64),
}
