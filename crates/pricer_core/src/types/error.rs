//! Error types for structured error handling.
//!
//! This module provides:
//! - `SimulationError`: Failures raised by simulators and products while a
//!   valuation is running
//! - `ScheduleError`: Invalid early-exercise schedules
//! - `DateError`: Errors from date construction, parsing and shifting
//! - `CurrencyError`: Errors from currency parsing

use thiserror::Error;

use super::observable::MarketObservable;
use super::time::Date;
use crate::market_data::MarketDataError;

/// Failures raised through the product and simulator contracts.
///
/// # Examples
/// ```
/// use pricer_core::types::{Currency, MarketObservable, SimulationError};
///
/// let err = SimulationError::UnsupportedObservable(MarketObservable::share(Currency::ZAR, "AAA"));
/// assert_eq!(err.to_string(), "simulator does not provide SHARE:ZAR:AAA");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The simulator was asked for an observable it does not provide.
    #[error("simulator does not provide {0}")]
    UnsupportedObservable(MarketObservable),

    /// A value was requested at a date that was never registered.
    #[error("{observable} was not simulated at {date}")]
    UnregisteredDate {
        /// Requested observable, or `numeraire`/`factors`
        observable: String,
        /// Requested date
        date: Date,
    },

    /// A query arrived before `prepare` or `run_simulation` was called.
    #[error("simulator used before it was prepared: {0}")]
    NotPrepared(String),

    /// A product was asked for cashflows without the index values it needs.
    #[error("index values for {0} have not been set")]
    MissingIndexValues(MarketObservable),

    /// The number of values passed does not match the requested dates.
    #[error("expected {expected} values for {observable}, got {actual}")]
    LengthMismatch {
        /// Observable the values belong to
        observable: MarketObservable,
        /// Number of requested dates
        expected: usize,
        /// Number of values received
        actual: usize,
    },

    /// Model or product parameters are invalid.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A model produced NaN or infinity.
    #[error("non-finite value for {what} at {date}")]
    NonFinite {
        /// Description of the offending quantity
        what: String,
        /// Date of the offending value
        date: Date,
    },

    /// Date arithmetic failed inside a model.
    #[error(transparent)]
    Date(#[from] DateError),

    /// A curve lookup failed inside a model.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}

/// Invalid early-exercise schedules.
///
/// # Examples
/// ```
/// use pricer_core::types::ScheduleError;
///
/// let err = ScheduleError::NoExerciseDates;
/// assert_eq!(err.to_string(), "exercise schedule has no exercise dates");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The schedule contains no exercise dates.
    #[error("exercise schedule has no exercise dates")]
    NoExerciseDates,

    /// The same exercise date appears twice.
    #[error("exercise date {0} appears more than once")]
    DuplicateExerciseDate(Date),

    /// An exercise date points at a post-exercise product that does not exist.
    #[error("exercise on {date} refers to post-exercise product {index} but only {available} exist")]
    PostExerciseIndexOutOfRange {
        /// Exercise date
        date: Date,
        /// Requested post-exercise product index
        index: usize,
        /// Number of post-exercise products
        available: usize,
    },
}

/// Date-related errors.
///
/// # Examples
/// ```
/// use pricer_core::types::DateError;
///
/// let err = DateError::InvalidDate { year: 2024, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2024-2-30");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Invalid date components (e.g., February 30th).
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Failed to parse date string.
    #[error("Date parse error: {0}")]
    ParseError(String),

    /// Date arithmetic left the representable range.
    #[error("Date out of range: {date} shifted by {shift}")]
    OutOfRange {
        /// Start date
        date: String,
        /// Requested shift
        shift: String,
    },
}

/// Currency-related errors.
///
/// # Examples
/// ```
/// use pricer_core::types::CurrencyError;
///
/// let err = CurrencyError::UnknownCurrency("XYZ".to_string());
/// assert_eq!(format!("{}", err), "Unknown currency: XYZ");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// Unknown currency code.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Failed to parse currency pair string.
    #[error("Currency parse error: {0}")]
    ParseError(String),

    /// Base and counter currencies are the same.
    #[error("Base and counter currencies are the same: {0}")]
    SameCurrency(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;

    #[test]
    fn test_unregistered_date_display() {
        let err = SimulationError::UnregisteredDate {
            observable: "numeraire".into(),
            date: Date::from_ymd(2025, 1, 31).unwrap(),
        };
        assert_eq!(err.to_string(), "numeraire was not simulated at 2025-01-31");
    }

    #[test]
    fn test_length_mismatch_display() {
        let err = SimulationError::LengthMismatch {
            observable: MarketObservable::share(Currency::USD, "ABC"),
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "expected 3 values for SHARE:USD:ABC, got 2");
    }

    #[test]
    fn test_date_error_converts() {
        let err: SimulationError = DateError::ParseError("bad".into()).into();
        assert_eq!(err.to_string(), "Date parse error: bad");
    }

    #[test]
    fn test_schedule_error_display() {
        let err = ScheduleError::PostExerciseIndexOutOfRange {
            date: Date::from_ymd(2025, 1, 1).unwrap(),
            index: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "exercise on 2025-01-01 refers to post-exercise product 2 but only 1 exist"
        );
    }
}
