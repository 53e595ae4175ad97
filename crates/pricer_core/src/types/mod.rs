//! Core value types shared by products, simulators and the valuation engine.
//!
//! This module provides:
//! - `time`: `Date`, `Tenor`, `DayCountConvention`
//! - `currency`: ISO 4217 currency codes
//! - `currency_pair`: FX pair identity
//! - `observable`: `MarketObservable`, the key of the provider map
//! - `cashflow`: `Cashflow`
//! - `error`: contract-level error types
//!
//! # Re-exports
//!
//! Commonly used types are re-exported at this module level.

pub mod cashflow;
pub mod currency;
pub mod currency_pair;
pub mod error;
pub mod observable;
pub mod time;

pub use cashflow::Cashflow;
pub use currency::Currency;
pub use currency_pair::CurrencyPair;
pub use error::{CurrencyError, DateError, ScheduleError, SimulationError};
pub use observable::MarketObservable;
pub use time::{normalise_dates, Date, DayCountConvention, Tenor};
