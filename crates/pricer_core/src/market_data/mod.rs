//! Deterministic market data used by simulators.
//!
//! # Components
//!
//! - [`curves`]: dated discount curves ([`curves::FlatCurve`]) and FX forward
//!   curves ([`curves::FxForwardCurve`])
//! - [`error`]: Market data error types ([`MarketDataError`])
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::curves::FlatCurve;
//! use pricer_core::types::{Currency, Date};
//!
//! let anchor = Date::from_ymd(2024, 1, 1).unwrap();
//! let curve = FlatCurve::new(anchor, 0.05, Currency::ZAR);
//! let one_year = Date::from_ymd(2025, 1, 1).unwrap();
//! let df = curve.discount_factor(one_year).unwrap();
//! assert!((df - (-0.05_f64 * 366.0 / 365.0).exp()).abs() < 1e-14);
//! ```

pub mod curves;
pub mod error;

pub use error::MarketDataError;
