//! Closed-form prices used to check simulated values.
//!
//! - [`BlackScholes`]: European options on a share with continuous dividend yield
//! - [`distributions`]: standard normal CDF and PDF
//!
//! Invalid parameters are reported as [`ModelError`](crate::simulators::ModelError).

pub mod black_scholes;
pub mod distributions;

pub use black_scholes::BlackScholes;
