//! Reference simulators.
//!
//! - [`DeterministicCurves`]: flat discount, forecast and FX forward curves
//! - [`EquitySimulator`]: correlated lognormal shares with dividends
//!
//! Both are numeraire simulators whose numeraire is the bank account of
//! their discount curve. Dates must be registered before `prepare`; queries
//! at any other date fail with `SimulationError::UnregisteredDate`.

mod calendar;
pub mod deterministic;
pub mod equity;
pub mod error;

pub use deterministic::DeterministicCurves;
pub use equity::{EquitySimulator, ShareProcess};
pub use error::ModelError;
