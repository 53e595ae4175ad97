//! Dated curves for discounting, rate forecasting and FX forwards.
//!
//! This module provides:
//! - [`FlatCurve`]: constant continuously-compounded rate anchored at a date
//! - [`FxForwardCurve`]: covered-interest-parity FX forwards from two curves

mod flat;
mod fx;

pub use flat::FlatCurve;
pub use fx::FxForwardCurve;
