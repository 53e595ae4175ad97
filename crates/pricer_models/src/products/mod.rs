//! Reference products.
//!
//! - [`FixedCashflows`]: known payments
//! - [`EuropeanOption`]: call or put on a share, paid at expiry
//! - [`BermudanOption`]: early-exercise option settled by [`ExercisePayoff`]

pub mod bermudan;
pub mod error;
pub mod european;
pub mod fixed_cashflows;

pub use bermudan::{BermudanOption, ExercisePayoff};
pub use error::ProductError;
pub use european::{EuropeanOption, OptionType};
pub use fixed_cashflows::FixedCashflows;
