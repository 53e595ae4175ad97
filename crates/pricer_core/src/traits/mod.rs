//! Contracts between the valuation engine and its collaborators.
//!
//! This module defines:
//! - [`Product`]: per-valuation contract emitting cashflows on each path
//! - [`Simulator`] and [`NumeraireSimulator`]: models producing observables
//!   and the deflating numeraire
//! - [`ExerciseSchedule`] and [`PortfolioEntry`]: early-exercise description
//!   and the portfolio sum type
//!
//! Products and simulators are open-ended and supplied by callers, so they
//! are used as trait objects. Every implementation provides an explicit deep
//! clone (`clone_box`), and `Box<dyn Product>` / `Box<dyn Simulator>`
//! implement `Clone` through it.

pub mod portfolio;
pub mod product;
pub mod simulator;

pub use portfolio::{ExerciseEvent, ExerciseSchedule, PortfolioEntry};
pub use product::Product;
pub use simulator::{AsSimulator, NumeraireSimulator, Simulator};
