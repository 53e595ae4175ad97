//! # Pricer Models (L2: Business Logic)
//!
//! Reference simulators and products for the valuation coordinator.
//!
//! This crate provides:
//! - Simulators implementing the `pricer_core` simulator contracts
//!   (`simulators`): deterministic curves and correlated lognormal equities
//! - Products implementing the `pricer_core` product contract (`products`):
//!   fixed cashflows, European and Bermudan options
//! - Seeded per-path random numbers (`rng`)
//! - Closed-form prices used to check simulated values (`analytical`)
//!
//! ## Design Principles
//!
//! - **Path-indexed randomness**: a path's draws depend only on the model
//!   seed and the path index
//! - **Strict calendars**: simulators answer only at dates registered
//!   before `prepare`
//! - **Builder-style construction** that validates parameters up front

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod products;
pub mod rng;
pub mod simulators;
