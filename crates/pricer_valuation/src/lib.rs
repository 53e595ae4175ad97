//! # pricer_valuation: Monte Carlo Valuation Coordinator
//!
//! ## Layer 3 (Engine) Role
//!
//! pricer_valuation wires products to simulators and turns simulated
//! cashflows into values and exposure profiles:
//! - Orchestration: `Coordinator` (`coordinator`)
//! - Path-wise stores: `SimulatedCashflows` (`cashflows`), `SimulatedRegressors` (`regressors`)
//! - American Monte Carlo: Longstaff-Schwartz early-exercise resolution
//! - Cross-sectional regression: `RegressionBasis`, `RegressionMethod` (`regression`)
//! - Exposure reducers: `ExposureCalculator` (`exposure`)
//! - Parallel-for over disjoint ranges: `ParallelExecutor` (`parallel`)
//! - Settings: `ValuationConfig` (`config`)
//!
//! ## Error Categories
//!
//! `ValuationError` keeps configuration errors (raised before any path is
//! simulated), per-path failures and regression failures apart. See
//! [`error`].
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::market_data::curves::FlatCurve;
//! use pricer_core::traits::PortfolioEntry;
//! use pricer_core::types::{Currency, Date};
//! use pricer_models::products::{EuropeanOption, OptionType};
//! use pricer_models::simulators::EquitySimulator;
//! use pricer_core::types::MarketObservable;
//! use pricer_valuation::{Coordinator, ValuationConfig};
//!
//! let value_date = Date::from_ymd(2025, 1, 1).unwrap();
//! let expiry = Date::from_ymd(2026, 1, 1).unwrap();
//! let share = MarketObservable::share(Currency::ZAR, "AAA");
//!
//! let curve = FlatCurve::new(value_date, 0.07, Currency::ZAR);
//! let simulator = EquitySimulator::single(share.clone(), 100.0, 0.2, 0.0, curve, 42).unwrap();
//! let option = EuropeanOption::new(share, OptionType::Call, 100.0, expiry);
//!
//! let config = ValuationConfig::builder().n_paths(2_000).use_threads(false).build().unwrap();
//! let coordinator = Coordinator::new(Box::new(simulator), Vec::new(), 2_000)
//!     .unwrap()
//!     .with_config(config)
//!     .unwrap();
//!
//! let value = coordinator.value(&[PortfolioEntry::plain(option)], value_date).unwrap();
//! assert!(value > 5.0 && value < 20.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod cashflows;
pub mod config;
pub mod coordinator;
mod early_exercise;
pub mod error;
pub mod exposure;
pub mod parallel;
mod portfolio;
pub mod providers;
pub mod regression;
pub mod regressors;

pub use cashflows::SimulatedCashflows;
pub use config::{ValuationConfig, ValuationConfigBuilder};
pub use coordinator::{Coordinator, ValuePaths};
pub use error::{ConfigurationError, RegressionError, ValuationError, ValuationResult};
pub use exposure::ExposureCalculator;
pub use parallel::ParallelExecutor;
pub use providers::SimulatorSet;
pub use regression::{RegressionBasis, RegressionMethod};
pub use regressors::SimulatedRegressors;
