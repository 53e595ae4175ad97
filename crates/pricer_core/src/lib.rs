//! # pricer_core: Foundation Types and Valuation Contracts
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core serves as the bottom layer of the architecture, providing:
//! - Time types: `Date`, `Tenor`, `DayCountConvention` (`types::time`)
//! - Currency types: `Currency`, `CurrencyPair` (`types::currency`, `types::currency_pair`)
//! - Market observable identities: `MarketObservable` (`types::observable`)
//! - Cashflows: `Cashflow` (`types::cashflow`)
//! - Deterministic curves: `FlatCurve`, `FxForwardCurve` (`market_data`)
//! - Contracts: `Product`, `Simulator`, `NumeraireSimulator`,
//!   `ExerciseSchedule`, `PortfolioEntry` (`traits`)
//! - Error types: `SimulationError`, `ScheduleError`, `DateError`, `CurrencyError`
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - chrono: Date arithmetic
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::types::{Currency, CurrencyPair, Date, MarketObservable};
//!
//! let value_date = Date::from_ymd(2024, 1, 1).unwrap();
//! assert_eq!(value_date.to_string(), "2024-01-01");
//!
//! let fx = MarketObservable::from(CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap());
//! assert_eq!(fx.to_string(), "USDZAR");
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for dates, currencies, observables and cashflows

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod traits;
pub mod types;
