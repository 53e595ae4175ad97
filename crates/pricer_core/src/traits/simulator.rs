//! The simulator contracts.
//!
//! A [`Simulator`] produces realisations of the observables it claims to
//! provide. The coordinator first registers every date at which values will
//! be queried, then calls [`Simulator::prepare`], then for each path calls
//! [`Simulator::run_simulation`] followed by queries.
//!
//! `run_simulation(path_index)` must be a pure function of `path_index` given
//! the registered dates, so that results do not depend on how paths are split
//! between worker threads.
//!
//! A [`NumeraireSimulator`] additionally defines the unit of account: its
//! numeraire deflates cashflows to the value date and its currency is the
//! reporting currency of the valuation.

use std::fmt;

use crate::types::{Currency, Date, MarketObservable, SimulationError};

/// A stochastic (or deterministic) model of market observables.
pub trait Simulator: Send + Sync + fmt::Debug {
    /// Whether this simulator produces realisations of `index`.
    fn provides_index(&self, index: &MarketObservable) -> bool;

    /// Clears all registered dates and path state.
    fn reset(&mut self);

    /// Registers dates at which `index` will be queried. Calls accumulate.
    fn set_required_dates(&mut self, index: &MarketObservable, dates: &[Date]);

    /// Registers dates at which underlying factors will be read.
    ///
    /// Simulators that can produce factors on any registered date may ignore
    /// this; the default does nothing.
    fn set_factor_dates(&mut self, dates: &[Date]) {
        let _ = dates;
    }

    /// Finalises the discretisation for a valuation at `value_date`.
    ///
    /// Implementations may insert extra internal dates.
    fn prepare(&mut self, value_date: Date) -> Result<(), SimulationError>;

    /// Simulates path `path_index`, replacing any previous path state.
    fn run_simulation(&mut self, path_index: usize) -> Result<(), SimulationError>;

    /// Realisations of `index` on the current path at `dates`.
    fn indices(&self, index: &MarketObservable, dates: &[Date])
        -> Result<Vec<f64>, SimulationError>;

    /// Low-dimensional state at `date`, used only as regression covariates.
    ///
    /// The length must be the same for every date and path.
    fn underlying_factors(&self, date: Date) -> Result<Vec<f64>, SimulationError>;

    /// Deep copy with state fully independent of `self`.
    fn clone_box(&self) -> Box<dyn Simulator>;
}

impl Clone for Box<dyn Simulator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Access to a value as a plain [`Simulator`] trait object.
///
/// Implemented for every sized simulator, so `dyn NumeraireSimulator` can be
/// handed to code that works on `&dyn Simulator`.
pub trait AsSimulator {
    /// Shared access as a simulator.
    fn as_simulator(&self) -> &dyn Simulator;

    /// Exclusive access as a simulator.
    fn as_simulator_mut(&mut self) -> &mut dyn Simulator;
}

impl<T: Simulator> AsSimulator for T {
    fn as_simulator(&self) -> &dyn Simulator {
        self
    }

    fn as_simulator_mut(&mut self) -> &mut dyn Simulator {
        self
    }
}

/// The simulator that defines the numeraire and the valuation currency.
pub trait NumeraireSimulator: Simulator + AsSimulator {
    /// Currency in which deflated values are reported.
    ///
    /// `None` means the numeraire is not tied to a currency; the valuation
    /// engine then requires a single-currency portfolio.
    fn numeraire_currency(&self) -> Option<Currency>;

    /// Numeraire value on the current path at `date`.
    fn numeraire(&self, date: Date) -> Result<f64, SimulationError>;

    /// Registers dates at which the numeraire will be queried. Calls accumulate.
    fn set_numeraire_dates(&mut self, dates: &[Date]);

    /// Deep copy with state fully independent of `self`.
    fn clone_numeraire(&self) -> Box<dyn NumeraireSimulator>;
}

impl Clone for Box<dyn NumeraireSimulator> {
    fn clone(&self) -> Self {
        self.clone_numeraire()
    }
}
