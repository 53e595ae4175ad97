//! Simulator slots and the observable-to-provider map.
//!
//! Slot 0 is always the numeraire simulator; auxiliary simulators follow in
//! the order they were supplied.

use std::collections::{BTreeSet, HashMap};

use pricer_core::traits::{NumeraireSimulator, Simulator};
use pricer_core::types::MarketObservable;

use crate::error::ConfigurationError;

/// The numeraire simulator and the auxiliary simulators of one valuation.
#[derive(Clone, Debug)]
pub struct SimulatorSet {
    numeraire: Box<dyn NumeraireSimulator>,
    auxiliary: Vec<Box<dyn Simulator>>,
}

impl SimulatorSet {
    /// Groups the simulators.
    pub fn new(numeraire: Box<dyn NumeraireSimulator>, auxiliary: Vec<Box<dyn Simulator>>) -> Self {
        Self {
            numeraire,
            auxiliary,
        }
    }

    /// Number of slots, including the numeraire simulator.
    pub fn len(&self) -> usize {
        1 + self.auxiliary.len()
    }

    /// Always `false`: the numeraire slot exists.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The numeraire simulator.
    pub fn numeraire(&self) -> &dyn NumeraireSimulator {
        self.numeraire.as_ref()
    }

    /// The numeraire simulator, mutably.
    pub fn numeraire_mut(&mut self) -> &mut dyn NumeraireSimulator {
        self.numeraire.as_mut()
    }

    /// Simulator in `slot`.
    ///
    /// # Panics
    ///
    /// If `slot >= self.len()`.
    pub fn get(&self, slot: usize) -> &dyn Simulator {
        match slot {
            0 => self.numeraire.as_simulator(),
            _ => self.auxiliary[slot - 1].as_ref(),
        }
    }

    /// Simulator in `slot`, mutably.
    ///
    /// # Panics
    ///
    /// If `slot >= self.len()`.
    pub fn get_mut(&mut self, slot: usize) -> &mut dyn Simulator {
        match slot {
            0 => self.numeraire.as_simulator_mut(),
            _ => self.auxiliary[slot - 1].as_mut(),
        }
    }

    /// Finds exactly one provider slot for every observable.
    ///
    /// Observables are checked in their natural order, so the reported
    /// observable is the same from run to run.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError::AmbiguousProvider` if two simulators claim one
    /// - `ConfigurationError::MissingProvider` if none does
    pub fn associate(
        &self,
        observables: &BTreeSet<MarketObservable>,
    ) -> Result<HashMap<MarketObservable, usize>, ConfigurationError> {
        let mut providers = HashMap::with_capacity(observables.len());
        for observable in observables {
            let mut claimants = (0..self.len()).filter(|&s| self.get(s).provides_index(observable));
            let slot = claimants
                .next()
                .ok_or_else(|| ConfigurationError::MissingProvider {
                    observable: observable.clone(),
                })?;
            if claimants.next().is_some() {
                return Err(ConfigurationError::AmbiguousProvider {
                    observable: observable.clone(),
                });
            }
            providers.insert(observable.clone(), slot);
        }
        Ok(providers)
    }
}
