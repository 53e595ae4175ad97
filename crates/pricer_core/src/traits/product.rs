//! The product contract.
//!
//! A product is a per-valuation stateful object. Before simulation it
//! declares which observables it needs and on which dates; on each path it
//! receives the realised index values and emits its cashflows.
//!
//! Call sequence per valuation:
//!
//! 1. `set_value_date` once
//! 2. `required_indices`, `required_index_dates`, `cashflow_currencies`,
//!    `cashflow_dates` to register the simulation calendar
//! 3. per path: `reset`, `set_index_values` for every required index,
//!    then `cashflows`
//!
//! Instances are never shared between threads while in use; the valuation
//! engine deep-clones the caller's templates with [`Product::clone_box`].

use std::fmt;

use crate::types::{Cashflow, Currency, Date, MarketObservable, SimulationError};

/// A contract whose cashflows depend on simulated market observables.
///
/// # Examples
///
/// ```
/// use pricer_core::traits::Product;
/// use pricer_core::types::{Cashflow, Currency, Date, MarketObservable, SimulationError};
///
/// #[derive(Debug, Clone)]
/// struct Bullet {
///     date: Date,
///     value_date: Option<Date>,
/// }
///
/// impl Product for Bullet {
///     fn set_value_date(&mut self, value_date: Date) {
///         self.value_date = Some(value_date);
///     }
///     fn reset(&mut self) {}
///     fn required_indices(&self) -> Vec<MarketObservable> {
///         Vec::new()
///     }
///     fn required_index_dates(&self, _index: &MarketObservable) -> Vec<Date> {
///         Vec::new()
///     }
///     fn set_index_values(&mut self, _index: &MarketObservable, _values: &[f64]) {}
///     fn cashflows(&self) -> Result<Vec<Cashflow>, SimulationError> {
///         Ok(vec![Cashflow::new(self.date, 100.0, Currency::ZAR)])
///     }
///     fn cashflow_currencies(&self) -> Vec<Currency> {
///         vec![Currency::ZAR]
///     }
///     fn cashflow_dates(&self, _currency: Currency) -> Vec<Date> {
///         vec![self.date]
///     }
///     fn clone_box(&self) -> Box<dyn Product> {
///         Box::new(self.clone())
///     }
/// }
///
/// let template: Box<dyn Product> = Box::new(Bullet {
///     date: Date::from_ymd(2025, 1, 1).unwrap(),
///     value_date: None,
/// });
/// let mut copy = template.clone();
/// copy.set_value_date(Date::from_ymd(2024, 1, 1).unwrap());
/// assert_eq!(copy.cashflows().unwrap().len(), 1);
/// ```
pub trait Product: Send + Sync + fmt::Debug {
    /// Sets the valuation date. Only dates strictly after it are relevant.
    fn set_value_date(&mut self, value_date: Date);

    /// Clears path-local state before the next path.
    fn reset(&mut self);

    /// Observables whose realisations this product needs.
    fn required_indices(&self) -> Vec<MarketObservable>;

    /// Dates, after the value date and in ascending order, at which `index`
    /// is needed.
    fn required_index_dates(&self, index: &MarketObservable) -> Vec<Date>;

    /// Supplies realisations of `index`, parallel to
    /// [`required_index_dates`](Product::required_index_dates).
    fn set_index_values(&mut self, index: &MarketObservable, values: &[f64]);

    /// Cashflows of the current path, in undiscounted currency units.
    fn cashflows(&self) -> Result<Vec<Cashflow>, SimulationError>;

    /// Currencies in which this product can pay.
    fn cashflow_currencies(&self) -> Vec<Currency>;

    /// Dates, after the value date, on which cashflows in `currency` can occur.
    fn cashflow_dates(&self, currency: Currency) -> Vec<Date>;

    /// Deep copy with state fully independent of `self`.
    fn clone_box(&self) -> Box<dyn Product>;
}

impl Clone for Box<dyn Product> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
