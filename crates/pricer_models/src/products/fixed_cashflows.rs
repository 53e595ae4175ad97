//! A fixed schedule of known payments.

use pricer_core::traits::Product;
use pricer_core::types::{
    normalise_dates, Cashflow, Currency, Date, MarketObservable, SimulationError,
};

/// Known cashflows, independent of any simulated observable.
///
/// Only cashflows strictly after the value date are emitted.
///
/// # Examples
///
/// ```
/// use pricer_core::traits::Product;
/// use pricer_core::types::{Cashflow, Currency, Date};
/// use pricer_models::products::FixedCashflows;
///
/// let d1 = Date::from_ymd(2025, 1, 1).unwrap();
/// let d2 = Date::from_ymd(2026, 1, 1).unwrap();
/// let mut bond = FixedCashflows::new(vec![
///     Cashflow::new(d2, 105.0, Currency::ZAR),
///     Cashflow::new(d1, 5.0, Currency::ZAR),
/// ]);
///
/// bond.set_value_date(d1);
/// assert_eq!(bond.cashflows().unwrap(), vec![Cashflow::new(d2, 105.0, Currency::ZAR)]);
/// assert_eq!(bond.cashflow_dates(Currency::ZAR), vec![d2]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCashflows {
    cashflows: Vec<Cashflow>,
    value_date: Option<Date>,
}

impl FixedCashflows {
    /// Creates the product; cashflows are kept in date order.
    pub fn new(mut cashflows: Vec<Cashflow>) -> Self {
        cashflows.sort_by_key(|cf| cf.date);
        Self {
            cashflows,
            value_date: None,
        }
    }

    fn live(&self) -> impl Iterator<Item = &Cashflow> {
        let value_date = self.value_date;
        self.cashflows
            .iter()
            .filter(move |cf| value_date.map_or(true, |vd| cf.date > vd))
    }
}

impl Product for FixedCashflows {
    fn set_value_date(&mut self, value_date: Date) {
        self.value_date = Some(value_date);
    }

    fn reset(&mut self) {}

    fn required_indices(&self) -> Vec<MarketObservable> {
        Vec::new()
    }

    fn required_index_dates(&self, _index: &MarketObservable) -> Vec<Date> {
        Vec::new()
    }

    fn set_index_values(&mut self, _index: &MarketObservable, _values: &[f64]) {}

    fn cashflows(&self) -> Result<Vec<Cashflow>, SimulationError> {
        Ok(self.live().copied().collect())
    }

    fn cashflow_currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<Currency> = self.live().map(|cf| cf.currency).collect();
        currencies.sort_unstable();
        currencies.dedup();
        currencies
    }

    fn cashflow_dates(&self, currency: Currency) -> Vec<Date> {
        let mut dates: Vec<Date> = self
            .live()
            .filter(|cf| cf.currency == currency)
            .map(|cf| cf.date)
            .collect();
        normalise_dates(&mut dates);
        dates
    }

    fn clone_box(&self) -> Box<dyn Product> {
        Box::new(self.clone())
    }
}
