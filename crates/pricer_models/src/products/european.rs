//! European options on a share, cash settled at expiry.

use pricer_core::traits::Product;
use pricer_core::types::{Cashflow, Currency, Date, MarketObservable, SimulationError};

/// Call or put.
///
/// # Examples
/// ```
/// use pricer_models::products::OptionType;
///
/// assert_eq!(OptionType::Call.payoff(110.0, 100.0), 10.0);
/// assert_eq!(OptionType::Put.payoff(110.0, 100.0), 0.0);
/// assert_eq!(OptionType::Put.exercise_value(110.0, 100.0), -10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionType {
    /// Right to buy: max(S - K, 0)
    Call,
    /// Right to sell: max(K - S, 0)
    Put,
}

impl OptionType {
    /// Signed value received on exercise: `S - K` for a call, `K - S` for a put.
    #[inline]
    pub fn exercise_value(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => spot - strike,
            OptionType::Put => strike - spot,
        }
    }

    /// Payoff at expiry, floored at zero.
    #[inline]
    pub fn payoff(&self, spot: f64, strike: f64) -> f64 {
        self.exercise_value(spot, strike).max(0.0)
    }
}

/// European option paying `payoff(S(expiry), K)` in the share's currency on
/// the expiry date.
#[derive(Debug, Clone, PartialEq)]
pub struct EuropeanOption {
    share: MarketObservable,
    option_type: OptionType,
    strike: f64,
    expiry: Date,
    value_date: Option<Date>,
    spot_at_expiry: Option<f64>,
}

impl EuropeanOption {
    /// Creates an option on `share`.
    pub fn new(share: MarketObservable, option_type: OptionType, strike: f64, expiry: Date) -> Self {
        Self {
            share,
            option_type,
            strike,
            expiry,
            value_date: None,
            spot_at_expiry: None,
        }
    }

    /// Expiry and payment date.
    pub fn expiry(&self) -> Date {
        self.expiry
    }

    /// Strike price.
    pub fn strike(&self) -> f64 {
        self.strike
    }

    fn is_live(&self) -> bool {
        self.value_date.map_or(true, |vd| self.expiry > vd)
    }
}

impl Product for EuropeanOption {
    fn set_value_date(&mut self, value_date: Date) {
        self.value_date = Some(value_date);
    }

    fn reset(&mut self) {
        self.spot_at_expiry = None;
    }

    fn required_indices(&self) -> Vec<MarketObservable> {
        if self.is_live() {
            vec![self.share.clone()]
        } else {
            Vec::new()
        }
    }

    fn required_index_dates(&self, index: &MarketObservable) -> Vec<Date> {
        if self.is_live() && index == &self.share {
            vec![self.expiry]
        } else {
            Vec::new()
        }
    }

    fn set_index_values(&mut self, index: &MarketObservable, values: &[f64]) {
        if index == &self.share {
            self.spot_at_expiry = values.first().copied();
        }
    }

    fn cashflows(&self) -> Result<Vec<Cashflow>, SimulationError> {
        if !self.is_live() {
            return Ok(Vec::new());
        }
        let spot = self
            .spot_at_expiry
            .ok_or_else(|| SimulationError::MissingIndexValues(self.share.clone()))?;
        let currency = self.share.currency().ok_or_else(|| {
            SimulationError::InvalidParameter(format!("{} has no currency", self.share))
        })?;
        Ok(vec![Cashflow::new(
            self.expiry,
            self.option_type.payoff(spot, self.strike),
            currency,
        )])
    }

    fn cashflow_currencies(&self) -> Vec<Currency> {
        if self.is_live() {
            self.share.currency().into_iter().collect()
        } else {
            Vec::new()
        }
    }

    fn cashflow_dates(&self, currency: Currency) -> Vec<Date> {
        if self.is_live() && self.share.currency() == Some(currency) {
            vec![self.expiry]
        } else {
            Vec::new()
        }
    }

    fn clone_box(&self) -> Box<dyn Product> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share() -> MarketObservable {
        MarketObservable::share(Currency::ZAR, "AAA")
    }

    fn date(y: i32) -> Date {
        Date::from_ymd(y, 1, 1).unwrap()
    }

    #[test]
    fn test_put_pays_intrinsic_at_expiry() {
        let mut option = EuropeanOption::new(share(), OptionType::Put, 100.0, date(2026));
        option.set_value_date(date(2025));
        assert_eq!(option.required_index_dates(&share()), vec![date(2026)]);

        option.set_index_values(&share(), &[80.0]);
        assert_eq!(
            option.cashflows().unwrap(),
            vec![Cashflow::new(date(2026), 20.0, Currency::ZAR)]
        );
    }

    #[test]
    fn test_missing_spot_is_an_error() {
        let mut option = EuropeanOption::new(share(), OptionType::Call, 100.0, date(2026));
        option.set_value_date(date(2025));
        option.set_index_values(&share(), &[120.0]);
        option.reset();
        assert_eq!(
            option.cashflows(),
            Err(SimulationError::MissingIndexValues(share()))
        );
    }

    #[test]
    fn test_expired_option_is_inert() {
        let mut option = EuropeanOption::new(share(), OptionType::Call, 100.0, date(2025));
        option.set_value_date(date(2025));
        assert!(option.required_indices().is_empty());
        assert!(option.cashflow_currencies().is_empty());
        assert!(option.cashflows().unwrap().is_empty());
    }
}
