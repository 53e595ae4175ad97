//! Cashflows emitted by products on a single simulated path.

use super::currency::Currency;
use super::time::Date;

/// An immutable payment: `amount` units of `currency` paid on `date`.
///
/// Positive amounts are received by the holder, negative amounts are paid.
///
/// ```
/// use pricer_core::types::{Cashflow, Currency, Date};
///
/// let date = Date::from_ymd(2025, 6, 30).unwrap();
/// let cf = Cashflow::new(date, -125.0, Currency::ZAR);
/// assert_eq!(cf.scaled(2.0).amount, -250.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cashflow {
    /// Payment date
    pub date: Date,
    /// Signed amount in `currency`
    pub amount: f64,
    /// Payment currency
    pub currency: Currency,
}

impl Cashflow {
    /// Creates a cashflow.
    #[inline]
    pub fn new(date: Date, amount: f64, currency: Currency) -> Self {
        Self {
            date,
            amount,
            currency,
        }
    }

    /// Returns a copy with the amount multiplied by `factor`.
    #[inline]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            amount: self.amount * factor,
            ..*self
        }
    }
}
