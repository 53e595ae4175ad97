//! Flat yield curve implementation.

use crate::market_data::error::MarketDataError;
use crate::types::{Currency, Date, DayCountConvention, Tenor};

/// Flat yield curve with a constant continuously-compounded rate.
///
/// Times are measured from the anchor date with ACT/365.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::FlatCurve;
/// use pricer_core::types::{Currency, Date, Tenor};
///
/// let anchor = Date::from_ymd(2024, 1, 1).unwrap();
/// let curve = FlatCurve::new(anchor, 0.07, Currency::ZAR);
///
/// assert_eq!(curve.discount_factor(anchor).unwrap(), 1.0);
/// let fwd = curve.forward_rate(anchor, Tenor::months(3)).unwrap();
/// assert!(fwd > 0.07 && fwd < 0.0715);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatCurve {
    anchor: Date,
    rate: f64,
    currency: Currency,
}

impl FlatCurve {
    /// Construct a flat curve.
    ///
    /// # Arguments
    ///
    /// * `anchor` - Date at which discount factors equal one
    /// * `rate` - The constant interest rate (continuously compounded)
    /// * `currency` - Currency of the curve
    #[inline]
    pub fn new(anchor: Date, rate: f64, currency: Currency) -> Self {
        Self {
            anchor,
            rate,
            currency,
        }
    }

    /// Return the anchor date.
    #[inline]
    pub fn anchor_date(&self) -> Date {
        self.anchor
    }

    /// Return the constant rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Return the curve currency.
    #[inline]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Year fraction from the anchor to `date`.
    #[inline]
    pub fn time(&self, date: Date) -> f64 {
        DayCountConvention::ActualActual365.year_fraction_dates(self.anchor, date)
    }

    /// Return the discount factor for `date`.
    ///
    /// ```text
    /// D(t) = exp(-r * t)
    /// ```
    ///
    /// # Errors
    ///
    /// `MarketDataError::DateBeforeAnchor` if `date` precedes the anchor.
    pub fn discount_factor(&self, date: Date) -> Result<f64, MarketDataError> {
        if date < self.anchor {
            return Err(MarketDataError::DateBeforeAnchor {
                date,
                anchor: self.anchor,
            });
        }
        Ok((-self.rate * self.time(date)).exp())
    }

    /// Simple forward rate for the period starting at `start` with length `tenor`.
    ///
    /// ```text
    /// F = (D(start) / D(end) - 1) / tau
    /// ```
    pub fn forward_rate(&self, start: Date, tenor: Tenor) -> Result<f64, MarketDataError> {
        let end = start
            .add_tenor(tenor)
            .map_err(|_| MarketDataError::InvalidPeriod { start, end: start })?;
        let tau = DayCountConvention::ActualActual365.year_fraction_dates(start, end);
        if tau <= 0.0 {
            return Err(MarketDataError::InvalidPeriod { start, end });
        }
        let ratio = self.discount_factor(start)? / self.discount_factor(end)?;
        Ok((ratio - 1.0) / tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn anchor() -> Date {
        Date::from_ymd(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_discount_factor_matches_formula() {
        let curve = FlatCurve::new(anchor(), 0.05, Currency::USD);
        let date = Date::from_ymd(2026, 1, 1).unwrap();
        let t = 731.0 / 365.0;
        assert_relative_eq!(
            curve.discount_factor(date).unwrap(),
            (-0.05_f64 * t).exp(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_discount_factor_before_anchor_fails() {
        let curve = FlatCurve::new(anchor(), 0.05, Currency::USD);
        let date = Date::from_ymd(2023, 12, 31).unwrap();
        assert!(matches!(
            curve.discount_factor(date),
            Err(MarketDataError::DateBeforeAnchor { .. })
        ));
    }

    #[test]
    fn test_zero_rate_forward_is_zero() {
        let curve = FlatCurve::new(anchor(), 0.0, Currency::ZAR);
        let fwd = curve.forward_rate(anchor(), Tenor::months(3)).unwrap();
        assert_relative_eq!(fwd, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_zero_length_period_fails() {
        let curve = FlatCurve::new(anchor(), 0.05, Currency::ZAR);
        assert!(curve.forward_rate(anchor(), Tenor::days(0)).is_err());
    }
}
