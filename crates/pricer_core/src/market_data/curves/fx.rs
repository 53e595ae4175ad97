//! FX forward curve from spot and two discount curves.

use crate::market_data::curves::FlatCurve;
use crate::market_data::error::MarketDataError;
use crate::types::{CurrencyPair, Date};

/// Deterministic FX forwards implied by covered interest parity.
///
/// For a pair BASE/COUNTER with spot `S`:
///
/// ```text
/// F(d) = S * D_base(d) / D_counter(d)
/// ```
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatCurve, FxForwardCurve};
/// use pricer_core::types::{Currency, CurrencyPair, Date};
///
/// let anchor = Date::from_ymd(2024, 1, 1).unwrap();
/// let usd = FlatCurve::new(anchor, 0.05, Currency::USD);
/// let zar = FlatCurve::new(anchor, 0.08, Currency::ZAR);
/// let pair = CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap();
/// let fx = FxForwardCurve::new(pair, 18.5, usd, zar).unwrap();
///
/// let one_year = Date::from_ymd(2025, 1, 1).unwrap();
/// assert!(fx.forward(one_year).unwrap() > 18.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxForwardCurve {
    pair: CurrencyPair,
    spot: f64,
    base_curve: FlatCurve,
    counter_curve: FlatCurve,
}

impl FxForwardCurve {
    /// Creates an FX forward curve.
    ///
    /// # Errors
    ///
    /// - `MarketDataError::InvalidSpot` if `spot` is not positive and finite
    /// - `MarketDataError::CurrencyMismatch` if a curve currency does not
    ///   match its side of the pair
    pub fn new(
        pair: CurrencyPair,
        spot: f64,
        base_curve: FlatCurve,
        counter_curve: FlatCurve,
    ) -> Result<Self, MarketDataError> {
        if !(spot.is_finite() && spot > 0.0) {
            return Err(MarketDataError::InvalidSpot(spot));
        }
        for (expected, curve) in [(pair.base(), &base_curve), (pair.counter(), &counter_curve)] {
            if curve.currency() != expected {
                return Err(MarketDataError::CurrencyMismatch {
                    expected,
                    actual: curve.currency(),
                });
            }
        }
        Ok(Self {
            pair,
            spot,
            base_curve,
            counter_curve,
        })
    }

    /// The currency pair quoted by this curve.
    #[inline]
    pub fn pair(&self) -> CurrencyPair {
        self.pair
    }

    /// Spot rate.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Forward rate for delivery on `date`.
    pub fn forward(&self, date: Date) -> Result<f64, MarketDataError> {
        Ok(self.spot * self.base_curve.discount_factor(date)?
            / self.counter_curve.discount_factor(date)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_at_anchor_is_spot() {
        let anchor = Date::from_ymd(2024, 1, 1).unwrap();
        let usd = FlatCurve::new(anchor, 0.05, Currency::USD);
        let zar = FlatCurve::new(anchor, 0.08, Currency::ZAR);
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap();
        let fx = FxForwardCurve::new(pair, 18.5, usd, zar).unwrap();
        assert_relative_eq!(fx.forward(anchor).unwrap(), 18.5, epsilon = 1e-12);
    }

    #[test]
    fn test_swapped_curves_rejected() {
        let anchor = Date::from_ymd(2024, 1, 1).unwrap();
        let usd = FlatCurve::new(anchor, 0.05, Currency::USD);
        let zar = FlatCurve::new(anchor, 0.08, Currency::ZAR);
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap();
        assert_eq!(
            FxForwardCurve::new(pair, 18.5, zar, usd),
            Err(MarketDataError::CurrencyMismatch {
                expected: Currency::USD,
                actual: Currency::ZAR,
            })
        );
    }

    #[test]
    fn test_invalid_spot_rejected() {
        let anchor = Date::from_ymd(2024, 1, 1).unwrap();
        let usd = FlatCurve::new(anchor, 0.05, Currency::USD);
        let zar = FlatCurve::new(anchor, 0.08, Currency::ZAR);
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap();
        assert!(FxForwardCurve::new(pair, 0.0, usd, zar).is_err());
    }
}
