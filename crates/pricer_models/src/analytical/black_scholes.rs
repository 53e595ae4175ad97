//! Black-Scholes pricing for European options with a continuous dividend yield.
//!
//! ## Mathematical Formulas
//!
//! **Call Price**: C = S·e^(-qT)·N(d₁) - K·e^(-rT)·N(d₂)
//! **Put Price**: P = K·e^(-rT)·N(-d₂) - S·e^(-qT)·N(-d₁)
//!
//! Where:
//! - d₁ = (ln(S/K) + (r - q + σ²/2)T) / (σ√T)
//! - d₂ = d₁ - σ√T

use super::distributions::norm_cdf;
use crate::simulators::ModelError;

/// Black-Scholes model for European option pricing.
///
/// # Examples
/// ```
/// use pricer_models::analytical::BlackScholes;
///
/// let bs = BlackScholes::new(100.0, 0.05, 0.2).unwrap();
/// let call_price = bs.price_call(100.0, 1.0);
/// let put_price = bs.price_put(100.0, 1.0);
///
/// // Put-call parity: C - P = S - K*exp(-rT)
/// let parity = call_price - put_price - (100.0 - 100.0 * (-0.05_f64).exp());
/// assert!(parity.abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    /// Spot price (S)
    spot: f64,
    /// Risk-free interest rate (r)
    rate: f64,
    /// Continuous dividend yield (q)
    dividend_yield: f64,
    /// Volatility (σ)
    volatility: f64,
}

impl BlackScholes {
    /// Creates a model without dividends.
    ///
    /// # Errors
    /// - `ModelError::InvalidSpot` if spot <= 0
    /// - `ModelError::InvalidVolatility` if volatility <= 0
    pub fn new(spot: f64, rate: f64, volatility: f64) -> Result<Self, ModelError> {
        if spot <= 0.0 || !spot.is_finite() {
            return Err(ModelError::InvalidSpot { spot });
        }
        if volatility <= 0.0 || !volatility.is_finite() {
            return Err(ModelError::InvalidVolatility { volatility });
        }
        Ok(Self {
            spot,
            rate,
            dividend_yield: 0.0,
            volatility,
        })
    }

    /// Sets the continuous dividend yield.
    #[inline]
    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    /// Returns the spot price.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Returns the risk-free rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the dividend yield.
    #[inline]
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// Returns the volatility.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// d₁ = (ln(S/K) + (r - q + σ²/2)T) / (σ√T)
    #[inline]
    pub fn d1(&self, strike: f64, expiry: f64) -> f64 {
        let vol_sqrt_t = self.volatility * expiry.sqrt();
        let drift = (self.rate - self.dividend_yield + 0.5 * self.volatility * self.volatility) * expiry;
        ((self.spot / strike).ln() + drift) / vol_sqrt_t
    }

    /// d₂ = d₁ - σ√T
    #[inline]
    pub fn d2(&self, strike: f64, expiry: f64) -> f64 {
        self.d1(strike, expiry) - self.volatility * expiry.sqrt()
    }

    /// European call price. At or past expiry, the intrinsic value.
    pub fn price_call(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= 1e-10 {
            return (self.spot - strike).max(0.0);
        }
        let forward_spot = self.spot * (-self.dividend_yield * expiry).exp();
        let discount = (-self.rate * expiry).exp();
        forward_spot * norm_cdf(self.d1(strike, expiry))
            - strike * discount * norm_cdf(self.d2(strike, expiry))
    }

    /// European put price. At or past expiry, the intrinsic value.
    pub fn price_put(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= 1e-10 {
            return (strike - self.spot).max(0.0);
        }
        let forward_spot = self.spot * (-self.dividend_yield * expiry).exp();
        let discount = (-self.rate * expiry).exp();
        strike * discount * norm_cdf(-self.d2(strike, expiry))
            - forward_spot * norm_cdf(-self.d1(strike, expiry))
    }
}
