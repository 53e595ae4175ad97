//! Construction errors of the reference simulators.

use pricer_core::market_data::MarketDataError;
use pricer_core::types::{Currency, MarketObservable};
use thiserror::Error;

/// Invalid simulator set-up, reported when a simulator is built.
///
/// # Examples
///
/// ```
/// use pricer_models::simulators::ModelError;
///
/// let err = ModelError::InvalidVolatility { volatility: -0.1 };
/// assert_eq!(err.to_string(), "volatility must be positive and finite, got -0.1");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Spot price is not positive and finite.
    #[error("spot must be positive and finite, got {spot}")]
    InvalidSpot {
        /// The rejected spot
        spot: f64,
    },

    /// Volatility is not positive and finite.
    #[error("volatility must be positive and finite, got {volatility}")]
    InvalidVolatility {
        /// The rejected volatility
        volatility: f64,
    },

    /// Dividend yield is not finite.
    #[error("dividend yield must be finite, got {0}")]
    InvalidDividendYield(f64),

    /// The observable cannot be modelled by this kind of curve or process.
    #[error("{0} cannot be modelled here")]
    WrongObservableKind(MarketObservable),

    /// The same observable was registered twice.
    #[error("{0} is already modelled")]
    DuplicateObservable(MarketObservable),

    /// A curve is denominated in another currency than its observable.
    #[error("curve for {observable} is in {actual}")]
    CurrencyMismatch {
        /// Observable the curve was registered for
        observable: MarketObservable,
        /// Currency of the curve
        actual: Currency,
    },

    /// The model has no shares.
    #[error("at least one share is required")]
    NoShares,

    /// Correlation matrix has the wrong size.
    #[error("correlation matrix must be {expected}x{expected}, got {rows}x{cols}")]
    CorrelationShape {
        /// Number of shares
        expected: usize,
        /// Rows supplied
        rows: usize,
        /// Columns supplied
        cols: usize,
    },

    /// Correlation matrix entry is invalid.
    #[error("invalid correlation at ({i}, {j}): {value}")]
    InvalidCorrelation {
        /// Row
        i: usize,
        /// Column
        j: usize,
        /// Offending value
        value: f64,
    },

    /// Correlation matrix has no Cholesky factor.
    #[error("correlation matrix is not positive definite")]
    NotPositiveDefinite,

    /// Curve construction failed.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}
