//! Error types for valuation runs.
//!
//! Failures fall into three categories that callers handle differently:
//!
//! - [`ConfigurationError`]: wiring problems detected before any path is
//!   simulated (ambiguous or missing observable providers, invalid settings)
//! - per-path failures ([`ValuationError::Simulation`],
//!   [`ValuationError::NumericalFailure`]): a model or product failed or
//!   produced NaN on some path; the whole valuation is aborted
//! - [`RegressionError`]: the cross-sectional regression could not be solved
//!
//! No category is retried.

use pricer_core::types::{Currency, Date, MarketObservable, ScheduleError, SimulationError};
use thiserror::Error;

/// Wiring and settings errors, raised before simulation starts.
///
/// # Examples
///
/// ```
/// use pricer_core::types::{Currency, MarketObservable};
/// use pricer_valuation::ConfigurationError;
///
/// let err = ConfigurationError::MissingProvider {
///     observable: MarketObservable::share(Currency::ZAR, "AAA"),
/// };
/// assert_eq!(
///     err.to_string(),
///     "Required index: SHARE:ZAR:AAA is not provided by any of the simulators."
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// More than one simulator claims the observable.
    #[error("{observable} is provided by more than one simulator.")]
    AmbiguousProvider {
        /// The contested observable
        observable: MarketObservable,
    },

    /// No simulator claims the observable.
    #[error("Required index: {observable} is not provided by any of the simulators.")]
    MissingProvider {
        /// The unprovided observable
        observable: MarketObservable,
    },

    /// The numeraire has no currency and the portfolio pays in several.
    #[error("numeraire currency is unresolved for a portfolio paying in {currencies:?}")]
    UnresolvedNumeraireCurrency {
        /// Currencies the portfolio pays in
        currencies: Vec<Currency>,
    },

    /// Path count outside `[1, MAX_PATHS]`.
    #[error("Invalid path count: {0}")]
    InvalidPathCount(usize),

    /// Zero worker threads requested.
    #[error("Invalid thread count: {0}")]
    InvalidThreadCount(usize),

    /// A basis parameter is out of range.
    #[error("Invalid regression basis: {0}")]
    InvalidBasis(String),

    /// A forward value date precedes the value date.
    #[error("forward date {forward_date} precedes value date {value_date}")]
    ForwardDateBeforeValueDate {
        /// The offending forward date
        forward_date: Date,
        /// The value date
        value_date: Date,
    },

    /// A PFE percentile outside `[0, 1]`.
    #[error("percentile {0} is outside [0, 1]")]
    InvalidPercentile(f64),

    /// A simulator returned a different number of factors than on the probe path.
    #[error("simulator {simulator} returned {actual} underlying factors at {date}, expected {expected}")]
    FactorCountMismatch {
        /// Simulator slot (0 is the numeraire simulator)
        simulator: usize,
        /// Date of the query
        date: Date,
        /// Count observed on the probe path
        expected: usize,
        /// Count observed now
        actual: usize,
    },

    /// An exercise schedule is malformed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A simulator rejected its registration.
    #[error("simulator {simulator} could not be prepared: {source}")]
    Preparation {
        /// Simulator slot (0 is the numeraire simulator)
        simulator: usize,
        /// Underlying failure
        #[source]
        source: SimulationError,
    },
}

/// Failures of the cross-sectional least-squares fit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressionError {
    /// Design matrix and target have different row counts.
    #[error("design matrix has {rows} rows but target has {targets} values")]
    DimensionMismatch {
        /// Rows of the design matrix
        rows: usize,
        /// Length of the target vector
        targets: usize,
    },

    /// The target contains NaN or infinity.
    #[error("regression target is not finite at path {path}")]
    NonFiniteTarget {
        /// First offending path
        path: usize,
    },

    /// The design matrix contains NaN or infinity.
    #[error("regression design matrix is not finite")]
    NonFiniteDesign,

    /// The SVD solve failed.
    #[error("SVD least-squares solve failed: {0}")]
    SvdFailed(String),

    /// No factors were recorded at the regression date.
    #[error("no underlying factors were recorded at the regression date")]
    NoFactorsAtDate,

    /// The normal equations are not positive definite.
    #[error("design matrix is rank deficient ({columns} columns)")]
    SingularDesign {
        /// Number of basis columns
        columns: usize,
    },
}

/// Any failure of a valuation call.
#[derive(Error, Debug)]
pub enum ValuationError {
    /// Wiring or settings problem.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A simulator or product failed on a path.
    #[error("simulation failed on path {path}: {source}")]
    Simulation {
        /// Path index
        path: usize,
        /// Underlying failure
        #[source]
        source: SimulationError,
    },

    /// A path produced NaN or infinity.
    #[error("numerical failure on path {path}: {detail}")]
    NumericalFailure {
        /// Path index
        path: usize,
        /// What was non-finite
        detail: String,
    },

    /// The regression at a date failed.
    #[error("regression failed at {date}: {source}")]
    Regression {
        /// Regression date
        date: Date,
        /// Underlying failure
        #[source]
        source: RegressionError,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl ValuationError {
    /// Whether this is a wiring or settings error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ValuationError::Configuration(_))
    }

    /// Whether this is a regression failure.
    pub fn is_regression(&self) -> bool {
        matches!(self, ValuationError::Regression { .. })
    }
}

impl From<ScheduleError> for ValuationError {
    fn from(err: ScheduleError) -> Self {
        ValuationError::Configuration(ConfigurationError::Schedule(err))
    }
}

/// Result type for valuation operations.
pub type ValuationResult<T> = Result<T, ValuationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::Currency;

    #[test]
    fn test_ambiguous_provider_display() {
        let err = ConfigurationError::AmbiguousProvider {
            observable: MarketObservable::share(Currency::ZAR, "AAA"),
        };
        assert_eq!(
            err.to_string(),
            "SHARE:ZAR:AAA is provided by more than one simulator."
        );
    }

    #[test]
    fn test_categories_are_distinct() {
        let config: ValuationError = ConfigurationError::InvalidPathCount(0).into();
        assert!(config.is_configuration());
        assert!(!config.is_regression());

        let regression = ValuationError::Regression {
            date: Date::from_ymd(2025, 1, 1).unwrap(),
            source: RegressionError::SingularDesign { columns: 3 },
        };
        assert!(regression.is_regression());
        assert!(!regression.is_configuration());
        assert_eq!(
            regression.to_string(),
            "regression failed at 2025-01-01: design matrix is rank deficient (3 columns)"
        );
    }

    #[test]
    fn test_simulation_error_display() {
        let err = ValuationError::Simulation {
            path: 17,
            source: SimulationError::InvalidParameter("negative volatility".into()),
        };
        assert_eq!(
            err.to_string(),
            "simulation failed on path 17: invalid parameter: negative volatility"
        );
    }

    #[test]
    fn test_schedule_error_is_configuration() {
        let err: ValuationError = ScheduleError::NoExerciseDates.into();
        assert!(err.is_configuration());
    }
}
