//! Product construction errors.

use pricer_core::types::{DateError, MarketObservable, ScheduleError};
use thiserror::Error;

/// Invalid product terms.
///
/// # Examples
/// ```
/// use pricer_models::products::ProductError;
///
/// let err = ProductError::InvalidStrike { strike: -100.0 };
/// assert!(err.to_string().contains("-100"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProductError {
    /// Strike is negative or not finite.
    #[error("invalid strike: K = {strike}")]
    InvalidStrike {
        /// The rejected strike
        strike: f64,
    },

    /// The underlying is not a share.
    #[error("{0} is not a share")]
    NotAShare(MarketObservable),

    /// The exercise dates do not form a valid schedule.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A settlement date could not be derived.
    #[error(transparent)]
    Date(#[from] DateError),
}
