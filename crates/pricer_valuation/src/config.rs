//! Valuation run configuration.
//!
//! [`ValuationConfig`] collects the settings of a [`Coordinator`](crate::Coordinator):
//! path count, threading and the regression strategy. It can be built
//! fluently with [`ValuationConfigBuilder`] or deserialised from TOML.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::regression::{RegressionBasis, RegressionMethod};

/// Maximum number of simulation paths allowed.
pub const MAX_PATHS: usize = 10_000_000;

/// Path count from which the simulation phase runs on several threads.
pub const DEFAULT_SIMULATION_THRESHOLD: usize = 1000;

/// Forward date count from which forward-value regressions run on several threads.
pub const DEFAULT_REGRESSION_THRESHOLD: usize = 20;

/// Valuation settings.
///
/// # Examples
///
/// ```rust
/// use pricer_valuation::{RegressionBasis, ValuationConfig};
///
/// let config = ValuationConfig::builder()
///     .n_paths(5_000)
///     .max_threads(2)
///     .regression_basis(RegressionBasis::Polynomial { order: 3 })
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.n_paths(), 5_000);
/// assert_eq!(config.worker_threads(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    n_paths: usize,
    use_threads: bool,
    max_threads: Option<usize>,
    simulation_threshold: usize,
    regression_threshold: usize,
    regression_basis: RegressionBasis,
    regression_method: RegressionMethod,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            n_paths: 10_000,
            use_threads: true,
            max_threads: None,
            simulation_threshold: DEFAULT_SIMULATION_THRESHOLD,
            regression_threshold: DEFAULT_REGRESSION_THRESHOLD,
            regression_basis: RegressionBasis::default(),
            regression_method: RegressionMethod::default(),
        }
    }
}

impl ValuationConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> ValuationConfigBuilder {
        ValuationConfigBuilder::default()
    }

    /// Returns the number of simulation paths.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Whether multi-threading is allowed at all.
    #[inline]
    pub fn use_threads(&self) -> bool {
        self.use_threads
    }

    /// Explicit worker thread cap, if one was set.
    #[inline]
    pub fn max_threads(&self) -> Option<usize> {
        self.max_threads
    }

    /// Number of worker threads to use: the cap, or the CPU count.
    pub fn worker_threads(&self) -> usize {
        if !self.use_threads {
            return 1;
        }
        self.max_threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Path count from which simulation is multi-threaded.
    #[inline]
    pub fn simulation_threshold(&self) -> usize {
        self.simulation_threshold
    }

    /// Forward date count from which forward regressions are multi-threaded.
    #[inline]
    pub fn regression_threshold(&self) -> usize {
        self.regression_threshold
    }

    /// Basis functions used for all regressions.
    #[inline]
    pub fn regression_basis(&self) -> RegressionBasis {
        self.regression_basis
    }

    /// Least-squares solver.
    #[inline]
    pub fn regression_method(&self) -> RegressionMethod {
        self.regression_method
    }

    /// Replaces the path count. Checked by [`validate`](Self::validate).
    pub fn set_n_paths(&mut self, n_paths: usize) {
        self.n_paths = n_paths;
    }

    /// Enables or disables threading. `None` keeps the current thread cap.
    pub fn set_threadedness(&mut self, use_threads: bool, max_threads: Option<usize>) {
        self.use_threads = use_threads;
        if max_threads.is_some() {
            self.max_threads = max_threads;
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `n_paths` is 0 or greater than 10,000,000
    /// - `max_threads` is `Some(0)`
    /// - the regression basis has no buckets or order
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.n_paths == 0 || self.n_paths > MAX_PATHS {
            return Err(ConfigurationError::InvalidPathCount(self.n_paths));
        }
        if self.max_threads == Some(0) {
            return Err(ConfigurationError::InvalidThreadCount(0));
        }
        self.regression_basis.validate()
    }
}

/// Builder for [`ValuationConfig`].
#[derive(Clone, Debug, Default)]
pub struct ValuationConfigBuilder {
    config: ValuationConfig,
}

impl ValuationConfigBuilder {
    /// Sets the number of simulation paths.
    #[inline]
    pub fn n_paths(mut self, n_paths: usize) -> Self {
        self.config.n_paths = n_paths;
        self
    }

    /// Enables or disables multi-threading.
    #[inline]
    pub fn use_threads(mut self, use_threads: bool) -> Self {
        self.config.use_threads = use_threads;
        self
    }

    /// Caps the number of worker threads.
    #[inline]
    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.config.max_threads = Some(max_threads);
        self
    }

    /// Sets the path count from which simulation is multi-threaded.
    #[inline]
    pub fn simulation_threshold(mut self, threshold: usize) -> Self {
        self.config.simulation_threshold = threshold;
        self
    }

    /// Sets the forward date count from which regressions are multi-threaded.
    #[inline]
    pub fn regression_threshold(mut self, threshold: usize) -> Self {
        self.config.regression_threshold = threshold;
        self
    }

    /// Sets the regression basis.
    #[inline]
    pub fn regression_basis(mut self, basis: RegressionBasis) -> Self {
        self.config.regression_basis = basis;
        self
    }

    /// Sets the least-squares solver.
    #[inline]
    pub fn regression_method(mut self, method: RegressionMethod) -> Self {
        self.config.regression_method = method;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<ValuationConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
