//! CLI error types

use pricer_core::types::CurrencyError;
use pricer_models::products::ProductError;
use pricer_models::simulators::ModelError;
use pricer_valuation::{ConfigurationError, ValuationError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid market data: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid trade: {0}")]
    Product(#[from] ProductError),

    #[error(transparent)]
    Currency(#[from] CurrencyError),

    #[error("Valuation failed: {0}")]
    Valuation(#[from] ValuationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<ConfigurationError> for CliError {
    fn from(err: ConfigurationError) -> Self {
        CliError::Valuation(err.into())
    }
}

/// Result type for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;
