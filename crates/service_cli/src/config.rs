//! CLI configuration management
//!
//! A run is described by a TOML file: market data, the demo portfolio and
//! the valuation settings. Values are layered with the usual priority
//! (highest first):
//!
//! 1. Command line flags
//! 2. `NEUTRYX_*` environment variables
//! 3. Config file
//! 4. Default values

use std::path::{Path, PathBuf};
use std::str::FromStr;

use pricer_core::types::{Currency, Date};
use pricer_models::products::OptionType;
use pricer_valuation::ValuationConfig;
use serde::Deserialize;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable {name}: cannot parse {value:?}")]
    EnvError { name: &'static str, value: String },

    #[error("No value date: set `value_date` in the config file or NEUTRYX_VALUE_DATE")]
    MissingValueDate,

    #[error("Invalid valuation settings: {0}")]
    Valuation(#[from] pricer_valuation::ConfigurationError),
}

/// Log levels supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// One simulated share.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShareConfig {
    /// Share code, quoted in the market currency
    pub code: String,
    pub spot: f64,
    pub volatility: f64,
    #[serde(default)]
    pub dividend_yield: f64,
}

/// A foreign currency with its own flat curve, converted into the market
/// currency at an FX forward.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FxConfig {
    pub currency: Currency,
    /// Units of market currency per unit of `currency`
    pub spot: f64,
    pub rate: f64,
}

/// Market data shared by every simulator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Valuation and discounting currency
    pub currency: Currency,
    /// Continuously compounded flat discount rate
    pub rate: f64,
    /// Random seed of the equity simulator
    pub seed: u64,
    pub shares: Vec<ShareConfig>,
    /// Row-major share correlation matrix; identity when absent
    pub correlation: Option<Vec<Vec<f64>>>,
    pub fx: Vec<FxConfig>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            currency: Currency::ZAR,
            rate: 0.07,
            seed: 42,
            shares: Vec::new(),
            correlation: None,
            fx: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EuropeanTrade {
    pub share: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub expiry: Date,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BermudanTrade {
    pub share: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub exercise_dates: Vec<Date>,
    /// `false` when the exercise decision belongs to the counterparty
    #[serde(default = "default_long_optionality")]
    pub long_optionality: bool,
}

fn default_long_optionality() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixedFlow {
    pub date: Date,
    pub amount: f64,
}

/// A strip of known cashflows in one currency.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixedTrade {
    /// Payment currency; the market currency when absent
    pub currency: Option<Currency>,
    pub cashflows: Vec<FixedFlow>,
}

/// Trades to value, by product type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub european: Vec<EuropeanTrade>,
    pub bermudan: Vec<BermudanTrade>,
    pub fixed: Vec<FixedTrade>,
}

impl PortfolioConfig {
    /// Total number of trades.
    pub fn len(&self) -> usize {
        self.european.len() + self.bermudan.len() + self.fixed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// CLI configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub value_date: Option<Date>,
    /// Dates of the EPE, PFE and path reports
    pub forward_dates: Vec<Date>,
    /// PFE percentiles in `[0, 1]`
    pub percentiles: Vec<f64>,
    pub valuation: ValuationConfig,
    pub market: MarketConfig,
    pub portfolio: PortfolioConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            value_date: None,
            forward_dates: Vec::new(),
            percentiles: vec![0.95],
            valuation: ValuationConfig::default(),
            market: MarketConfig::default(),
            portfolio: PortfolioConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))
    }

    /// Apply `NEUTRYX_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply `NEUTRYX_*` overrides read through `var`
    pub fn apply_env_with<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = var("NEUTRYX_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(date) = var("NEUTRYX_VALUE_DATE") {
            self.value_date = Some(parse_env("NEUTRYX_VALUE_DATE", &date)?);
        }
        if let Some(paths) = var("NEUTRYX_PATHS") {
            self.valuation.set_n_paths(parse_env("NEUTRYX_PATHS", &paths)?);
        }
        if let Some(threads) = var("NEUTRYX_MAX_THREADS") {
            let threads = parse_env("NEUTRYX_MAX_THREADS", &threads)?;
            let use_threads = self.valuation.use_threads();
            self.valuation.set_threadedness(use_threads, Some(threads));
        }
        if let Some(flag) = var("NEUTRYX_USE_THREADS") {
            let use_threads = parse_env("NEUTRYX_USE_THREADS", &flag)?;
            self.valuation.set_threadedness(use_threads, None);
        }
        if let Some(seed) = var("NEUTRYX_SEED") {
            self.market.seed = parse_env("NEUTRYX_SEED", &seed)?;
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if let Some(paths) = cli.paths {
            self.valuation.set_n_paths(paths);
        }
        let use_threads = self.valuation.use_threads() && !cli.no_threads;
        self.valuation.set_threadedness(use_threads, cli.threads);
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.value_date.is_none() {
            return Err(ConfigError::MissingValueDate);
        }
        self.valuation.validate()?;
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvError {
        name,
        value: value.to_string(),
    })
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Path count override
    pub paths: Option<usize>,
    /// Worker thread cap override
    pub threads: Option<usize>,
    /// Force single-threaded runs
    pub no_threads: bool,
    /// Log level override
    pub log_level: Option<String>,
}

/// Build configuration from all sources
pub fn build_config(cli: &CliArgs) -> Result<CliConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };
    config.apply_env()?;
    config.merge_with_cli(cli)?;
    config.validate()?;
    Ok(config)
}
