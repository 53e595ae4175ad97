//! Neutryx Valuation CLI
//!
//! Operational entry point for the Monte Carlo valuation coordinator.
//!
//! # Commands
//!
//! - `neutryx-valuation value` - Value the configured portfolio
//! - `neutryx-valuation epe` - Expected positive exposure profile
//! - `neutryx-valuation pfe` - Potential future exposure profile
//! - `neutryx-valuation paths` - Path-wise forward values and factors
//! - `neutryx-valuation check` - Validate configuration and simulator wiring
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate reads market data and trades
//! from a TOML file, builds simulators and products from `pricer_models`
//! and runs them through the `pricer_valuation` coordinator.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod session;

pub use error::{CliError, Result};

use commands::OutputFormat;
use config::{build_config, CliArgs};
use session::Session;

/// Neutryx Monte Carlo Valuation CLI
#[derive(Parser)]
#[command(name = "neutryx-valuation")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML format)
    #[arg(short, long, global = true, value_name = "FILE", default_value = "neutryx-valuation.toml")]
    config: PathBuf,

    /// Number of Monte Carlo paths
    #[arg(short, long, global = true)]
    paths: Option<usize>,

    /// Maximum number of worker threads
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    /// Run everything on the calling thread
    #[arg(long, global = true)]
    no_threads: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value the portfolio at the value date
    Value {
        /// Also value each trade on its own
        #[arg(long)]
        by_trade: bool,
    },

    /// Expected positive exposure at the forward dates
    Epe,

    /// Potential future exposure at the forward dates
    Pfe,

    /// Regressed and realised forward values on every path
    Paths,

    /// Check configuration and simulator wiring
    Check,
}

impl From<&Cli> for CliArgs {
    fn from(cli: &Cli) -> Self {
        CliArgs {
            config_file: Some(cli.config.clone()),
            paths: cli.paths,
            threads: cli.threads,
            no_threads: cli.no_threads,
            log_level: cli.log_level.clone(),
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&CliArgs::from(&cli))
        .with_context(|| format!("loading {}", cli.config.display()))?;

    init_tracing(config.log_level.as_filter_str());
    info!(
        config = %cli.config.display(),
        paths = config.valuation.n_paths(),
        "neutryx-valuation starting"
    );

    let session = Session::from_config(&config).context("building simulators and portfolio")?;

    match cli.command {
        Commands::Value { by_trade } => commands::value::run(&session, by_trade, cli.format)?,
        Commands::Epe => commands::exposure::run_epe(&session, cli.format)?,
        Commands::Pfe => commands::exposure::run_pfe(&session, cli.format)?,
        Commands::Paths => commands::paths::run(&session, cli.format)?,
        Commands::Check => commands::check::run(&config, &session)?,
    }
    Ok(())
}
