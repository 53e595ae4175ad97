//! Check command implementation
//!
//! Validates the configuration and the simulator wiring with a single
//! sequential path, so provider and currency problems show up without a
//! full run.

use pricer_valuation::ValuationConfig;
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::session::Session;
use crate::Result;

/// Run the check command
pub fn run(config: &CliConfig, session: &Session) -> Result<()> {
    println!("Neutryx Valuation - System Check");
    println!("================================\n");

    println!("Configuration:");
    println!("  Value date:        {}", session.value_date);
    println!("  Forward dates:     {}", session.forward_dates.len());
    println!("  Percentiles:       {:?}", session.percentiles);
    println!("  Paths:             {}", config.valuation.n_paths());
    println!("  Worker threads:    {}", config.valuation.worker_threads());
    println!("  Regression basis:  {:?}", config.valuation.regression_basis());
    println!("  Regression method: {:?}", config.valuation.regression_method());
    println!();

    println!("Market ({}):", config.market.currency);
    println!("  Discount rate:     {}", config.market.rate);
    println!("  Shares:            {}", config.market.shares.len());
    println!("  FX curves:         {}", config.market.fx.len());
    println!();

    println!("Portfolio:");
    println!("  European options:  {}", config.portfolio.european.len());
    println!("  Bermudan options:  {}", config.portfolio.bermudan.len());
    println!("  Fixed strips:      {}", config.portfolio.fixed.len());
    println!();
    if config.portfolio.is_empty() {
        warn!("portfolio is empty; every value will be zero");
    }

    let probe_config = ValuationConfig::builder().n_paths(1).use_threads(false).build()?;
    let probe = session.coordinator.clone().with_config(probe_config)?;
    info!("probing simulator wiring with one path");
    let value = probe.value(&session.portfolio, session.value_date)?;
    println!("Single-path probe value: {value:.6}");
    println!("\nAll checks passed.");
    Ok(())
}
