//! Exposure command implementations
//!
//! Expected positive exposure and potential future exposure profiles at the
//! configured forward dates.

use pricer_core::types::Date;
use serde::Serialize;
use tracing::info;

use super::{print_json, print_table, OutputFormat};
use crate::session::Session;
use crate::Result;

#[derive(Debug, Serialize)]
struct EpeReport<'a> {
    value_date: Date,
    forward_dates: &'a [Date],
    epe: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct PfeReport<'a> {
    value_date: Date,
    forward_dates: &'a [Date],
    percentiles: &'a [f64],
    /// `[forward date][percentile]`
    pfe: Vec<Vec<f64>>,
}

/// Run the epe command
pub fn run_epe(session: &Session, format: OutputFormat) -> Result<()> {
    let forward_dates = session.require_forward_dates()?;
    info!(dates = forward_dates.len(), "computing expected positive exposure");
    let epe = session
        .coordinator
        .epe(&session.portfolio, session.value_date, forward_dates)?;

    match format {
        OutputFormat::Json => print_json(&EpeReport {
            value_date: session.value_date,
            forward_dates,
            epe,
        })?,
        OutputFormat::Table => {
            let headers = vec!["Date".to_string(), "EPE".to_string()];
            let rows: Vec<Vec<String>> = forward_dates
                .iter()
                .zip(&epe)
                .map(|(d, v)| vec![d.to_string(), format!("{v:.6}")])
                .collect();
            print_table(&headers, &rows);
        }
    }
    Ok(())
}

/// Run the pfe command
pub fn run_pfe(session: &Session, format: OutputFormat) -> Result<()> {
    let forward_dates = session.require_forward_dates()?;
    let percentiles = &session.percentiles;
    info!(
        dates = forward_dates.len(),
        percentiles = ?percentiles,
        "computing potential future exposure"
    );
    let pfe = session.coordinator.pfe(
        &session.portfolio,
        session.value_date,
        forward_dates,
        percentiles,
    )?;

    match format {
        OutputFormat::Json => print_json(&PfeReport {
            value_date: session.value_date,
            forward_dates,
            percentiles,
            pfe,
        })?,
        OutputFormat::Table => {
            let headers: Vec<String> = std::iter::once("Date".to_string())
                .chain(percentiles.iter().map(|p| format!("PFE {:.1}%", 100.0 * p)))
                .collect();
            let rows: Vec<Vec<String>> = forward_dates
                .iter()
                .zip(&pfe)
                .map(|(d, row)| {
                    std::iter::once(d.to_string())
                        .chain(row.iter().map(|v| format!("{v:.6}")))
                        .collect()
                })
                .collect();
            print_table(&headers, &rows);
        }
    }
    Ok(())
}
