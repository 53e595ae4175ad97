//! Value command implementation
//!
//! Values the configured portfolio at the value date, optionally trade by
//! trade.

use pricer_core::types::Date;
use serde::Serialize;
use tracing::info;

use super::{print_json, print_table, OutputFormat};
use crate::session::Session;
use crate::Result;

#[derive(Debug, Serialize)]
struct ValueReport {
    value_date: Date,
    n_paths: usize,
    value: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    trades: Vec<f64>,
}

/// Run the value command
pub fn run(session: &Session, by_trade: bool, format: OutputFormat) -> Result<()> {
    info!(
        value_date = %session.value_date,
        trades = session.portfolio.len(),
        "valuing portfolio"
    );
    let coordinator = &session.coordinator;
    let value = coordinator.value(&session.portfolio, session.value_date)?;

    let trades = if by_trade {
        session
            .portfolio
            .iter()
            .map(|entry| coordinator.value(std::slice::from_ref(entry), session.value_date))
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    let report = ValueReport {
        value_date: session.value_date,
        n_paths: coordinator.n_paths(),
        value,
        trades,
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            let headers = vec!["Trade".to_string(), "Value".to_string()];
            let mut rows: Vec<Vec<String>> = report
                .trades
                .iter()
                .enumerate()
                .map(|(i, v)| vec![(i + 1).to_string(), format!("{v:.6}")])
                .collect();
            rows.push(vec!["Total".to_string(), format!("{:.6}", report.value)]);
            print_table(&headers, &rows);
        }
    }
    Ok(())
}
