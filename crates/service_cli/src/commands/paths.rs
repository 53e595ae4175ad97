//! Paths command implementation
//!
//! Dumps the path-wise diagnostics of a valuation. JSON output holds every
//! path; the table shows cross-path means only.

use tracing::info;

use super::{print_json, print_table, OutputFormat};
use crate::session::Session;
use crate::Result;

/// Run the paths command
pub fn run(session: &Session, format: OutputFormat) -> Result<()> {
    let forward_dates = session.require_forward_dates()?;
    info!(dates = forward_dates.len(), "collecting value paths");
    let paths = session
        .coordinator
        .value_paths(&session.portfolio, session.value_date, forward_dates)?;

    match format {
        OutputFormat::Json => print_json(&paths)?,
        OutputFormat::Table => {
            let mut headers = vec![
                "Date".to_string(),
                "Mean regressed".to_string(),
                "Mean realised".to_string(),
            ];
            headers.extend((0..paths.factor_paths.len()).map(|f| format!("Mean factor {f}")));

            let rows: Vec<Vec<String>> = paths
                .forward_dates
                .iter()
                .enumerate()
                .map(|(k, date)| {
                    let mut row = vec![
                        date.to_string(),
                        format!("{:.6}", column_mean(&paths.regressed_forward_values, k)),
                        format!("{:.6}", column_mean(&paths.forward_cashflow_pvs, k)),
                    ];
                    row.extend(
                        paths
                            .factor_paths
                            .iter()
                            .map(|factor| format!("{:.6}", column_mean(factor, k))),
                    );
                    row
                })
                .collect();
            print_table(&headers, &rows);
        }
    }
    Ok(())
}

/// Mean of column `k` of a `[path][date]` table.
fn column_mean(table: &[Vec<f64>], k: usize) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    table.iter().map(|row| row[k]).sum::<f64>() / table.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_mean() {
        let table = vec![vec![1.0, 10.0], vec![3.0, 20.0]];
        assert_eq!(column_mean(&table, 0), 2.0);
        assert_eq!(column_mean(&table, 1), 15.0);
        assert_eq!(column_mean(&[], 0), 0.0);
    }
}
