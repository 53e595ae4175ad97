//! CLI command implementations
//!
//! Each submodule implements a specific CLI command. All of them print
//! either a JSON document or a plain table on stdout.

pub mod check;
pub mod exposure;
pub mod paths;
pub mod value;

use clap::ValueEnum;
use serde::Serialize;

use crate::Result;

/// Output format of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

/// Print `report` as pretty JSON.
pub(crate) fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Render a boxed table with right-aligned cells.
pub(crate) fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(String::len)
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(mid))
    };
    let line = |cells: &[String]| {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| format!(" {:>w$} ", cells.get(i).map_or("", String::as_str)))
            .collect();
        format!("│{}│", padded.join("│"))
    };

    let mut out = vec![rule("┌", "┬", "┐"), line(headers), rule("├", "┼", "┤")];
    out.extend(rows.iter().map(|row| line(row)));
    out.push(rule("└", "┴", "┘"));
    out.join("\n")
}

pub(crate) fn print_table(headers: &[String], rows: &[Vec<String>]) {
    println!("{}", render_table(headers, rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_columns_fit_widest_cell() {
        let headers = vec!["Date".to_string(), "EPE".to_string()];
        let rows = vec![vec!["2025-07-01".to_string(), "1.5".to_string()]];
        let table = render_table(&headers, &rows);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "│       Date │ EPE │");
        assert_eq!(lines[3], "│ 2025-07-01 │ 1.5 │");
        assert!(lines
            .iter()
            .all(|l| l.chars().count() == lines[0].chars().count()));
    }
}
