//! Output formatting for evaluation reports.
//!
//! Supports both a human-readable table and JSON for scripting.

use recheval_core::evaluation::MeanReport;
use recheval_core::{EvalConfig, EvaluationReport, FoldReport};
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON output structure: the configuration next to its results.
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub config: &'a EvalConfig,
    pub report: &'a EvaluationReport,
}

/// Formats a report as JSON.
pub fn format_json(config: &EvalConfig, report: &EvaluationReport) -> String {
    let output = JsonOutput { config, report };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a report as a table with one row per fold and a mean row.
pub fn format_human(config: &EvalConfig, report: &EvaluationReport) -> String {
    if report.folds.is_empty() {
        return "No folds evaluated".to_string();
    }

    // Column labels follow the report's own cutoff keys (sorted, deduplicated)
    let mut header = vec!["fold".to_string()];
    for (label, values) in [
        ("NDCG", &report.mean.ndcg),
        ("P", &report.mean.precision),
        ("R", &report.mean.recall),
        ("MAP", &report.mean.map),
    ] {
        for k in values.keys() {
            header.push(format!("{label}@{k}"));
        }
    }
    header.push("RMSE".to_string());
    header.push("MAE".to_string());

    let mut rows = vec![header];
    for fold in &report.folds {
        rows.push(fold_row(fold));
    }
    rows.push(mean_row(&report.mean));

    let mut output = format!(
        "Strategy: {} | relevance threshold: {} | {} fold{}\n\n",
        config.strategy.name,
        config.relevance_threshold,
        report.folds.len(),
        if report.folds.len() == 1 { "" } else { "s" }
    );
    output.push_str(&render_table(&rows));
    output.trim_end().to_string()
}

fn fold_row(fold: &FoldReport) -> Vec<String> {
    let mut row = vec![fold.fold.to_string()];
    row.extend(metric_cells(&[&fold.ndcg, &fold.precision, &fold.recall, &fold.map]));
    row.push(optional_cell(fold.rmse));
    row.push(optional_cell(fold.mae));
    row
}

fn mean_row(mean: &MeanReport) -> Vec<String> {
    let mut row = vec!["mean".to_string()];
    row.extend(metric_cells(&[&mean.ndcg, &mean.precision, &mean.recall, &mean.map]));
    row.push(optional_cell(mean.rmse));
    row.push(optional_cell(mean.mae));
    row
}

fn metric_cells(metrics: &[&BTreeMap<usize, f64>]) -> Vec<String> {
    metrics
        .iter()
        .flat_map(|values| values.values().map(|v| format!("{:.4}", v)))
        .collect()
}

fn optional_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

/// Right-aligns every column to its widest cell.
fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(String::len)
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        output.push_str(&line);
        output.push('\n');
    }
    output
}
