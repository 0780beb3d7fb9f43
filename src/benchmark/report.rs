//! Report rendering
//!
//! The table layout is:
//!
//! ```text
//! bm25
//! K	|	NDCG@K
//! 1	|	0.520
//! 5	|	0.431
//! ```
//!
//! with no newline after the last row.

use anyhow::{Context, Result};
use std::path::Path;

use super::driver::EvaluationReport;
use crate::config::OutputFormat;

/// Render the `K | NDCG@K` table
pub fn render_table(report: &EvaluationReport) -> String {
    let mut lines = Vec::with_capacity(report.cutoffs.len() + 2);
    lines.push(report.label.clone());
    lines.push("K\t|\tNDCG@K".to_string());
    for cutoff in &report.cutoffs {
        lines.push(format!("{}\t|\t{:.3}", cutoff.k, cutoff.ndcg));
    }
    lines.join("\n")
}

/// Render the report as pretty JSON
pub fn render_json(report: &EvaluationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

pub fn render(report: &EvaluationReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Json => render_json(report),
    }
}

/// One row per query: id, window start, then NDCG at each cutoff
pub fn render_per_query(report: &EvaluationReport) -> String {
    let header: Vec<String> = report.cutoffs.iter().map(|c| format!("@{}", c.k)).collect();
    let mut out = format!("query\tstart\t{}\n", header.join("\t"));
    for query in &report.per_query {
        let scores: Vec<String> = query.ndcg.iter().map(|v| format!("{:.3}", v)).collect();
        out.push_str(&format!("{}\t{}\t{}\n", query.query_id, query.start, scores.join("\t")));
    }
    out
}

/// Write a rendered report, creating parent directories
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}
