//! `railnet compare`: side-by-side robustness summaries of saved traces
//! and campaign reports.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::Args;
use railnet_sim::{CampaignReport, SimulationTrace};
use serde::{Deserialize, Serialize};

use crate::cmd::read_json;
use crate::output::{OutputMode, opt, print_json, section};

/// Arguments for `railnet compare`.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Inputs as `LABEL=PATH` (or just `PATH`, labelled by file stem).
    /// Each file is a trace from `simulate --out` or reports from
    /// `campaign --out`.
    #[arg(required = true, value_name = "LABEL=PATH")]
    pub inputs: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Saved {
    Trace(SimulationTrace),
    Reports(Vec<CampaignReport>),
    Report(CampaignReport),
}

/// One comparison row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareRow {
    pub label: String,
    pub strategy: String,
    pub runs: usize,
    pub auc_efficiency: f64,
    pub auc_lcc: f64,
    /// Only defined for single traces.
    pub critical_fraction: Option<f64>,
}

impl CompareRow {
    fn from_trace(label: String, trace: &SimulationTrace) -> Self {
        let summary = trace.summary();
        Self {
            label,
            strategy: trace.strategy.to_string(),
            runs: 1,
            auc_efficiency: summary.auc_efficiency,
            auc_lcc: summary.auc_lcc,
            critical_fraction: summary.critical_fraction,
        }
    }

    fn from_report(label: String, report: &CampaignReport) -> Self {
        Self {
            label,
            strategy: report.strategy.to_string(),
            runs: report.runs.len(),
            auc_efficiency: report.auc_efficiency.mean,
            auc_lcc: report.auc_lcc.mean,
            critical_fraction: None,
        }
    }
}

/// Split `LABEL=PATH`; a bare path is labelled by its file stem.
fn parse_input(raw: &str) -> Result<(String, PathBuf)> {
    if let Some((label, path)) = raw.split_once('=') {
        if label.is_empty() || path.is_empty() {
            return Err(anyhow!("expected LABEL=PATH, got '{raw}'"));
        }
        return Ok((label.to_string(), PathBuf::from(path)));
    }
    let path = PathBuf::from(raw);
    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("cannot derive a label from '{raw}'"))?;
    Ok((label, path))
}

fn rows_for(label: String, path: &Path) -> Result<Vec<CompareRow>> {
    Ok(match read_json::<Saved>(path)? {
        Saved::Trace(trace) => vec![CompareRow::from_trace(label, &trace)],
        Saved::Report(report) => vec![CompareRow::from_report(label, &report)],
        Saved::Reports(reports) if reports.len() == 1 => {
            vec![CompareRow::from_report(label, &reports[0])]
        }
        Saved::Reports(reports) => reports
            .iter()
            .map(|r| CompareRow::from_report(format!("{label}/{}", r.strategy), r))
            .collect(),
    })
}

/// Execute `railnet compare`.
///
/// # Errors
///
/// Malformed `LABEL=PATH` arguments or unreadable input files.
pub fn run_compare(args: &CompareArgs, output: OutputMode) -> Result<()> {
    let mut rows = Vec::new();
    for raw in &args.inputs {
        let (label, path) = parse_input(raw)?;
        rows.extend(rows_for(label, &path)?);
    }

    if output.is_json() {
        return print_json(&rows);
    }
    print_table(&mut io::stdout().lock(), &rows)?;
    Ok(())
}

fn print_table(w: &mut dyn Write, rows: &[CompareRow]) -> io::Result<()> {
    section(w, "Robustness comparison")?;
    writeln!(
        w,
        "{:<20} {:<24} {:>5} {:>10} {:>10} {:>10}",
        "label", "strategy", "runs", "auc eff", "auc lcc", "critical"
    )?;
    for r in rows {
        writeln!(
            w,
            "{:<20} {:<24} {:>5} {:>10.4} {:>10.4} {:>10}",
            r.label,
            r.strategy,
            r.runs,
            r.auc_efficiency,
            r.auc_lcc,
            opt(r.critical_fraction)
        )?;
    }
    Ok(())
}
