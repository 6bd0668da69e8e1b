use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use roadcent_core::config::RunConfig;
use roadcent_core::{CentralityEstimator, GraphStats};
use serde::Serialize;

use crate::output::{self, OutputMode, pretty_kv, pretty_section};

/// Arguments for `roadcent stats`.
#[derive(Args, Debug, Default)]
pub struct StatsArgs {
    /// Edge list CSV with `src,dst,length` columns.
    pub path: Option<PathBuf>,

    /// Read at most this many data rows.
    #[arg(long)]
    pub max_rows: Option<usize>,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    input: String,
    rows: usize,
    #[serde(flatten)]
    stats: GraphStats,
}

fn render_text(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    let s = &report.stats;
    for (key, value) in [
        ("rows", report.rows.to_string()),
        ("nodes", s.node_count.to_string()),
        ("edges", s.edge_count.to_string()),
        ("self_loops", s.self_loop_count.to_string()),
        ("collapsed_records", s.collapsed_records.to_string()),
        ("components", s.component_count.to_string()),
        ("isolated_nodes", s.isolated_node_count.to_string()),
        ("max_degree", s.max_degree.to_string()),
        ("total_length", s.total_length.to_string()),
    ] {
        writeln!(w, "{key}\t{value}")?;
    }
    Ok(())
}

fn render_pretty(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    let s = &report.stats;
    pretty_section(w, "Road graph")?;
    pretty_kv(w, "Input", &report.input)?;
    pretty_kv(w, "Rows", report.rows.to_string())?;
    pretty_kv(w, "Nodes", s.node_count.to_string())?;
    pretty_kv(w, "Edges", s.edge_count.to_string())?;
    pretty_kv(w, "Self-loops", s.self_loop_count.to_string())?;
    pretty_kv(w, "Collapsed", format!("{} duplicate rows", s.collapsed_records))?;
    pretty_kv(w, "Components", s.component_count.to_string())?;
    pretty_kv(w, "Isolated", s.isolated_node_count.to_string())?;
    pretty_kv(w, "Max degree", s.max_degree.to_string())?;
    pretty_kv(w, "Total length", format!("{:.3}", s.total_length))
}

/// Execute `roadcent stats`: load and build, no estimation.
///
/// # Errors
///
/// Returns an error (already rendered to stderr) if loading fails, or if
/// writing the report fails.
pub fn run_stats(args: &StatsArgs, mut config: RunConfig, output: OutputMode) -> Result<()> {
    if let Some(ref path) = args.path {
        config.input.path.clone_from(path);
    }
    if let Some(max_rows) = args.max_rows {
        config.input.max_rows = max_rows;
    }

    let estimator = CentralityEstimator::from_config(&config);
    let (graph, rows) = estimator
        .load_graph()
        .map_err(|e| output::fail(output, e.code(), e))?;

    let report = StatsReport {
        input: estimator.input().display().to_string(),
        rows,
        stats: GraphStats::from_graph(&graph),
    };
    output::render_mode(output, &report, render_text, render_pretty)
}
