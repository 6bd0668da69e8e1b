use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use roadcent_core::config::RunConfig;
use roadcent_core::{CentralityEstimator, EdgeWeight, Estimate};
use serde::Serialize;
use tracing::debug;

use crate::output::{self, OutputMode, pretty_kv, pretty_rule, pretty_section};

/// Shortest-path weighting selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WeightArg {
    /// Sum of edge `length` values.
    Length,
    /// Every edge counts as one.
    Hops,
}

impl From<WeightArg> for EdgeWeight {
    fn from(value: WeightArg) -> Self {
        match value {
            WeightArg::Length => Self::Length,
            WeightArg::Hops => Self::Hops,
        }
    }
}

/// Arguments for `roadcent estimate`.
///
/// Every flag left unset falls back to the resolved config file.
#[derive(Args, Debug, Default)]
pub struct EstimateArgs {
    /// Edge list CSV with `src,dst,length` columns.
    pub path: Option<PathBuf>,

    /// Read at most this many data rows.
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Number of pivot vertices to sample.
    #[arg(short = 'k', long, conflicts_with = "exact")]
    pub pivots: Option<usize>,

    /// Use every vertex as a source (no sampling).
    #[arg(long)]
    pub exact: bool,

    /// Seed for pivot selection.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Report unnormalized scores.
    #[arg(long)]
    pub raw: bool,

    /// Shortest-path weighting.
    #[arg(long, value_enum)]
    pub weight: Option<WeightArg>,

    /// Count path endpoints toward their own score.
    #[arg(long)]
    pub endpoints: bool,

    /// How many top-ranked vertices to print.
    #[arg(long)]
    pub top: Option<usize>,
}

impl EstimateArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(ref path) = self.path {
            config.input.path.clone_from(path);
        }
        if let Some(max_rows) = self.max_rows {
            config.input.max_rows = max_rows;
        }
        if let Some(pivots) = self.pivots {
            config.centrality.pivots = pivots;
            config.centrality.exact = false;
        }
        if self.exact {
            config.centrality.exact = true;
        }
        if self.seed.is_some() {
            config.centrality.seed = self.seed;
        }
        if self.raw {
            config.centrality.normalized = false;
        }
        if let Some(weight) = self.weight {
            config.centrality.weight = weight.into();
        }
        if self.endpoints {
            config.centrality.endpoints = true;
        }
        if let Some(top) = self.top {
            config.output.top = top;
        }
    }
}

/// One row of the ranking.
#[derive(Debug, Clone, Serialize)]
pub struct RankedNode {
    pub rank: usize,
    pub node: i32,
    pub score: f64,
}

/// What `estimate` prints.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub input: String,
    pub rows: usize,
    pub nodes: usize,
    pub edges: usize,
    pub pivots_used: usize,
    pub sampled: bool,
    pub normalized: bool,
    pub weight: EdgeWeight,
    pub endpoints: bool,
    pub seed: Option<u64>,
    pub top: Vec<RankedNode>,
}

impl EstimateReport {
    fn new(estimator: &CentralityEstimator, estimate: &Estimate, top: usize) -> Self {
        let scores = &estimate.scores;
        Self {
            input: estimator.input().display().to_string(),
            rows: estimate.rows,
            nodes: estimate.stats.node_count,
            edges: estimate.stats.edge_count,
            pivots_used: scores.pivots_used,
            sampled: scores.sampled,
            normalized: scores.normalized,
            weight: estimator.centrality.weight,
            endpoints: estimator.centrality.endpoints,
            seed: scores.seed,
            top: scores
                .top(top)
                .into_iter()
                .enumerate()
                .map(|(i, (node, score))| RankedNode {
                    rank: i + 1,
                    node,
                    score,
                })
                .collect(),
        }
    }
}

const fn weight_label(weight: EdgeWeight) -> &'static str {
    match weight {
        EdgeWeight::Length => "length",
        EdgeWeight::Hops => "hops",
    }
}

fn render_text(report: &EstimateReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "rank\tnode\tscore")?;
    for row in &report.top {
        writeln!(w, "{}\t{}\t{}", row.rank, row.node, row.score)?;
    }
    Ok(())
}

fn render_pretty(report: &EstimateReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Betweenness centrality")?;
    pretty_kv(w, "Input", &report.input)?;
    pretty_kv(w, "Rows", report.rows.to_string())?;
    pretty_kv(
        w,
        "Graph",
        format!("{} nodes, {} edges", report.nodes, report.edges),
    )?;
    let mode = if report.sampled { "sampled" } else { "exact" };
    pretty_kv(w, "Pivots", format!("{} ({mode})", report.pivots_used))?;
    if let Some(seed) = report.seed {
        pretty_kv(w, "Seed", seed.to_string())?;
    }
    pretty_kv(w, "Weight", weight_label(report.weight))?;
    pretty_kv(
        w,
        "Scores",
        if report.normalized { "normalized" } else { "raw" },
    )?;
    if report.endpoints {
        pretty_kv(w, "Endpoints", "counted")?;
    }
    writeln!(w)?;

    if report.top.is_empty() {
        writeln!(w, "(no vertices)")?;
        return Ok(());
    }

    writeln!(w, "{:>4}  {:>12}  {:>14}", "RANK", "NODE", "SCORE")?;
    pretty_rule(w)?;
    for row in &report.top {
        writeln!(w, "{:>4}  {:>12}  {:>14.8}", row.rank, row.node, row.score)?;
    }
    Ok(())
}

/// Execute `roadcent estimate`.
///
/// # Errors
///
/// Returns an error (already rendered to stderr) if loading or estimation
/// fails, or if writing the report fails.
pub fn run_estimate(args: &EstimateArgs, mut config: RunConfig, output: OutputMode) -> Result<()> {
    args.apply(&mut config);
    debug!(?config, "effective config");

    let estimator = CentralityEstimator::from_config(&config);
    let estimate = estimator
        .run()
        .map_err(|e| output::fail(output, e.code(), e))?;

    let report = EstimateReport::new(&estimator, &estimate, config.output.top);
    output::render_mode(output, &report, render_text, render_pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_keep_config_values() {
        let mut config = RunConfig::default();
        config.centrality.seed = Some(5);
        config.output.top = 3;
        let before = config.clone();

        EstimateArgs::default().apply(&mut config);
        assert_eq!(config, before);
    }

    #[test]
    fn flags_override_config() {
        let mut config = RunConfig::default();
        config.centrality.exact = true;
        let args = EstimateArgs {
            path: Some(PathBuf::from("roads.csv")),
            max_rows: Some(10),
            pivots: Some(20),
            seed: Some(9),
            raw: true,
            weight: Some(WeightArg::Hops),
            endpoints: true,
            top: Some(4),
            ..EstimateArgs::default()
        };
        args.apply(&mut config);

        assert_eq!(config.input.path, PathBuf::from("roads.csv"));
        assert_eq!(config.input.max_rows, 10);
        assert_eq!(config.centrality.pivots, 20);
        assert!(!config.centrality.exact);
        assert_eq!(config.centrality.seed, Some(9));
        assert!(!config.centrality.normalized);
        assert_eq!(config.centrality.weight, EdgeWeight::Hops);
        assert!(config.centrality.endpoints);
        assert_eq!(config.output.top, 4);
    }

    #[test]
    fn exact_flag_disables_sampling() {
        let mut config = RunConfig::default();
        let args = EstimateArgs {
            exact: true,
            ..EstimateArgs::default()
        };
        args.apply(&mut config);
        assert_eq!(config.centrality.to_betweenness().pivots, None);
    }

    #[test]
    fn text_report_is_tab_separated() {
        let report = EstimateReport {
            input: "roads.csv".into(),
            rows: 2,
            nodes: 3,
            edges: 2,
            pivots_used: 3,
            sampled: false,
            normalized: true,
            weight: EdgeWeight::Length,
            endpoints: false,
            seed: None,
            top: vec![RankedNode {
                rank: 1,
                node: 2,
                score: 1.0,
            }],
        };
        let mut buf = Vec::new();
        render_text(&report, &mut buf).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "rank\tnode\tscore\n1\t2\t1\n"
        );
    }
}
