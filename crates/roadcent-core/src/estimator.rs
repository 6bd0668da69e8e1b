//! The load → build → estimate pipeline.
//!
//! Any stage failure aborts the run; the graph only lives inside
//! [`CentralityEstimator::run`] and is dropped on error.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::RunConfig;
use crate::edges::{LoadError, load_edges};
use crate::error::ErrorCode;
use crate::graph::{GraphStats, RoadGraph};
use crate::metrics::betweenness::{
    BetweennessConfig, CentralityScores, EstimateError, betweenness_centrality,
};
use crate::timing;

/// A failed pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Estimate(#[from] EstimateError),
}

impl EstimatorError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Load(e) => e.code(),
            Self::Estimate(e) => e.code(),
        }
    }
}

/// What a full run produces.
#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    /// Data rows read from the input (at most the row cap).
    pub rows: usize,
    pub stats: GraphStats,
    pub scores: CentralityScores,
}

/// Runs the three stages against one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralityEstimator {
    pub input: PathBuf,
    pub max_rows: usize,
    pub centrality: BetweennessConfig,
}

impl CentralityEstimator {
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, max_rows: usize, centrality: BetweennessConfig) -> Self {
        Self {
            input: input.into(),
            max_rows,
            centrality,
        }
    }

    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.input.path.clone(),
            config.input.max_rows,
            config.centrality.to_betweenness(),
        )
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Load and build only. Returns the graph and the number of rows read.
    ///
    /// # Errors
    ///
    /// Returns [`EstimatorError::Load`] when the input cannot be loaded.
    pub fn load_graph(&self) -> Result<(RoadGraph, usize), EstimatorError> {
        let edges = timing::timed("load", || load_edges(&self.input, self.max_rows))?;
        let graph = timing::timed("build", || RoadGraph::from_edges(&edges));
        Ok((graph, edges.len()))
    }

    /// Run load, build and estimate.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; nothing is produced on failure.
    #[instrument(skip_all, fields(input = %self.input.display()))]
    pub fn run(&self) -> Result<Estimate, EstimatorError> {
        let (graph, rows) = self.load_graph()?;
        let stats = GraphStats::from_graph(&graph);
        info!(
            rows,
            nodes = stats.node_count,
            edges = stats.edge_count,
            components = stats.component_count,
            "graph ready"
        );

        let scores =
            timing::timed("estimate", || betweenness_centrality(&graph, &self.centrality))?;

        Ok(Estimate {
            rows,
            stats,
            scores,
        })
    }
}
