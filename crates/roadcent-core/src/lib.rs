#![forbid(unsafe_code)]
//! roadcent-core library.
//!
//! Loads a road-network edge list, builds an undirected weighted graph and
//! estimates betweenness centrality from a random sample of pivots.
//!
//! # Conventions
//!
//! - **Errors**: Each stage returns its own `thiserror` enum carrying an
//!   [`error::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod edges;
pub mod error;
pub mod estimator;
pub mod graph;
pub mod metrics;
pub mod timing;

pub use edges::{EdgeRecord, LoadError, load_edges, read_edges};
pub use estimator::{CentralityEstimator, Estimate, EstimatorError};
pub use graph::{GraphStats, NodeId, RoadGraph};
pub use metrics::betweenness::{
    BetweennessConfig, CentralityScores, EdgeWeight, EstimateError, betweenness_centrality,
};
