//! Centrality metrics for the road graph.
//!
//! - **Betweenness centrality** (`betweenness`): which junctions carry the
//!   most shortest routes between other junctions? Exact, or estimated from
//!   a random sample of source pivots.
//!
//! ```rust,ignore
//! use roadcent_core::graph::RoadGraph;
//! use roadcent_core::metrics::betweenness::{BetweennessConfig, betweenness_centrality};
//!
//! let rg: RoadGraph = /* build graph */;
//! let bc = betweenness_centrality(&rg, &BetweennessConfig::sampled(1000, 42))?;
//! for (id, score) in bc.top(10) {
//!     println!("{id}\t{score:.6}");
//! }
//! ```

pub mod betweenness;

pub use betweenness::{
    BetweennessConfig, CentralityScores, EdgeWeight, EstimateError, betweenness_centrality,
};
