//! Road graph module.
//!
//! ## Pipeline
//!
//! ```text
//! CSV edge list
//!        ↓  edges::load_edges()
//! Vec<EdgeRecord> (file order, duplicates kept)
//!        ↓  build::RoadGraph::from_edges()
//! RoadGraph (undirected, one edge per unordered pair, last length wins)
//!        ↓  stats::GraphStats::from_graph()
//! GraphStats (components, self-loops, degree, total length, …)
//! ```

pub mod build;
pub mod stats;

pub use build::{NodeId, RoadGraph};
pub use stats::GraphStats;
