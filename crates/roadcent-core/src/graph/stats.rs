//! Basic statistics for a road graph.
//!
//! # Statistics Provided
//!
//! - **node_count** / **edge_count**: size after duplicate pairs collapse.
//! - **self_loop_count**: loop edges (`src == dst`) kept in the graph.
//! - **collapsed_records**: input records that overwrote an existing edge.
//! - **component_count**: connected components. Betweenness never crosses
//!   components, so a fragmented network has many zero scores.
//! - **isolated_node_count**: vertices with no edges other than self-loops.
//! - **max_degree**: most distinct neighbours on one vertex.
//! - **total_length**: sum of edge lengths after collapsing.

use petgraph::algo::connected_components;
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::graph::build::RoadGraph;

/// Summary statistics for a [`RoadGraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub self_loop_count: usize,
    pub collapsed_records: usize,
    pub component_count: usize,
    pub isolated_node_count: usize,
    pub max_degree: usize,
    pub total_length: f64,
}

impl GraphStats {
    /// Compute statistics from a [`RoadGraph`].
    #[must_use]
    pub fn from_graph(rg: &RoadGraph) -> Self {
        let g = &rg.graph;

        let self_loop_count = g
            .edge_references()
            .filter(|e| e.source() == e.target())
            .count();

        let degrees: Vec<usize> = g
            .node_indices()
            .map(|v| g.neighbors(v).filter(|&w| w != v).count())
            .collect();

        let total_length = g.edge_weights().map(|&w| f64::from(w)).sum();

        Self {
            node_count: g.node_count(),
            edge_count: g.edge_count(),
            self_loop_count,
            collapsed_records: rg.collapsed_records,
            component_count: connected_components(g),
            isolated_node_count: degrees.iter().filter(|&&d| d == 0).count(),
            max_degree: degrees.iter().copied().max().unwrap_or(0),
            total_length,
        }
    }
}
