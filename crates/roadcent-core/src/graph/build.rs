//! Undirected road graph construction from edge records.
//!
//! # Overview
//!
//! Every `src`/`dst` value seen becomes a vertex, inserted in order of first
//! appearance (`src` before `dst` within a record). Every unordered pair
//! `{src, dst}` becomes exactly one edge weighted by `length`.
//!
//! ## Duplicate Pairs
//!
//! Records naming a pair that already has an edge overwrite its weight, so
//! the last record in file order wins. `(a, b)` and `(b, a)` are the same
//! pair. Nothing else is deduplicated.
//!
//! ## Self-Loops
//!
//! `src == dst` records are kept as loop edges. They never lie on a shortest
//! path between distinct vertices and the traversals skip them.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use tracing::{debug, instrument};

use crate::edges::EdgeRecord;

/// Node id as it appears in the input file.
pub type NodeId = i32;

// ---------------------------------------------------------------------------
// RoadGraph
// ---------------------------------------------------------------------------

/// An undirected road graph: nodes are input node ids, edge weights are
/// segment lengths.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    /// Undirected graph: node weights = node ids, edge weights = lengths.
    pub graph: UnGraph<NodeId, f32>,
    /// Mapping from node id to petgraph `NodeIndex`.
    pub node_map: HashMap<NodeId, NodeIndex>,
    /// Number of records that landed on an already existing edge.
    pub collapsed_records: usize,
}

impl RoadGraph {
    /// Build a [`RoadGraph`] from edge records in file order.
    #[must_use]
    #[instrument(skip_all, fields(records = edges.len()))]
    pub fn from_edges(edges: &[EdgeRecord]) -> Self {
        let mut graph = UnGraph::<NodeId, f32>::default();
        let mut node_map: HashMap<NodeId, NodeIndex> = HashMap::new();
        let mut collapsed_records = 0;

        for edge in edges {
            let a = *node_map
                .entry(edge.src)
                .or_insert_with(|| graph.add_node(edge.src));
            let b = *node_map
                .entry(edge.dst)
                .or_insert_with(|| graph.add_node(edge.dst));

            // update_edge looks the pair up in both directions on an
            // undirected graph and overwrites the weight if present.
            let before = graph.edge_count();
            graph.update_edge(a, b, edge.length);
            if graph.edge_count() == before {
                collapsed_records += 1;
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            collapsed = collapsed_records,
            "built road graph"
        );

        Self {
            graph,
            node_map,
            collapsed_records,
        }
    }

    /// Return the number of vertices.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of distinct edges (after collapsing).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a node id.
    #[must_use]
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_map.get(&id).copied()
    }

    /// Return the node id stored on a vertex.
    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<NodeId> {
        self.graph.node_weight(idx).copied()
    }

    /// Return the length of the edge between `a` and `b`, if any.
    #[must_use]
    pub fn edge_length(&self, a: NodeId, b: NodeId) -> Option<f32> {
        let ia = self.node_index(a)?;
        let ib = self.node_index(b)?;
        let e = self.graph.find_edge(ia, ib)?;
        self.graph.edge_weight(e).copied()
    }
}

impl From<&[EdgeRecord]> for RoadGraph {
    fn from(edges: &[EdgeRecord]) -> Self {
        Self::from_edges(edges)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
