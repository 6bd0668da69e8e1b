//! Betweenness centrality via Brandes' algorithm with pivot sampling.
//!
//! # Overview
//!
//! Betweenness centrality measures how often a vertex lies on shortest paths
//! between other pairs of vertices. On a road network high-betweenness
//! vertices are the junctions most through-traffic would cross.
//!
//! # Algorithm
//!
//! Brandes (2001), run from a set of source vertices ("pivots"):
//!
//! 1. For each pivot `s`, compute single-source shortest paths: Dijkstra on
//!    edge lengths ([`EdgeWeight::Length`]) or BFS on hop counts
//!    ([`EdgeWeight::Hops`]). Record the settle order, shortest-path counts
//!    `sigma`, and predecessor lists.
//! 2. Accumulate dependency scores in reverse settle order (farthest first).
//! 3. Sum the dependency scores across all pivots.
//! 4. Rescale (see below).
//!
//! Complexity per pivot: O(E + V log V) weighted, O(V + E) for hops.
//!
//! # Sampling
//!
//! With `k < n` pivots, `k` distinct vertices are drawn uniformly without
//! replacement from a [`StdRng`] seeded with a `u64`. The sum over sampled
//! pivots is scaled by `n / k`, which makes the score an unbiased estimate
//! of the exact value. With `k >= n` every vertex is a pivot and the result
//! is exact. A sampled, normalized estimate can exceed 1.0.
//!
//! # Scaling
//!
//! Each unordered pair is visited from both ends, so:
//!
//! | normalized | endpoints | scale                       |
//! |------------|-----------|-----------------------------|
//! | yes        | no        | `1/((n-1)(n-2))` if `n > 2` |
//! | yes        | yes       | `1/(n(n-1))` if `n >= 2`    |
//! | no         | either    | `1/2`                       |
//!
//! When a scale applies it is multiplied by `n / k`.
//!
//! # Ties
//!
//! Two weighted paths are equally short only when their `f64` sums compare
//! exactly equal. Zero-length edges between distinct vertices are allowed
//! but may undercount paths that tie through them.

#![allow(clippy::cast_precision_loss, clippy::module_name_repetitions)]

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::ErrorCode;
use crate::graph::build::{NodeId, RoadGraph};

/// Default pivot count for the sampled estimate.
pub const DEFAULT_PIVOTS: usize = 1000;

/// Log a progress line every this many pivots.
const PROGRESS_EVERY: usize = 100;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How path length is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeWeight {
    /// Sum of edge lengths (Dijkstra).
    #[default]
    Length,
    /// Number of edges (BFS); lengths are ignored.
    Hops,
}

/// Parameters for [`betweenness_centrality`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetweennessConfig {
    /// Pivot count `k`. `None` runs the exact computation from every vertex.
    pub pivots: Option<usize>,
    /// Scale scores into `[0, 1]` (in expectation, when sampled).
    pub normalized: bool,
    pub weight: EdgeWeight,
    /// Count path endpoints as lying on the path.
    pub endpoints: bool,
    /// Pivot sampling seed. Drawn from entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for BetweennessConfig {
    fn default() -> Self {
        Self {
            pivots: Some(DEFAULT_PIVOTS),
            normalized: true,
            weight: EdgeWeight::Length,
            endpoints: false,
            seed: None,
        }
    }
}

impl BetweennessConfig {
    /// Exact computation: every vertex is a pivot.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            pivots: None,
            ..Self::default()
        }
    }

    /// Sampled computation with `k` pivots and a fixed seed.
    #[must_use]
    pub fn sampled(k: usize, seed: u64) -> Self {
        Self {
            pivots: Some(k),
            seed: Some(seed),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from [`betweenness_centrality`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    /// `pivots = Some(0)` would divide by zero when rescaling.
    #[error("pivot count must be at least 1")]
    ZeroPivots,

    /// Dijkstra requires finite, non-negative lengths.
    #[error("edge {src}-{dst} has length {length}; weighted paths need finite non-negative lengths")]
    InvalidWeight { src: NodeId, dst: NodeId, length: f32 },
}

impl EstimateError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ZeroPivots => ErrorCode::InvalidParameter,
            Self::InvalidWeight { .. } => ErrorCode::InvalidWeight,
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Betweenness scores for every vertex plus the parameters that produced
/// them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityScores {
    /// Score per node id. Every vertex of the graph is present.
    pub scores: HashMap<NodeId, f64>,
    pub node_count: usize,
    /// Number of pivots actually traversed.
    pub pivots_used: usize,
    /// True when fewer pivots than vertices were used.
    pub sampled: bool,
    pub normalized: bool,
    /// Seed used for pivot sampling; `None` when every vertex was a pivot.
    pub seed: Option<u64>,
}

impl CentralityScores {
    fn empty(normalized: bool) -> Self {
        Self {
            scores: HashMap::new(),
            node_count: 0,
            pivots_used: 0,
            sampled: false,
            normalized,
            seed: None,
        }
    }

    /// Score for a node id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<f64> {
        self.scores.get(&id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// The `n` highest-scoring vertices, highest first. Ties break by
    /// ascending node id.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<(NodeId, f64)> {
        let mut ranked: Vec<(NodeId, f64)> = self.scores.iter().map(|(&id, &s)| (id, s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compute (or estimate, when sampling) betweenness centrality for every
/// vertex of `rg`.
///
/// # Errors
///
/// Returns [`EstimateError::ZeroPivots`] for `pivots = Some(0)` and
/// [`EstimateError::InvalidWeight`] when weighting by length and any edge
/// length is negative or not finite.
#[instrument(skip_all, fields(nodes = rg.node_count(), pivots = ?config.pivots, weight = ?config.weight))]
pub fn betweenness_centrality(
    rg: &RoadGraph,
    config: &BetweennessConfig,
) -> Result<CentralityScores, EstimateError> {
    if config.pivots == Some(0) {
        return Err(EstimateError::ZeroPivots);
    }

    let g = &rg.graph;
    let n = g.node_count();

    if n == 0 {
        return Ok(CentralityScores::empty(config.normalized));
    }

    if config.weight == EdgeWeight::Length {
        check_lengths(g)?;
    }

    let (pivots, seed) = select_pivots(n, config.pivots, config.seed);
    let k = pivots.len();
    if let Some(seed) = seed {
        info!(seed, k, n, "sampling pivots");
    }

    // Node-indexed betweenness accumulator.
    let mut cb: Vec<f64> = vec![0.0; n];
    let mut sp = ShortestPaths::new(n);

    for (i, &s) in pivots.iter().enumerate() {
        sp.reset();
        match config.weight {
            EdgeWeight::Length => sp.dijkstra(g, s),
            EdgeWeight::Hops => sp.bfs(g, s),
        }

        if config.endpoints {
            sp.accumulate_endpoints(&mut cb, s);
        } else {
            sp.accumulate_basic(&mut cb, s);
        }

        if (i + 1) % PROGRESS_EVERY == 0 {
            debug!(done = i + 1, total = k, "pivot progress");
        }
    }

    rescale(&mut cb, n, k, config.normalized, config.endpoints);

    let scores = g
        .node_indices()
        .map(|idx| (g[idx], cb[idx.index()]))
        .collect();

    info!(n, k, sampled = seed.is_some(), "betweenness complete");

    Ok(CentralityScores {
        scores,
        node_count: n,
        pivots_used: k,
        sampled: seed.is_some(),
        normalized: config.normalized,
        seed,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_lengths(g: &UnGraph<NodeId, f32>) -> Result<(), EstimateError> {
    for e in g.edge_references() {
        let length = *e.weight();
        if !(length.is_finite() && length >= 0.0) {
            return Err(EstimateError::InvalidWeight {
                src: g[e.source()],
                dst: g[e.target()],
                length,
            });
        }
    }
    Ok(())
}

/// Pick the pivot set. Returns the seed when sampling happened.
fn select_pivots(
    n: usize,
    pivots: Option<usize>,
    seed: Option<u64>,
) -> (Vec<NodeIndex>, Option<u64>) {
    match pivots {
        Some(k) if k < n => {
            let seed = seed.unwrap_or_else(rand::random::<u64>);
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = index::sample(&mut rng, n, k)
                .into_iter()
                .map(NodeIndex::new)
                .collect();
            (picked, Some(seed))
        }
        _ => ((0..n).map(NodeIndex::new).collect(), None),
    }
}

fn rescale(cb: &mut [f64], n: usize, k: usize, normalized: bool, endpoints: bool) {
    let scale = if normalized {
        if endpoints {
            (n >= 2).then(|| 1.0 / (n as f64 * (n - 1) as f64))
        } else {
            (n > 2).then(|| 1.0 / ((n - 1) as f64 * (n - 2) as f64))
        }
    } else {
        Some(0.5)
    };

    if let Some(scale) = scale {
        let scale = scale * n as f64 / k as f64;
        for score in cb {
            *score *= scale;
        }
    }
}

/// Per-pivot traversal state, reused across pivots.
///
/// Only vertices on `stack` were touched, so `reset` clears just those.
struct ShortestPaths {
    /// Vertices in settle order.
    stack: Vec<NodeIndex>,
    preds: Vec<Vec<NodeIndex>>,
    sigma: Vec<f64>,
    dist: Vec<f64>,
    settled: Vec<bool>,
    delta: Vec<f64>,
    heap: BinaryHeap<Reverse<(u64, usize)>>,
    queue: VecDeque<NodeIndex>,
}

impl ShortestPaths {
    fn new(n: usize) -> Self {
        Self {
            stack: Vec::with_capacity(n),
            preds: vec![Vec::new(); n],
            sigma: vec![0.0; n],
            dist: vec![f64::INFINITY; n],
            settled: vec![false; n],
            delta: vec![0.0; n],
            heap: BinaryHeap::new(),
            queue: VecDeque::new(),
        }
    }

    fn reset(&mut self) {
        for &v in &self.stack {
            let i = v.index();
            self.preds[i].clear();
            self.sigma[i] = 0.0;
            self.dist[i] = f64::INFINITY;
            self.settled[i] = false;
            self.delta[i] = 0.0;
        }
        self.stack.clear();
        self.heap.clear();
        self.queue.clear();
    }

    /// Unweighted single-source shortest paths.
    #[allow(clippy::float_cmp)]
    fn bfs(&mut self, g: &UnGraph<NodeId, f32>, s: NodeIndex) {
        let si = s.index();
        self.dist[si] = 0.0;
        self.sigma[si] = 1.0;
        self.queue.push_back(s);

        while let Some(v) = self.queue.pop_front() {
            let vi = v.index();
            self.stack.push(v);

            for w in g.neighbors(v) {
                if w == v {
                    continue;
                }
                let wi = w.index();

                // First visit to w?
                if self.dist[wi].is_infinite() {
                    self.dist[wi] = self.dist[vi] + 1.0;
                    self.queue.push_back(w);
                }

                // Shortest path to w via v?
                if self.dist[wi] == self.dist[vi] + 1.0 {
                    self.sigma[wi] += self.sigma[vi];
                    self.preds[wi].push(v);
                }
            }
        }
    }

    /// Weighted single-source shortest paths on edge lengths.
    ///
    /// Heap keys are `f64::to_bits` of the distance, which orders the same
    /// as the value for finite non-negative floats.
    #[allow(clippy::float_cmp)]
    fn dijkstra(&mut self, g: &UnGraph<NodeId, f32>, s: NodeIndex) {
        let si = s.index();
        self.dist[si] = 0.0;
        self.sigma[si] = 1.0;
        self.heap.push(Reverse((0.0_f64.to_bits(), si)));

        while let Some(Reverse((bits, vi))) = self.heap.pop() {
            if self.settled[vi] {
                continue;
            }
            self.settled[vi] = true;

            let v = NodeIndex::new(vi);
            let d = f64::from_bits(bits);
            self.stack.push(v);

            for e in g.edges(v) {
                let w = if e.target() == v { e.source() } else { e.target() };
                let wi = w.index();
                if w == v || self.settled[wi] {
                    continue;
                }

                let nd = d + f64::from(*e.weight());
                if nd < self.dist[wi] {
                    self.dist[wi] = nd;
                    self.sigma[wi] = self.sigma[vi];
                    self.preds[wi].clear();
                    self.preds[wi].push(v);
                    self.heap.push(Reverse((nd.to_bits(), wi)));
                } else if nd == self.dist[wi] {
                    self.sigma[wi] += self.sigma[vi];
                    self.preds[wi].push(v);
                }
            }
        }
    }

    /// Brandes accumulation; pivot and endpoints score nothing.
    fn accumulate_basic(&mut self, cb: &mut [f64], s: NodeIndex) {
        for &w in self.stack.iter().rev() {
            let wi = w.index();
            let coeff = (1.0 + self.delta[wi]) / self.sigma[wi];
            for &v in &self.preds[wi] {
                self.delta[v.index()] += self.sigma[v.index()] * coeff;
            }
            if w != s {
                cb[wi] += self.delta[wi];
            }
        }
    }

    /// Brandes accumulation counting each path's endpoints.
    fn accumulate_endpoints(&mut self, cb: &mut [f64], s: NodeIndex) {
        cb[s.index()] += (self.stack.len() - 1) as f64;
        for &w in self.stack.iter().rev() {
            let wi = w.index();
            let coeff = (1.0 + self.delta[wi]) / self.sigma[wi];
            for &v in &self.preds[wi] {
                self.delta[v.index()] += self.sigma[v.index()] * coeff;
            }
            if w != s {
                cb[wi] += self.delta[wi] + 1.0;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::EdgeRecord;

    fn make_graph(edges: &[(NodeId, NodeId, f32)]) -> RoadGraph {
        let records: Vec<EdgeRecord> = edges
            .iter()
            .map(|&(a, b, l)| EdgeRecord::new(a, b, l))
            .collect();
        RoadGraph::from_edges(&records)
    }

    fn exact(rg: &RoadGraph) -> CentralityScores {
        betweenness_centrality(rg, &BetweennessConfig::exact()).expect("valid graph")
    }

    fn raw(rg: &RoadGraph) -> CentralityScores {
        let config = BetweennessConfig {
            normalized: false,
            ..BetweennessConfig::exact()
        };
        betweenness_centrality(rg, &config).expect("valid graph")
    }

    #[test]
    fn empty_graph_returns_empty() {
        let bc = exact(&RoadGraph::default());
        assert!(bc.is_empty());
        assert_eq!(bc.pivots_used, 0);
    }

    #[test]
    fn single_edge_zero_betweenness() {
        let bc = exact(&make_graph(&[(1, 2, 1.0)]));
        assert_eq!(bc.get(1), Some(0.0));
        assert_eq!(bc.get(2), Some(0.0));
    }

    #[test]
    fn path_middle_vertex_is_one() {
        // 1 - 2 - 3
        let bc = exact(&make_graph(&[(1, 2, 1.0), (2, 3, 1.0)]));

        assert!((bc.get(1).expect("1") - 0.0).abs() < 1e-12);
        assert!((bc.get(2).expect("2") - 1.0).abs() < 1e-12);
        assert!((bc.get(3).expect("3") - 0.0).abs() < 1e-12);
    }

    #[test]
    fn default_pivots_exceeding_n_is_exact() {
        let rg = make_graph(&[(1, 2, 1.0), (2, 3, 1.0)]);
        let bc = betweenness_centrality(&rg, &BetweennessConfig::default()).expect("valid");
        assert!(!bc.sampled);
        assert_eq!(bc.pivots_used, 3);
        assert!(bc.seed.is_none());
        assert!((bc.get(2).expect("2") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unnormalized_path_counts_each_pair_once() {
        // 1 - 2 - 3 - 4: vertex 2 lies on 1-3 and 1-4.
        let bc = raw(&make_graph(&[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)]));
        assert!((bc.get(2).expect("2") - 2.0).abs() < 1e-12);
        assert!((bc.get(3).expect("3") - 2.0).abs() < 1e-12);
        assert!(bc.get(1).expect("1").abs() < 1e-12);
    }

    #[test]
    fn star_center_carries_all_pairs() {
        // Center 0 with leaves 1..=4: C(4,2) = 6 leaf pairs all cross 0.
        let bc = raw(&make_graph(&[(0, 1, 1.0), (0, 2, 1.0), (0, 3, 1.0), (0, 4, 1.0)]));
        assert!((bc.get(0).expect("0") - 6.0).abs() < 1e-12);
        for leaf in 1..=4 {
            assert!(bc.get(leaf).expect("leaf").abs() < 1e-12);
        }
    }

    #[test]
    fn square_splits_between_equal_routes() {
        // 1 - 2 - 4 and 1 - 3 - 4, all unit lengths.
        let bc = raw(&make_graph(&[(1, 2, 1.0), (2, 4, 1.0), (1, 3, 1.0), (3, 4, 1.0)]));
        // Each of 2 and 3 carries half of 1-4, and half of 2-3 goes through 1 and 4.
        for id in 1..=4 {
            assert!((bc.get(id).expect("id") - 0.5).abs() < 1e-12, "{id}");
        }
    }

    #[test]
    fn lengths_reroute_shortest_paths() {
        // Direct 1-3 is long; the detour through 2 is shorter.
        let rg = make_graph(&[(1, 3, 10.0), (1, 2, 1.0), (2, 3, 1.0)]);

        let weighted = raw(&rg);
        assert!((weighted.get(2).expect("2") - 1.0).abs() < 1e-12);

        let hops = betweenness_centrality(
            &rg,
            &BetweennessConfig {
                normalized: false,
                weight: EdgeWeight::Hops,
                ..BetweennessConfig::exact()
            },
        )
        .expect("valid");
        assert!(hops.get(2).expect("2").abs() < 1e-12);
    }

    #[test]
    fn self_loop_does_not_change_scores() {
        let plain = raw(&make_graph(&[(1, 2, 1.0), (2, 3, 1.0)]));
        let looped = raw(&make_graph(&[(1, 2, 1.0), (2, 2, 0.0), (2, 3, 1.0)]));
        assert_eq!(plain.scores, looped.scores);
    }

    #[test]
    fn disconnected_components_no_cross_betweenness() {
        let bc = raw(&make_graph(&[(1, 2, 1.0), (3, 4, 1.0)]));
        for id in 1..=4 {
            assert!(bc.get(id).expect("id").abs() < 1e-12);
        }
    }

    #[test]
    fn endpoints_counts_path_ends() {
        // 1 - 2 - 3 with endpoints: 1 ends 2 paths, 2 is on all 3 pairs.
        let config = BetweennessConfig {
            normalized: false,
            endpoints: true,
            ..BetweennessConfig::exact()
        };
        let bc = betweenness_centrality(&make_graph(&[(1, 2, 1.0), (2, 3, 1.0)]), &config)
            .expect("valid");
        assert!((bc.get(1).expect("1") - 2.0).abs() < 1e-12);
        assert!((bc.get(2).expect("2") - 3.0).abs() < 1e-12);
        assert!((bc.get(3).expect("3") - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_pivots_is_rejected() {
        let rg = make_graph(&[(1, 2, 1.0)]);
        let err = betweenness_centrality(&rg, &BetweennessConfig::sampled(0, 1))
            .expect_err("k = 0 must fail");
        assert_eq!(err, EstimateError::ZeroPivots);
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn negative_length_is_rejected_unless_hops() {
        let rg = make_graph(&[(1, 2, -1.0), (2, 3, 1.0)]);
        let err = betweenness_centrality(&rg, &BetweennessConfig::exact()).expect_err("negative");
        assert!(matches!(err, EstimateError::InvalidWeight { .. }));

        let hops = BetweennessConfig {
            weight: EdgeWeight::Hops,
            ..BetweennessConfig::exact()
        };
        assert!(betweenness_centrality(&rg, &hops).is_ok());
    }

    #[test]
    fn sampling_records_seed_and_pivot_count() {
        let rg = make_graph(&[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0), (4, 5, 1.0)]);
        let bc = betweenness_centrality(&rg, &BetweennessConfig::sampled(2, 99)).expect("valid");
        assert!(bc.sampled);
        assert_eq!(bc.pivots_used, 2);
        assert_eq!(bc.seed, Some(99));
        assert_eq!(bc.len(), 5);
    }

    #[test]
    fn unseeded_sampling_reports_drawn_seed() {
        let rg = make_graph(&[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)]);
        let config = BetweennessConfig {
            pivots: Some(2),
            ..BetweennessConfig::default()
        };
        let first = betweenness_centrality(&rg, &config).expect("valid");
        let seed = first.seed.expect("sampled run reports its seed");

        let replay = betweenness_centrality(&rg, &BetweennessConfig::sampled(2, seed))
            .expect("valid");
        assert_eq!(first.scores, replay.scores);
    }

    #[test]
    fn select_pivots_is_distinct_and_in_range() {
        let (picked, seed) = select_pivots(50, Some(20), Some(7));
        assert_eq!(seed, Some(7));
        assert_eq!(picked.len(), 20);
        let mut ids: Vec<usize> = picked.iter().map(|p| p.index()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert!(ids.iter().all(|&i| i < 50));
    }

    #[test]
    fn top_orders_by_score_then_id() {
        let bc = raw(&make_graph(&[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)]));
        let top = bc.top(3);
        assert_eq!(top[0].0, 2);
        assert_eq!(top[1].0, 3);
        assert_eq!(top[2].0, 1);
    }
}
