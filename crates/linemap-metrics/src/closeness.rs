//! Closeness centrality over weighted shortest paths.
//!
//! # Definition
//!
//! For a vertex `v`, run Dijkstra along edge direction using the supplied
//! per-edge weights. With `r` vertices reachable from `v` (including `v`)
//! and `s` the sum of distances to the other `r - 1`:
//!
//! ```text
//! closeness(v) = 1 / s                 (normalized = false)
//! closeness(v) = (r - 1) / s           (normalized = true)
//! ```
//!
//! Only reachable vertices contribute, so each weakly connected piece is
//! scored on its own terms.
//!
//! # Non-finite scores
//!
//! A sink (nothing reachable) gives `0 / 0`; a vertex whose reachable set is
//! all at distance zero (possible under the inverted policy) gives `x / 0`.
//! [`closeness_centrality`] returns those raw values; [`sanitize_non_finite`]
//! maps every NaN/∞ to exactly `0.0`. [`annotate_closeness`] always does
//! both before attaching scores to the graph.

use petgraph::{algo::dijkstra, visit::EdgeRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use linemap_core::model::GraphError;
use linemap_core::{LineGraph, WeightPolicy};

use crate::weight::edge_weights;

/// Options for closeness computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosenessOptions {
    /// Scale by the number of reachable vertices minus one.
    /// Default: `true`.
    pub normalized: bool,
}

impl Default for ClosenessOptions {
    fn default() -> Self {
        Self { normalized: true }
    }
}

/// Errors from closeness computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClosenessError {
    /// The weight slice does not have one entry per edge.
    #[error("expected {expected} edge weights, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },

    /// The scores could not be attached to the graph.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Compute raw closeness for every vertex, aligned with node indices.
///
/// Scores may be non-finite; see the module docs.
///
/// # Errors
///
/// Returns [`ClosenessError::WeightCountMismatch`] if `weights` does not have
/// exactly one entry per edge.
#[instrument(skip(graph, weights))]
pub fn closeness_centrality(
    graph: &LineGraph,
    weights: &[u64],
    options: &ClosenessOptions,
) -> Result<Vec<f64>, ClosenessError> {
    let g = &graph.graph;
    if weights.len() != g.edge_count() {
        return Err(ClosenessError::WeightCountMismatch {
            expected: g.edge_count(),
            actual: weights.len(),
        });
    }

    let scores = g
        .node_indices()
        .map(|source| {
            let dist = dijkstra(g, source, None, |e| weights[e.id().index()]);
            let reachable = dist.len();
            let total: u64 = dist.values().sum();
            score(reachable, total, options.normalized)
        })
        .collect();

    Ok(scores)
}

#[allow(clippy::cast_precision_loss)]
fn score(reachable: usize, total: u64, normalized: bool) -> f64 {
    let inverse = 1.0 / total as f64;
    if normalized {
        inverse * reachable.saturating_sub(1) as f64
    } else {
        inverse
    }
}

/// Replace every non-finite score with `0.0`. Returns how many were replaced.
pub fn sanitize_non_finite(scores: &mut [f64]) -> usize {
    let mut replaced = 0;
    for s in scores.iter_mut().filter(|s| !s.is_finite()) {
        *s = 0.0;
        replaced += 1;
    }
    replaced
}

/// Compute, sanitize and attach closeness to every vertex of `graph`.
///
/// Returns the number of scores that were non-finite before sanitization.
///
/// # Errors
///
/// Returns a [`ClosenessError`] if the weights or scores do not line up with
/// the graph. Nothing is attached in that case.
#[instrument(skip(graph))]
pub fn annotate_closeness(
    graph: &mut LineGraph,
    policy: WeightPolicy,
    options: &ClosenessOptions,
) -> Result<usize, ClosenessError> {
    let weights = edge_weights(graph, policy);
    let mut scores = closeness_centrality(graph, &weights, options)?;
    let sanitized = attach_sanitized(graph, &mut scores)?;
    debug!(
        vertices = graph.vertex_count(),
        sanitized,
        %policy,
        "attached closeness"
    );
    Ok(sanitized)
}

fn attach_sanitized(graph: &mut LineGraph, scores: &mut [f64]) -> Result<usize, ClosenessError> {
    let sanitized = sanitize_non_finite(scores);
    graph.attach_closeness(scores)?;
    Ok(sanitized)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
