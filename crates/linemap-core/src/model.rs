//! Typed graph model: vertices, edges and the composed [`LineGraph`].
//!
//! # Overview
//!
//! A [`LineGraph`] wraps a petgraph `DiGraph` whose node weights are
//! [`Vertex`] values (one per distinct token) and whose edge weights are
//! [`Edge`] values (one per distinct ordered pair of consecutive tokens).
//! Annotations live in typed fields rather than string-keyed property maps.
//!
//! Node and edge indices follow first-occurrence order in the input batch,
//! so every per-vertex or per-edge vector exposed here is aligned with
//! `NodeIndex::index()` / `EdgeIndex::index()`.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::fmt;

use petgraph::{
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vertex / Edge
// ---------------------------------------------------------------------------

/// One distinct token observed in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// The token this vertex stands for (identity key).
    pub token: String,
    /// Total occurrences of the token across all input sequences.
    pub visit_count: u64,
    /// Closeness centrality. Zero until attached by the metrics crate.
    pub closeness: f64,
}

impl Vertex {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            visit_count: 0,
            closeness: 0.0,
        }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// One distinct ordered pair of consecutive tokens.
///
/// Endpoints are stored by the underlying graph; see [`EdgeView`] for a
/// token-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Edge {
    /// Number of times the pair was traversed across all sequences.
    pub traverse_count: u64,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.traverse_count)
    }
}

/// Borrowed, token-level view of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeView<'a> {
    pub index: usize,
    pub source: &'a str,
    pub target: &'a str,
    pub traverse_count: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised when attaching externally computed annotations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A per-vertex vector did not match the vertex count.
    #[error("expected {expected} per-vertex values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

// ---------------------------------------------------------------------------
// LineGraph
// ---------------------------------------------------------------------------

/// A directed graph composed from token sequences.
///
/// Built once by [`crate::compose::compose`]; afterwards only closeness
/// values may change.
#[derive(Debug, Clone)]
pub struct LineGraph {
    /// Directed graph: nodes = tokens, edges = consecutive pairs.
    pub graph: DiGraph<Vertex, Edge>,
    /// Mapping from token to petgraph `NodeIndex`.
    pub token_map: HashMap<String, NodeIndex>,
    /// BLAKE3 hash over vertices and edges (tokens and counts, in index order).
    pub content_hash: String,
}

impl Default for LineGraph {
    fn default() -> Self {
        Self::from_parts(DiGraph::new(), HashMap::new())
    }
}

impl LineGraph {
    /// Assemble a graph from its parts and compute the content hash.
    #[must_use]
    pub fn from_parts(graph: DiGraph<Vertex, Edge>, token_map: HashMap<String, NodeIndex>) -> Self {
        let content_hash = compute_content_hash(&graph);
        Self {
            graph,
            token_map,
            content_hash,
        }
    }

    /// Return the number of vertices (distinct tokens).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of edges (distinct ordered pairs).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Return `true` if the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up the `NodeIndex` for a token.
    #[must_use]
    pub fn node_index(&self, token: &str) -> Option<NodeIndex> {
        self.token_map.get(token).copied()
    }

    /// Look up a vertex by token.
    #[must_use]
    pub fn vertex(&self, token: &str) -> Option<&Vertex> {
        self.node_index(token)
            .and_then(|idx| self.graph.node_weight(idx))
    }

    /// Iterate vertices in creation (first-occurrence) order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_weights()
    }

    /// Iterate edges in creation order as token-level views.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.graph.edge_references().map(|e| EdgeView {
            index: e.id().index(),
            source: self.graph[e.source()].token.as_str(),
            target: self.graph[e.target()].token.as_str(),
            traverse_count: e.weight().traverse_count,
        })
    }

    /// Return the edge index for the ordered pair `(source, target)`.
    #[must_use]
    pub fn edge_index(&self, source: &str, target: &str) -> Option<EdgeIndex> {
        let a = self.node_index(source)?;
        let b = self.node_index(target)?;
        self.graph.find_edge(a, b)
    }

    /// Return the traversal count of the ordered pair `(source, target)`.
    #[must_use]
    pub fn traverse_count(&self, source: &str, target: &str) -> Option<u64> {
        self.edge_index(source, target)
            .and_then(|e| self.graph.edge_weight(e))
            .map(|e| e.traverse_count)
    }

    /// Highest traversal count over all edges (0 for an edgeless graph).
    #[must_use]
    pub fn max_traverse_count(&self) -> u64 {
        self.graph
            .edge_weights()
            .map(|e| e.traverse_count)
            .max()
            .unwrap_or(0)
    }

    /// Per-vertex visit counts, aligned with node indices.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn visit_counts(&self) -> Vec<f64> {
        self.vertices().map(|v| v.visit_count as f64).collect()
    }

    /// Per-vertex closeness values, aligned with node indices.
    #[must_use]
    pub fn closeness_scores(&self) -> Vec<f64> {
        self.vertices().map(|v| v.closeness).collect()
    }

    /// Per-edge traversal counts, aligned with edge indices.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn traverse_counts(&self) -> Vec<f64> {
        self.graph
            .edge_weights()
            .map(|e| e.traverse_count as f64)
            .collect()
    }

    /// Attach per-vertex closeness values (aligned with node indices).
    ///
    /// Values are stored as given; sanitizing non-finite scores is the
    /// producer's job.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::LengthMismatch`] if `scores` does not have one
    /// entry per vertex.
    pub fn attach_closeness(&mut self, scores: &[f64]) -> Result<(), GraphError> {
        if scores.len() != self.vertex_count() {
            return Err(GraphError::LengthMismatch {
                expected: self.vertex_count(),
                actual: scores.len(),
            });
        }
        for (vertex, &score) in self.graph.node_weights_mut().zip(scores) {
            vertex.closeness = score;
        }
        Ok(())
    }

    /// Owned, serializable snapshot of the annotated graph.
    #[must_use]
    pub fn to_export(&self) -> GraphExport {
        GraphExport {
            content_hash: self.content_hash.clone(),
            vertices: self.vertices().cloned().collect(),
            edges: self
                .edges()
                .map(|e| EdgeRecord {
                    source: e.source.to_string(),
                    target: e.target.to_string(),
                    traverse_count: e.traverse_count,
                })
                .collect(),
        }
    }
}

/// Serializable snapshot of a [`LineGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub content_hash: String,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<EdgeRecord>,
}

/// Owned edge record used in [`GraphExport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub traverse_count: u64,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// BLAKE3 over tokens and counts in index order.
///
/// Closeness is excluded so attaching scores does not change the hash.
fn compute_content_hash(graph: &DiGraph<Vertex, Edge>) -> String {
    let mut hasher = blake3::Hasher::new();
    for v in graph.node_weights() {
        hasher.update(b"v\0");
        hasher.update(v.token.as_bytes());
        hasher.update(b"\0");
        hasher.update(&v.visit_count.to_le_bytes());
    }
    for e in graph.edge_references() {
        hasher.update(b"e\0");
        hasher.update(graph[e.source()].token.as_bytes());
        hasher.update(b"\0");
        hasher.update(graph[e.target()].token.as_bytes());
        hasher.update(b"\0");
        hasher.update(&e.weight().traverse_count.to_le_bytes());
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn two_vertex_graph() -> LineGraph {
        let mut graph = DiGraph::new();
        let mut token_map = HashMap::new();
        let mut a = Vertex::new("A");
        a.visit_count = 2;
        let mut b = Vertex::new("B");
        b.visit_count = 1;
        let ia = graph.add_node(a);
        let ib = graph.add_node(b);
        token_map.insert("A".to_string(), ia);
        token_map.insert("B".to_string(), ib);
        graph.add_edge(ia, ib, Edge { traverse_count: 3 });
        LineGraph::from_parts(graph, token_map)
    }

    #[test]
    fn default_graph_is_empty() {
        let g = LineGraph::default();
        assert!(g.is_empty());
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.max_traverse_count(), 0);
        assert!(g.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn lookups_by_token() {
        let g = two_vertex_graph();
        assert_eq!(g.vertex("A").map(|v| v.visit_count), Some(2));
        assert_eq!(g.traverse_count("A", "B"), Some(3));
        assert_eq!(g.traverse_count("B", "A"), None);
        assert!(g.vertex("Z").is_none());
    }

    #[test]
    fn edge_views_carry_tokens() {
        let g = two_vertex_graph();
        let edges: Vec<_> = g.edges().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "A");
        assert_eq!(edges[0].target, "B");
        assert_eq!(edges[0].traverse_count, 3);
    }

    #[test]
    fn attach_closeness_checks_length() {
        let mut g = two_vertex_graph();
        let err = g.attach_closeness(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            GraphError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        );

        g.attach_closeness(&[0.5, 0.25]).unwrap();
        assert_eq!(g.closeness_scores(), vec![0.5, 0.25]);
    }

    #[test]
    fn content_hash_ignores_closeness() {
        let mut g = two_vertex_graph();
        let before = g.content_hash.clone();
        g.attach_closeness(&[0.5, 0.25]).unwrap();
        let rebuilt = LineGraph::from_parts(g.graph.clone(), g.token_map.clone());
        assert_eq!(rebuilt.content_hash, before);
    }

    #[test]
    fn export_round_trips_through_json() {
        let g = two_vertex_graph();
        let export = g.to_export();
        let json = serde_json::to_string(&export).unwrap();
        let back: GraphExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, export);
        assert_eq!(back.edges[0].traverse_count, 3);
    }
}
