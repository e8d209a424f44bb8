//! Graph composition from ordered token sequences.
//!
//! # Overview
//!
//! Every distinct token becomes exactly one vertex and every distinct ordered
//! pair of consecutive tokens becomes exactly one edge:
//!
//! 1. **Vertex pass**: walk every token of every sequence in input order.
//!    A token seen for the first time gets a vertex with `visit_count = 0`;
//!    each occurrence (the first included) then increments it.
//! 2. **Edge pass**: for each sequence, walk its consecutive pairs and look
//!    up or create the edge for `(vertex[i], vertex[i + 1])`, incrementing
//!    `traverse_count` once per occurrence.
//!
//! Both passes are keyed by hash maps, so petgraph never receives a parallel
//! edge. Creation order follows first occurrence, which makes node/edge
//! indices (and therefore every downstream output) deterministic.
//!
//! ## Example
//!
//! ```text
//! [A B C] [A B C] [B D]
//!        ↓
//! vertices  A:2  B:3  C:2  D:1
//! edges     A→B:2  B→C:2  B→D:1
//! ```

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use tracing::{debug, instrument};

use crate::model::{Edge, LineGraph, Vertex};

/// Compose a [`LineGraph`] from an ordered batch of token sequences.
///
/// Empty sequences contribute nothing; a single-token sequence contributes a
/// vertex but no edge. An empty batch yields an empty graph.
#[must_use]
#[instrument(skip(sequences), fields(sequences = sequences.len()))]
pub fn compose<S, T>(sequences: &[S]) -> LineGraph
where
    S: AsRef<[T]>,
    T: AsRef<str>,
{
    let mut graph = DiGraph::<Vertex, Edge>::new();
    let mut token_map: HashMap<String, NodeIndex> = HashMap::new();

    // Vertex pass.
    for token in sequences.iter().flat_map(|seq| seq.as_ref().iter()) {
        let token = token.as_ref();
        let idx = match token_map.get(token) {
            Some(&idx) => idx,
            None => {
                let idx = graph.add_node(Vertex::new(token));
                token_map.insert(token.to_string(), idx);
                idx
            }
        };
        graph[idx].visit_count += 1;
    }

    // Edge pass.
    let mut pair_map: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();
    for seq in sequences {
        for pair in seq.as_ref().windows(2) {
            let [a, b] = pair else { continue };
            // Every token was registered by the vertex pass.
            let (Some(&ia), Some(&ib)) = (token_map.get(a.as_ref()), token_map.get(b.as_ref()))
            else {
                continue;
            };
            let edge = *pair_map
                .entry((ia, ib))
                .or_insert_with(|| graph.add_edge(ia, ib, Edge::default()));
            graph[edge].traverse_count += 1;
        }
    }

    debug!(
        vertices = graph.node_count(),
        edges = graph.edge_count(),
        "composed line graph"
    );

    LineGraph::from_parts(graph, token_map)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
