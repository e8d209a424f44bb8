//! Edge weighting policies.
//!
//! Both policies produce non-negative integer weights, one per edge, aligned
//! with `EdgeIndex::index()`:
//!
//! | policy     | weight                                   |
//! |------------|------------------------------------------|
//! | `raw`      | `traverse_count`                         |
//! | `inverted` | `max_traverse_count - traverse_count`    |
//!
//! Under `inverted`, the busiest edge(s) weigh zero.

use linemap_core::{LineGraph, WeightPolicy};
use tracing::instrument;

/// Compute one path weight per edge under `policy`.
#[must_use]
#[instrument(skip(graph))]
pub fn edge_weights(graph: &LineGraph, policy: WeightPolicy) -> Vec<u64> {
    let max = graph.max_traverse_count();
    graph
        .graph
        .edge_weights()
        .map(|e| match policy {
            WeightPolicy::Raw => e.traverse_count,
            WeightPolicy::Inverted => max.saturating_sub(e.traverse_count),
        })
        .collect()
}
