//! Ranked listings over a composed [`LineGraph`].
//!
//! Rankings are descending by the chosen metric. Ties keep creation
//! (first-occurrence) order because the sort is stable. Ranks are 1-based.
//! Asking for more entries than exist returns every entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::model::LineGraph;

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// Per-vertex metric a ranking is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    VisitCount,
    Closeness,
}

impl Metric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VisitCount => "visit_count",
            Self::Closeness => "closeness",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "visit_count" | "count" | "visits" => Ok(Self::VisitCount),
            "closeness" => Ok(Self::Closeness),
            other => Err(format!("unknown metric '{other}' (expected visit_count|closeness)")),
        }
    }
}

/// A metric value: exact for counts, floating for closeness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Score(f64),
}

impl MetricValue {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Count(c) => c as f64,
            Self::Score(s) => s,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(c) => write!(f, "{c}"),
            Self::Score(s) => write!(f, "{s:.6}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// One row of a vertex ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub rank: usize,
    pub token: String,
    pub value: MetricValue,
}

/// One row of an edge ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEdge {
    pub rank: usize,
    pub source: String,
    pub target: String,
    pub traverse_count: u64,
}

/// Return the top `n` vertices by `metric`, descending, with 1-based ranks.
#[must_use]
#[instrument(skip(graph))]
pub fn top_n(graph: &LineGraph, metric: Metric, n: usize) -> Vec<Ranked> {
    let mut rows: Vec<(&str, MetricValue)> = graph
        .vertices()
        .map(|v| {
            let value = match metric {
                Metric::VisitCount => MetricValue::Count(v.visit_count),
                Metric::Closeness => MetricValue::Score(v.closeness),
            };
            (v.token.as_str(), value)
        })
        .collect();

    // Stable: equal values keep creation order.
    rows.sort_by(|a, b| match (a.1, b.1) {
        (MetricValue::Count(x), MetricValue::Count(y)) => y.cmp(&x),
        (x, y) => y.as_f64().total_cmp(&x.as_f64()),
    });

    rows.into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (token, value))| Ranked {
            rank: i + 1,
            token: token.to_string(),
            value,
        })
        .collect()
}

/// Return the top `n` edges by traversal count, descending, with 1-based ranks.
#[must_use]
pub fn top_edges(graph: &LineGraph, n: usize) -> Vec<RankedEdge> {
    let mut edges: Vec<_> = graph.edges().collect();
    edges.sort_by(|a, b| b.traverse_count.cmp(&a.traverse_count));
    edges
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, e)| RankedEdge {
            rank: i + 1,
            source: e.source.to_string(),
            target: e.target.to_string(),
            traverse_count: e.traverse_count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Headline numbers for a composed graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub vertex_count: usize,
    pub edge_count: usize,
    /// Sum of all visit counts (= total tokens in the batch).
    pub total_visits: u64,
    /// Sum of all traversal counts (= total consecutive pairs in the batch).
    pub total_traversals: u64,
    pub max_visit_count: u64,
    pub max_traverse_count: u64,
    pub content_hash: String,
}

impl GraphSummary {
    #[must_use]
    pub fn from_graph(graph: &LineGraph) -> Self {
        Self {
            vertex_count: graph.vertex_count(),
            edge_count: graph.edge_count(),
            total_visits: graph.vertices().map(|v| v.visit_count).sum(),
            total_traversals: graph.edges().map(|e| e.traverse_count).sum(),
            max_visit_count: graph.vertices().map(|v| v.visit_count).max().unwrap_or(0),
            max_traverse_count: graph.max_traverse_count(),
            content_hash: graph.content_hash.clone(),
        }
    }
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "directed graph with {} vertices and {} edges",
            self.vertex_count, self.edge_count
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose;

    fn sample() -> LineGraph {
        let batch: Vec<Vec<&str>> = vec![vec!["A", "B", "C"], vec!["A", "B", "C"], vec!["B", "D"]];
        compose(&batch)
    }

    #[test]
    fn top_by_visit_count_is_descending_and_ranked() {
        let rows = top_n(&sample(), Metric::VisitCount, 10);
        let tokens: Vec<&str> = rows.iter().map(|r| r.token.as_str()).collect();
        // A and C tie at 2; A was created first.
        assert_eq!(tokens, ["B", "A", "C", "D"]);
        let ranks: Vec<usize> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 2, 3, 4]);
        assert_eq!(rows[0].value, MetricValue::Count(3));
    }

    #[test]
    fn top_n_truncates() {
        let rows = top_n(&sample(), Metric::VisitCount, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].token, "A");
    }

    #[test]
    fn top_zero_is_empty() {
        assert!(top_n(&sample(), Metric::VisitCount, 0).is_empty());
    }

    #[test]
    fn empty_graph_yields_empty_ranking() {
        let g = LineGraph::default();
        assert!(top_n(&g, Metric::VisitCount, 5).is_empty());
        assert!(top_n(&g, Metric::Closeness, 5).is_empty());
        assert!(top_edges(&g, 5).is_empty());
    }

    #[test]
    fn closeness_ranking_uses_attached_scores() {
        let mut g = sample();
        g.attach_closeness(&[0.1, 0.9, 0.0, 0.9]).unwrap();
        let rows = top_n(&g, Metric::Closeness, 3);
        let tokens: Vec<&str> = rows.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, ["B", "D", "A"]);
        assert_eq!(rows[0].value, MetricValue::Score(0.9));
    }

    #[test]
    fn edge_ranking_is_stable() {
        let rows = top_edges(&sample(), 10);
        let pairs: Vec<(&str, &str, u64)> = rows
            .iter()
            .map(|r| (r.source.as_str(), r.target.as_str(), r.traverse_count))
            .collect();
        assert_eq!(pairs, [("A", "B", 2), ("B", "C", 2), ("B", "D", 1)]);
    }

    #[test]
    fn summary_totals() {
        let s = GraphSummary::from_graph(&sample());
        assert_eq!(s.vertex_count, 4);
        assert_eq!(s.edge_count, 3);
        assert_eq!(s.total_visits, 8);
        assert_eq!(s.total_traversals, 5);
        assert_eq!(s.max_visit_count, 3);
        assert_eq!(s.max_traverse_count, 2);
        assert_eq!(s.to_string(), "directed graph with 4 vertices and 3 edges");
    }

    #[test]
    fn metric_parses_aliases() {
        assert_eq!("count".parse::<Metric>(), Ok(Metric::VisitCount));
        assert_eq!("visit-count".parse::<Metric>(), Ok(Metric::VisitCount));
        assert_eq!("Closeness".parse::<Metric>(), Ok(Metric::Closeness));
        assert!("pagerank".parse::<Metric>().is_err());
    }

    #[test]
    fn metric_value_display() {
        assert_eq!(MetricValue::Count(7).to_string(), "7");
        assert_eq!(MetricValue::Score(0.5).to_string(), "0.500000");
    }
}
