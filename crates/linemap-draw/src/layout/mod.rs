//! Graph layout algorithms.
//!
//! # Overview
//!
//! Every algorithm implements [`Layout`] and is interchangeable: callers pick
//! one (directly or through [`LayoutKind`]) and receive one [`Point`] per
//! vertex, aligned with node indices.
//!
//! | kind                    | module         | notes                                   |
//! |-------------------------|----------------|-----------------------------------------|
//! | `random`                | `random`       | uniform scatter, no forces              |
//! | `sfdp`                  | `sfdp`         | multilevel spring-electrical            |
//! | `fruchterman-reingold`  | `fruchterman`  | classic FR with linear cooling          |
//! | `arf`                   | `arf`          | attractive/repulsive forces             |
//!
//! Edge direction is ignored by every force model. Self-loops exert no force.
//!
//! # Determinism
//!
//! All randomness comes from a `StdRng` seeded by the caller, so the same
//! graph, options and seed always yield the same positions.
//!
//! # Failure
//!
//! Running out of iterations is reported through
//! [`LayoutResult::converged`], not as an error. Non-finite coordinates are
//! [`LayoutError::Diverged`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use linemap_core::LineGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

pub mod arf;
pub mod fruchterman;
pub mod random;
pub mod sfdp;

pub use arf::ArfLayout;
pub use fruchterman::FruchtermanReingold;
pub use random::RandomLayout;
pub use sfdp::SfdpLayout;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A 2-D position in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Output of a layout run.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    /// One position per vertex, aligned with node indices.
    pub positions: Vec<Point>,
    /// Iterations performed (summed over levels for multilevel layouts).
    pub iterations: usize,
    /// Whether the movement threshold was reached before the iteration cap.
    pub converged: bool,
}

/// Optional per-edge and per-vertex weights.
///
/// Edge weights scale attraction along an edge; vertex weights scale
/// repulsion (used by [`SfdpLayout`] only).
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutWeights<'a> {
    pub edge: Option<&'a [f64]>,
    pub vertex: Option<&'a [f64]>,
}

impl<'a> LayoutWeights<'a> {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            edge: None,
            vertex: None,
        }
    }

    #[must_use]
    pub const fn with_edge(mut self, edge: &'a [f64]) -> Self {
        self.edge = Some(edge);
        self
    }

    #[must_use]
    pub const fn with_vertex(mut self, vertex: &'a [f64]) -> Self {
        self.vertex = Some(vertex);
        self
    }
}

/// Errors returned by layout algorithms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// A weight slice did not match the vertex or edge count.
    #[error("expected {expected} {what} weights, got {actual}")]
    WeightLengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A weight was negative or non-finite.
    #[error("{what} weight {value} at index {index} is not a finite non-negative number")]
    InvalidWeight {
        what: &'static str,
        index: usize,
        value: f64,
    },

    /// The simulation produced non-finite coordinates.
    #[error("{algorithm} layout diverged at iteration {iteration}")]
    Diverged {
        algorithm: &'static str,
        iteration: usize,
    },
}

/// A layout algorithm.
pub trait Layout {
    /// Short stable name used in logs and file names.
    fn name(&self) -> &'static str;

    /// Compute one position per vertex.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] for mismatched weights or numerical divergence.
    fn compute(
        &self,
        graph: &LineGraph,
        weights: &LayoutWeights<'_>,
    ) -> Result<LayoutResult, LayoutError>;
}

// ---------------------------------------------------------------------------
// LayoutKind
// ---------------------------------------------------------------------------

/// Caller-facing selector for the built-in algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    Random,
    Sfdp,
    FruchtermanReingold,
    Arf,
}

impl LayoutKind {
    pub const ALL: [Self; 4] = [
        Self::Random,
        Self::Sfdp,
        Self::FruchtermanReingold,
        Self::Arf,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Sfdp => "sfdp",
            Self::FruchtermanReingold => "fruchterman-reingold",
            Self::Arf => "arf",
        }
    }

    /// Build the algorithm with default parameters and `seed`.
    #[must_use]
    pub fn build(self, seed: u64) -> Box<dyn Layout> {
        match self {
            Self::Random => Box::new(RandomLayout::new(seed)),
            Self::Sfdp => Box::new(SfdpLayout::new(seed)),
            Self::FruchtermanReingold => Box::new(FruchtermanReingold::new(seed)),
            Self::Arf => Box::new(ArfLayout::new(seed)),
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "random" => Ok(Self::Random),
            "sfdp" => Ok(Self::Sfdp),
            "fruchterman-reingold" | "fr" | "fp" => Ok(Self::FruchtermanReingold),
            "arf" => Ok(Self::Arf),
            other => Err(format!(
                "unknown layout '{other}' (expected random|sfdp|fruchterman-reingold|arf)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Undirected, deduplicated edge list with summed (normalized) weights.
///
/// Opposite directions `a → b` and `b → a` merge into one spring. Self-loops
/// are dropped. Weights are scaled to mean 1 so every algorithm keeps its
/// natural length scale regardless of absolute counts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Springs {
    pub n: usize,
    pub edges: Vec<(usize, usize, f64)>,
}

impl Springs {
    pub fn from_graph(graph: &LineGraph, edge_weights: Option<&[f64]>) -> Self {
        let mut merged: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges: Vec<(usize, usize, f64)> = Vec::new();

        for e in graph.graph.edge_references() {
            let (a, b) = (e.source().index(), e.target().index());
            if a == b {
                continue;
            }
            let w = edge_weights
                .and_then(|w| w.get(e.id().index()).copied())
                .unwrap_or(1.0);
            let key = (a.min(b), a.max(b));
            match merged.get(&key) {
                Some(&slot) => edges[slot].2 += w,
                None => {
                    merged.insert(key, edges.len());
                    edges.push((key.0, key.1, w));
                }
            }
        }

        normalize_mean(edges.iter_mut().map(|e| &mut e.2));

        Self {
            n: graph.vertex_count(),
            edges,
        }
    }
}

/// Scale values in place so their mean is 1 (no-op when the mean is 0).
#[allow(clippy::cast_precision_loss)]
pub(crate) fn normalize_mean<'a>(values: impl Iterator<Item = &'a mut f64>) {
    let values: Vec<&mut f64> = values.collect();
    if values.is_empty() {
        return;
    }
    let mean = values.iter().map(|v| **v).sum::<f64>() / values.len() as f64;
    if mean > 0.0 {
        for v in values {
            *v /= mean;
        }
    }
}

/// Check weight slices against the graph before any algorithm runs.
pub(crate) fn validate_weights(
    graph: &LineGraph,
    weights: &LayoutWeights<'_>,
) -> Result<(), LayoutError> {
    let checks = [
        ("edge", weights.edge, graph.edge_count()),
        ("vertex", weights.vertex, graph.vertex_count()),
    ];
    for (what, slice, expected) in checks {
        let Some(slice) = slice else { continue };
        if slice.len() != expected {
            return Err(LayoutError::WeightLengthMismatch {
                what,
                expected,
                actual: slice.len(),
            });
        }
        if let Some((index, &value)) = slice
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(LayoutError::InvalidWeight { what, index, value });
        }
    }
    Ok(())
}

/// Fail with [`LayoutError::Diverged`] if any coordinate is non-finite.
pub(crate) fn ensure_finite(
    algorithm: &'static str,
    positions: &[Point],
    iteration: usize,
) -> Result<(), LayoutError> {
    if positions.iter().all(|p| p.is_finite()) {
        Ok(())
    } else {
        Err(LayoutError::Diverged {
            algorithm,
            iteration,
        })
    }
}

/// Displacement from `b` to `a` and its length, never zero.
///
/// Coincident points get a small deterministic offset derived from their
/// indices so forces always have a direction.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn separation(a: Point, b: Point, i: usize, j: usize) -> (f64, f64, f64) {
    let (mut dx, mut dy) = (a.x - b.x, a.y - b.y);
    let mut d = dx.hypot(dy);
    if d < 1e-9 {
        let angle = (i * 31 + j * 17) as f64;
        dx = 1e-3 * angle.cos();
        dy = 1e-3 * angle.sin();
        d = 1e-3;
    }
    (dx, dy, d)
}

/// Uniform random positions in `[0, side)²`.
pub(crate) fn scatter(rng: &mut impl rand::Rng, n: usize, side: f64) -> Vec<Point> {
    let side = if side > 0.0 { side } else { 1.0 };
    (0..n)
        .map(|_| Point::new(rng.gen_range(0.0..side), rng.gen_range(0.0..side)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
