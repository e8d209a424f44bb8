//! Multilevel spring-electrical layout.
//!
//! # Model
//!
//! ```text
//! attraction(i, j)  =  w_ij · d² / K                      (along edges)
//! repulsion(i, j)   =  C · m_i · m_j · K^(1+p) / d^p      (all pairs, p = 2)
//! ```
//!
//! `w` are edge weights and `m` vertex weights, both scaled to mean 1.
//!
//! # Levels
//!
//! 1. Coarsen by heavy-edge matching: each unmatched vertex (in seeded random
//!    order) merges with the unmatched neighbour sharing its heaviest edge.
//!    Merged vertices sum their weights; parallel edges sum theirs.
//! 2. Stop when a pass removes less than a quarter of the vertices, the graph
//!    has at most [`SfdpLayout::COARSEST`] vertices, or `max_levels` is hit.
//! 3. Lay out the coarsest graph from a random start, then repeatedly copy each
//!    coarse position to its children (with a small jitter) and refine.
//!
//! Refinement moves every vertex a fixed step along its net force. The step
//! shrinks by `0.9` whenever total energy rises and grows after five
//! consecutive improvements. A level converges once the step falls below
//! `tolerance · K`.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use linemap_core::LineGraph;

use super::{
    Layout, LayoutError, LayoutResult, LayoutWeights, Point, Springs, ensure_finite,
    normalize_mean, scatter, separation, validate_weights,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SfdpLayout {
    pub seed: u64,
    /// Relative strength of repulsion (`C`).
    pub repulsion: f64,
    /// Natural spring length (`K`).
    pub spring_length: f64,
    pub max_levels: usize,
    pub max_iterations_per_level: usize,
    pub tolerance: f64,
}

impl SfdpLayout {
    pub const COARSEST: usize = 4;
    const P: i32 = 2;
    const STEP_DECAY: f64 = 0.9;

    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            repulsion: 0.2,
            spring_length: 1.0,
            max_levels: 10,
            max_iterations_per_level: 300,
            tolerance: 0.01,
        }
    }

    /// Equilibrium distance of a lone pair joined by a unit-weight edge.
    #[must_use]
    pub fn pair_distance(&self) -> f64 {
        self.repulsion.powf(1.0 / 4.0) * self.spring_length
    }
}

impl Layout for SfdpLayout {
    fn name(&self) -> &'static str {
        "sfdp"
    }

    #[instrument(skip_all, fields(vertices = graph.vertex_count(), edges = graph.edge_count()))]
    fn compute(
        &self,
        graph: &LineGraph,
        weights: &LayoutWeights<'_>,
    ) -> Result<LayoutResult, LayoutError> {
        validate_weights(graph, weights)?;
        let springs = Springs::from_graph(graph, weights.edge);
        let mut masses = weights
            .vertex
            .map_or_else(|| vec![1.0; springs.n], <[f64]>::to_vec);
        normalize_mean(masses.iter_mut());
        if masses.iter().all(|m| *m <= 0.0) {
            masses.iter_mut().for_each(|m| *m = 1.0);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);

        // Build the hierarchy, finest first.
        let mut levels = vec![Level {
            n: springs.n,
            edges: springs.edges,
            masses,
        }];
        let mut parents: Vec<Vec<usize>> = Vec::new();
        while levels.len() < self.max_levels.max(1) {
            let Some(current) = levels.last() else { break };
            if current.n <= Self::COARSEST {
                break;
            }
            let Some((coarse, parent)) = current.coarsen(&mut rng) else {
                break;
            };
            parents.push(parent);
            levels.push(coarse);
        }
        debug!(levels = levels.len(), "coarsened");

        let k = self.spring_length;
        let mut iterations = 0;
        let mut converged = true;

        let mut pos = Vec::new();
        for (depth, level) in levels.iter().enumerate().rev() {
            let initial_step = if depth == levels.len() - 1 {
                #[allow(clippy::cast_precision_loss)]
                let side = (level.n as f64).sqrt() * k;
                pos = scatter(&mut rng, level.n, side);
                k
            } else {
                let coarse = std::mem::take(&mut pos);
                pos = parents[depth]
                    .iter()
                    .map(|&p| {
                        let base = coarse[p];
                        Point::new(
                            base.x + rng.gen_range(-0.1..0.1) * k,
                            base.y + rng.gen_range(-0.1..0.1) * k,
                        )
                    })
                    .collect();
                0.2 * k
            };

            let (used, done) = self.refine(&mut pos, level, initial_step, iterations)?;
            iterations += used;
            converged = done;
        }

        debug!(iterations, converged, "sfdp layout");
        Ok(LayoutResult {
            positions: pos,
            iterations,
            converged,
        })
    }
}

impl SfdpLayout {
    fn refine(
        &self,
        pos: &mut [Point],
        level: &Level,
        initial_step: f64,
        iterations_before: usize,
    ) -> Result<(usize, bool), LayoutError> {
        let k = self.spring_length;
        let repulsion_scale = self.repulsion * k.powi(1 + Self::P);
        let mut step = initial_step;
        let mut previous_energy = f64::INFINITY;
        let mut progress = 0;
        let mut force = vec![(0.0_f64, 0.0_f64); level.n];

        for iter in 0..self.max_iterations_per_level {
            force.iter_mut().for_each(|f| *f = (0.0, 0.0));

            for i in 0..level.n {
                for j in (i + 1)..level.n {
                    let (dx, dy, d) = separation(pos[i], pos[j], i, j);
                    let mag = repulsion_scale * level.masses[i] * level.masses[j] / d.powi(Self::P);
                    let (fx, fy) = (dx / d * mag, dy / d * mag);
                    force[i].0 += fx;
                    force[i].1 += fy;
                    force[j].0 -= fx;
                    force[j].1 -= fy;
                }
            }
            for &(a, b, w) in &level.edges {
                let (dx, dy, d) = separation(pos[a], pos[b], a, b);
                let mag = w * d * d / k;
                let (fx, fy) = (dx / d * mag, dy / d * mag);
                force[a].0 -= fx;
                force[a].1 -= fy;
                force[b].0 += fx;
                force[b].1 += fy;
            }

            let mut energy = 0.0;
            for (p, &(fx, fy)) in pos.iter_mut().zip(&force) {
                let len = fx.hypot(fy);
                energy += len * len;
                if len > 0.0 {
                    p.x += step * fx / len;
                    p.y += step * fy / len;
                }
            }
            ensure_finite(self.name(), pos, iterations_before + iter + 1)?;

            if energy <= 0.0 {
                return Ok((iter + 1, true));
            }
            if energy < previous_energy {
                progress += 1;
                if progress >= 5 {
                    progress = 0;
                    step /= Self::STEP_DECAY;
                }
            } else {
                progress = 0;
                step *= Self::STEP_DECAY;
            }
            previous_energy = energy;

            if step < self.tolerance * k {
                return Ok((iter + 1, true));
            }
        }
        Ok((self.max_iterations_per_level, false))
    }
}

/// One level of the coarsening hierarchy.
#[derive(Debug, Clone)]
struct Level {
    n: usize,
    /// Undirected `(a, b, weight)` with `a < b`.
    edges: Vec<(usize, usize, f64)>,
    masses: Vec<f64>,
}

impl Level {
    /// Heavy-edge matching. Returns the coarse level and, for each vertex of
    /// `self`, the coarse vertex it merged into.
    fn coarsen(&self, rng: &mut StdRng) -> Option<(Self, Vec<usize>)> {
        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.n];
        for &(a, b, w) in &self.edges {
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
        }

        let mut order: Vec<usize> = (0..self.n).collect();
        order.shuffle(rng);

        let mut parent = vec![usize::MAX; self.n];
        let mut coarse_n = 0;
        for v in order {
            if parent[v] != usize::MAX {
                continue;
            }
            let partner = adjacency[v]
                .iter()
                .filter(|(u, _)| parent[*u] == usize::MAX && *u != v)
                .fold(None, |best: Option<(usize, f64)>, &(u, w)| match best {
                    Some((bu, bw)) => match bw.total_cmp(&w) {
                        Ordering::Greater => Some((bu, bw)),
                        Ordering::Equal if bu < u => Some((bu, bw)),
                        _ => Some((u, w)),
                    },
                    None => Some((u, w)),
                });
            parent[v] = coarse_n;
            if let Some((u, _)) = partner {
                parent[u] = coarse_n;
            }
            coarse_n += 1;
        }

        #[allow(clippy::cast_precision_loss)]
        if coarse_n as f64 > 0.75 * self.n as f64 {
            return None;
        }

        let mut masses = vec![0.0; coarse_n];
        for (v, &p) in parent.iter().enumerate() {
            masses[p] += self.masses[v];
        }

        let mut merged: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges: Vec<(usize, usize, f64)> = Vec::new();
        for &(a, b, w) in &self.edges {
            let (pa, pb) = (parent[a], parent[b]);
            if pa == pb {
                continue;
            }
            let key = (pa.min(pb), pa.max(pb));
            match merged.get(&key) {
                Some(&slot) => edges[slot].2 += w,
                None => {
                    merged.insert(key, edges.len());
                    edges.push((key.0, key.1, w));
                }
            }
        }

        Some((
            Self {
                n: coarse_n,
                edges,
                masses,
            },
            parent,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::{demo_graph, distance};
    use linemap_core::compose;

    #[test]
    fn pair_settles_at_equilibrium_distance() {
        let g = compose(&[vec!["A", "B"]]);
        let layout = SfdpLayout::new(4);
        let r = layout.compute(&g, &LayoutWeights::none()).unwrap();
        let d = distance(r.positions[0], r.positions[1]);
        assert!((d - layout.pair_distance()).abs() < 0.05, "d = {d}");
        assert!(r.converged);
    }

    #[test]
    fn heavy_vertex_pushes_neighbours_away() {
        let g = compose(&[vec!["A", "B", "C"]]);
        let masses = [1.0, 1.0, 10.0];
        let r = SfdpLayout::new(2)
            .compute(&g, &LayoutWeights::none().with_vertex(&masses))
            .unwrap();
        let ab = distance(r.positions[0], r.positions[1]);
        let bc = distance(r.positions[1], r.positions[2]);
        assert!(bc > ab, "{bc} !> {ab}");
    }

    #[test]
    fn coarsening_matches_heaviest_neighbour() {
        let level = Level {
            n: 4,
            edges: vec![(0, 1, 5.0), (1, 2, 1.0), (2, 3, 5.0)],
            masses: vec![1.0; 4],
        };
        let mut rng = StdRng::seed_from_u64(0);
        let (coarse, parent) = level.coarsen(&mut rng).unwrap();
        assert_eq!(coarse.n, 2);
        assert_eq!(parent[0], parent[1]);
        assert_eq!(parent[2], parent[3]);
        assert_eq!(coarse.masses, vec![2.0, 2.0]);
        assert_eq!(coarse.edges.len(), 1);
        assert!((coarse.edges[0].2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn edgeless_graph_does_not_coarsen() {
        let level = Level {
            n: 6,
            edges: Vec::new(),
            masses: vec![1.0; 6],
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(level.coarsen(&mut rng).is_none());
    }

    #[test]
    fn demo_graph_converges_with_both_weights() {
        let g = demo_graph();
        let counts = g.traverse_counts();
        let visits = g.visit_counts();
        let r = SfdpLayout::new(42)
            .compute(
                &g,
                &LayoutWeights::none().with_edge(&counts).with_vertex(&visits),
            )
            .unwrap();
        assert_eq!(r.positions.len(), 17);
        assert!(r.iterations > 0);
    }
}
