//! Attractive and repulsive forces (ARF).
//!
//! Every pair of vertices attracts linearly with stiffness 1, raised to
//! `a · w` for adjacent pairs, and repels with strength `d · √n / r²`:
//!
//! ```text
//! Δp_i = dt · Σ_j (p_j − p_i) · (c_ij − d·√n / |p_j − p_i|²)
//! ```
//!
//! Iteration stops once the largest single move falls below `epsilon` or
//! after `max_iterations`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use linemap_core::LineGraph;

use super::{
    Layout, LayoutError, LayoutResult, LayoutWeights, Springs, ensure_finite, scatter, separation,
    validate_weights,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArfLayout {
    pub seed: u64,
    /// Repulsion scale (`d`).
    pub repulsion: f64,
    /// Extra attraction between adjacent vertices (`a`).
    pub adjacent_attraction: f64,
    /// Time step.
    pub dt: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl ArfLayout {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            repulsion: 0.5,
            adjacent_attraction: 10.0,
            dt: 0.001,
            epsilon: 1e-6,
            max_iterations: 1000,
        }
    }

    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Layout for ArfLayout {
    fn name(&self) -> &'static str {
        "arf"
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(
        &self,
        graph: &LineGraph,
        weights: &LayoutWeights<'_>,
    ) -> Result<LayoutResult, LayoutError> {
        validate_weights(graph, weights)?;
        let springs = Springs::from_graph(graph, weights.edge);
        let n = springs.n;
        let root_n = (n as f64).sqrt();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut pos = scatter(&mut rng, n, root_n);

        // Row-major pair stiffness.
        let mut stiffness = vec![1.0; n * n];
        for &(a, b, w) in &springs.edges {
            let c = self.adjacent_attraction * w;
            stiffness[a * n + b] = c;
            stiffness[b * n + a] = c;
        }

        let repulsion = self.repulsion * root_n;
        let mut delta = vec![(0.0_f64, 0.0_f64); n];
        let mut iterations = 0;
        let mut converged = n < 2;

        while !converged && iterations < self.max_iterations {
            iterations += 1;
            delta.iter_mut().for_each(|d| *d = (0.0, 0.0));

            for i in 0..n {
                for j in (i + 1)..n {
                    // (dx, dy) points from j to i.
                    let (dx, dy, r) = separation(pos[i], pos[j], i, j);
                    let m = stiffness[i * n + j] - repulsion / (r * r);
                    delta[i].0 -= m * dx;
                    delta[i].1 -= m * dy;
                    delta[j].0 += m * dx;
                    delta[j].1 += m * dy;
                }
            }

            let mut max_move = 0.0_f64;
            for (p, &(dx, dy)) in pos.iter_mut().zip(&delta) {
                let (mx, my) = (self.dt * dx, self.dt * dy);
                p.x += mx;
                p.y += my;
                max_move = max_move.max(mx.hypot(my));
            }
            ensure_finite(self.name(), &pos, iterations)?;
            converged = max_move < self.epsilon;
        }

        debug!(vertices = n, iterations, converged, "arf layout");
        Ok(LayoutResult {
            positions: pos,
            iterations,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::{demo_graph, distance};
    use linemap_core::compose;

    #[test]
    fn pair_settles_where_forces_balance() {
        let g = compose(&[vec!["A", "B"]]);
        let layout = ArfLayout::new(8).with_max_iterations(20_000);
        let r = layout.compute(&g, &LayoutWeights::none()).unwrap();
        // a = d·√2 / r²
        let expected = (layout.repulsion * 2.0_f64.sqrt() / layout.adjacent_attraction).sqrt();
        let got = distance(r.positions[0], r.positions[1]);
        assert!((got - expected).abs() < 1e-3, "{got} vs {expected}");
        assert!(r.converged);
    }

    #[test]
    fn neighbours_sit_closer_than_strangers() {
        let g = compose(&[vec!["A", "B", "C"]]);
        let r = ArfLayout::new(3)
            .with_max_iterations(20_000)
            .compute(&g, &LayoutWeights::none())
            .unwrap();
        let ab = distance(r.positions[0], r.positions[1]);
        let ac = distance(r.positions[0], r.positions[2]);
        assert!(ab < ac, "{ab} !< {ac}");
    }

    #[test]
    fn demo_graph_stays_finite() {
        let g = demo_graph();
        let counts = g.traverse_counts();
        let r = ArfLayout::new(42)
            .compute(&g, &LayoutWeights::none().with_edge(&counts))
            .unwrap();
        assert!(r.iterations <= 1000);
        assert!(r.positions.iter().all(|p| p.is_finite()));
    }
}
