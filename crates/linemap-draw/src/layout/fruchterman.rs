//! Fruchterman–Reingold force-directed placement.
//!
//! Attraction along an edge is `w · d² / k`, repulsion between every pair is
//! `k² / d`, with natural length `k = 1`. Each vertex moves along its net
//! force by at most the current temperature, which cools linearly from
//! `side / 10` to zero over `max_iterations`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use linemap_core::LineGraph;

use super::{
    Layout, LayoutError, LayoutResult, LayoutWeights, Springs, ensure_finite, scatter, separation,
    validate_weights,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FruchtermanReingold {
    pub seed: u64,
    pub max_iterations: usize,
    /// Stop once no vertex moves farther than this in one iteration.
    pub tolerance: f64,
}

impl FruchtermanReingold {
    pub const K: f64 = 1.0;

    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            max_iterations: 500,
            tolerance: 1e-4,
        }
    }

    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Layout for FruchtermanReingold {
    fn name(&self) -> &'static str {
        "fruchterman-reingold"
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
        let side = (n as f64).sqrt().max(1.0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut pos = scatter(&mut rng, n, side);

        if n < 2 {
            return Ok(LayoutResult {
                positions: pos,
                iterations: 0,
                converged: true,
            });
        }

        let k = Self::K;
        let t0 = side / 10.0;
        let mut disp = vec![(0.0_f64, 0.0_f64); n];
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..self.max_iterations {
            iterations = iter + 1;
            disp.iter_mut().for_each(|d| *d = (0.0, 0.0));

            for i in 0..n {
                for j in (i + 1)..n {
                    let (dx, dy, d) = separation(pos[i], pos[j], i, j);
                    let f = k * k / d;
                    let (fx, fy) = (dx / d * f, dy / d * f);
                    disp[i].0 += fx;
                    disp[i].1 += fy;
                    disp[j].0 -= fx;
                    disp[j].1 -= fy;
                }
            }

            for &(a, b, w) in &springs.edges {
                let (dx, dy, d) = separation(pos[a], pos[b], a, b);
                let f = w * d * d / k;
                let (fx, fy) = (dx / d * f, dy / d * f);
                disp[a].0 -= fx;
                disp[a].1 -= fy;
                disp[b].0 += fx;
                disp[b].1 += fy;
            }

            let temperature = t0 * (1.0 - iter as f64 / self.max_iterations as f64);
            let mut max_move = 0.0_f64;
            for (p, &(dx, dy)) in pos.iter_mut().zip(&disp) {
                let len = dx.hypot(dy);
                if len > 0.0 {
                    let step = len.min(temperature);
                    p.x += dx / len * step;
                    p.y += dy / len * step;
                    max_move = max_move.max(step);
                }
            }

            ensure_finite(self.name(), &pos, iterations)?;
            if max_move < self.tolerance {
                converged = true;
                break;
            }
        }

        debug!(vertices = n, iterations, converged, "fruchterman-reingold layout");
        Ok(LayoutResult {
            positions: pos,
            iterations,
            converged,
        })
    }
}
