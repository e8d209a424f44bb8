//! Uniform random placement.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use linemap_core::LineGraph;

use super::{Layout, LayoutError, LayoutResult, LayoutWeights, scatter, validate_weights};

/// Scatter vertices uniformly over a `side × side` square.
///
/// `side` defaults to `√n`, keeping density constant as graphs grow.
/// Weights are validated but otherwise ignored. The result always reports
/// `converged = true` with zero iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomLayout {
    pub seed: u64,
    pub side: Option<f64>,
}

impl RandomLayout {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed, side: None }
    }

    #[must_use]
    pub const fn with_side(mut self, side: f64) -> Self {
        self.side = Some(side);
        self
    }
}

impl Layout for RandomLayout {
    fn name(&self) -> &'static str {
        "random"
    }

    fn compute(
        &self,
        graph: &LineGraph,
        weights: &LayoutWeights<'_>,
    ) -> Result<LayoutResult, LayoutError> {
        validate_weights(graph, weights)?;
        let n = graph.vertex_count();
        #[allow(clippy::cast_precision_loss)]
        let side = self.side.unwrap_or_else(|| (n as f64).sqrt());
        let mut rng = StdRng::seed_from_u64(self.seed);
        let positions = scatter(&mut rng, n, side);
        debug!(vertices = positions.len(), seed = self.seed, "random layout");
        Ok(LayoutResult {
            positions,
            iterations: 0,
            converged: true,
        })
    }
}
