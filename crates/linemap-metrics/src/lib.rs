#![forbid(unsafe_code)]
//! Centrality metrics for composed line graphs.
//!
//! # Overview
//!
//! - **Edge weighting** (`weight`): turns traversal counts into path weights
//!   under a caller-chosen [`WeightPolicy`](linemap_core::WeightPolicy).
//! - **Closeness** (`closeness`): Dijkstra-based closeness centrality with
//!   the non-finite → 0.0 sanitization contract.
//!
//! ```rust,ignore
//! use linemap_core::{compose, WeightPolicy};
//! use linemap_metrics::closeness::{annotate_closeness, ClosenessOptions};
//!
//! let mut g = compose(&lines);
//! annotate_closeness(&mut g, WeightPolicy::Inverted, &ClosenessOptions::default())?;
//! ```

pub mod closeness;
pub mod weight;

pub use closeness::{
    ClosenessError, ClosenessOptions, annotate_closeness, closeness_centrality, sanitize_non_finite,
};
pub use weight::edge_weights;
