#![forbid(unsafe_code)]
//! linemap-core library.
//!
//! Builds a deduplicated, count-annotated directed graph from ordered token
//! sequences ("lines" of named stops, or per-user visit histories) and
//! produces ranked listings from it.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at API seams, `anyhow::Result` for
//!   config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//!
//! ## Pipeline
//!
//! ```text
//! Vec<Vec<String>>                 (input::load_sequences / input::demo_lines)
//!        ↓  compose::compose()
//! LineGraph                        (visit_count / traverse_count annotated)
//!        ↓  linemap-metrics::annotate_closeness()
//! LineGraph                        (closeness attached)
//!        ↓  report::top_n()
//! Vec<Ranked>
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod report;

pub use compose::compose;
pub use config::{LinemapConfig, WeightPolicy};
pub use model::{Edge, EdgeView, LineGraph, Vertex};
pub use report::{Metric, MetricValue, Ranked, top_n};
