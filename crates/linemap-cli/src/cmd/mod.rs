pub mod analyze;
pub mod completions;
pub mod export;
pub mod render;
pub mod support;
