#![forbid(unsafe_code)]
//! Layout and rendering for composed line graphs.
//!
//! # Overview
//!
//! ```text
//! LineGraph
//!    ↓  layout::{RandomLayout, SfdpLayout, FruchtermanReingold, ArfLayout}
//! LayoutResult (one Point per vertex)
//!    ↓  scale::prop_to_size / color::Colormap     (visual encodings)
//!    ↓  render::render()                          (.svg / .dot file)
//! ```
//!
//! [`gallery::render_gallery`] chains all of the above into a fixed series of
//! comparison images.

pub mod color;
pub mod gallery;
pub mod layout;
pub mod render;
pub mod scale;

pub use color::{Colormap, Rgba};
pub use gallery::{GalleryError, GallerySettings, RenderedFile, render_gallery};
pub use layout::{Layout, LayoutError, LayoutKind, LayoutResult, LayoutWeights, Point};
pub use render::{Canvas, Encoding, Fill, OutputFormat, RenderError, VisualEncoding, render};
pub use scale::{SizeScale, prop_to_size};
