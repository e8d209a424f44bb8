//! A fixed series of comparison images.
//!
//! Each step changes one thing relative to the previous one, so flipping
//! through the files shows what each encoding or layout contributes:
//!
//! | file                     | change                                        |
//! |--------------------------|-----------------------------------------------|
//! | `1-1-random-simplest`    | random layout, default look, default canvas  |
//! | `1-2-random-constant`    | fixed canvas, max vertex size and pen width   |
//! | `1-3-random-size`        | size by visit count, pen width by traversals  |
//! | `1-4-random-color`       | fill by visit count                           |
//! | `1-5-random-closeness`   | size and fill by closeness (not carried on)   |
//! | `2-1-sfdp`               | sfdp layout                                   |
//! | `2-1-sfdp-edge-weight`   | sfdp weighted by traversals                   |
//! | `2-2-sfdp-both-weight`   | sfdp weighted by traversals and visits        |
//! | `3-1-fp`                 | Fruchterman–Reingold                          |
//! | `3-2-fp-edge-weight`     | Fruchterman–Reingold weighted by traversals   |
//! | `4-1-arf`                | ARF                                           |
//! | `4-2-arf-edge-weight`    | ARF weighted by traversals                    |
//!
//! The five `1-x` images share one set of seeded random positions. The
//! "random" in their names is literal here; they are not an sfdp layout
//! drawn without explicit positions.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use linemap_core::LineGraph;
use linemap_core::config::RenderConfig;

use crate::layout::{
    ArfLayout, FruchtermanReingold, Layout, LayoutError, LayoutKind, LayoutResult, LayoutWeights,
    RandomLayout, SfdpLayout,
};
use crate::render::{Canvas, Encoding, Fill, OutputFormat, RenderError, VisualEncoding, render};
use crate::scale::prop_to_size;

/// Names of the gallery files, in rendering order (without extension).
pub const GALLERY_NAMES: [&str; 12] = [
    "1-1-random-simplest",
    "1-2-random-constant",
    "1-3-random-size",
    "1-4-random-color",
    "1-5-random-closeness",
    "2-1-sfdp",
    "2-1-sfdp-edge-weight",
    "2-2-sfdp-both-weight",
    "3-1-fp",
    "3-2-fp-edge-weight",
    "4-1-arf",
    "4-2-arf-edge-weight",
];

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("unknown output format '{0}' (expected svg or dot)")]
    UnknownFormat(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Sizes and options shared by every gallery image.
#[derive(Debug, Clone, PartialEq)]
pub struct GallerySettings {
    pub output_size: u32,
    pub vertex_size_max: f64,
    pub vertex_size_min: f64,
    pub edge_width_max: f64,
    pub edge_width_min: f64,
    pub seed: u64,
    pub format: OutputFormat,
    pub labels: bool,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            output_size: 400,
            vertex_size_max: 20.0,
            vertex_size_min: 10.0,
            edge_width_max: 5.0,
            edge_width_min: 2.5,
            seed: 42,
            format: OutputFormat::Svg,
            labels: true,
        }
    }
}

impl TryFrom<&RenderConfig> for GallerySettings {
    type Error = GalleryError;

    fn try_from(config: &RenderConfig) -> Result<Self, Self::Error> {
        let format = match config.format.trim().to_ascii_lowercase().as_str() {
            "svg" => OutputFormat::Svg,
            "dot" | "gv" => OutputFormat::Dot,
            other => return Err(GalleryError::UnknownFormat(other.to_string())),
        };
        Ok(Self {
            output_size: config.output_size,
            vertex_size_max: config.vertex_size_max,
            vertex_size_min: config.vertex_size_min,
            edge_width_max: config.edge_width_max,
            edge_width_min: config.edge_width_min,
            seed: config.seed,
            format,
            labels: true,
        })
    }
}

/// One written gallery image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFile {
    pub name: String,
    pub path: PathBuf,
    pub layout: String,
    pub iterations: usize,
    pub converged: bool,
}

/// Lay out and render every gallery image into `out_dir`.
///
/// `graph` should already carry closeness scores. `out_dir` must exist.
///
/// # Errors
///
/// Returns the first [`LayoutError`] or [`RenderError`] encountered; files
/// written before the failure are left in place.
#[instrument(
    skip(graph, settings, out_dir),
    fields(vertices = graph.vertex_count(), out_dir = %out_dir.display())
)]
pub fn render_gallery(
    graph: &LineGraph,
    settings: &GallerySettings,
    out_dir: &Path,
) -> Result<Vec<RenderedFile>, GalleryError> {
    let mut written = Vec::with_capacity(GALLERY_NAMES.len());
    let mut emit = |name: &str,
                    kind: LayoutKind,
                    layout: &LayoutResult,
                    encoding: &VisualEncoding,
                    canvas: Canvas|
     -> Result<(), GalleryError> {
        let path = out_dir.join(format!("{name}.{}", settings.format.extension()));
        render(graph, &layout.positions, encoding, &path, canvas)?;
        if !layout.converged {
            warn!(
                image = name,
                layout = %kind,
                iterations = layout.iterations,
                "layout did not converge"
            );
        }
        info!(image = name, path = %path.display(), "wrote gallery image");
        written.push(RenderedFile {
            name: name.to_string(),
            path,
            layout: kind.to_string(),
            iterations: layout.iterations,
            converged: layout.converged,
        });
        Ok(())
    };

    let seed = settings.seed;
    let visits = graph.visit_counts();
    let traversals = graph.traverse_counts();
    let closeness = graph.closeness_scores();
    let none = LayoutWeights::none();
    let by_edge = LayoutWeights::none().with_edge(&traversals);
    let by_both = by_edge.with_vertex(&visits);

    let random = RandomLayout::new(seed).compute(graph, &none)?;

    // 1-1: everything default.
    let mut encoding = VisualEncoding {
        labels: settings.labels,
        ..VisualEncoding::default()
    };
    emit(GALLERY_NAMES[0], LayoutKind::Random, &random, &encoding, Canvas::default())?;

    // 1-2: fixed canvas and constant sizes.
    let canvas = Canvas::square(settings.output_size);
    encoding.vertex_size = Encoding::Uniform(settings.vertex_size_max);
    encoding.edge_pen_width = Encoding::Uniform(settings.edge_width_max);
    emit(GALLERY_NAMES[1], LayoutKind::Random, &random, &encoding, canvas)?;

    // 1-3: sizes proportional to counts.
    let visit_sizes = prop_to_size(&visits, settings.vertex_size_min, settings.vertex_size_max);
    let traversal_widths =
        prop_to_size(&traversals, settings.edge_width_min, settings.edge_width_max);
    encoding.vertex_size = Encoding::PerItem(visit_sizes.clone());
    encoding.edge_pen_width = Encoding::PerItem(traversal_widths);
    emit(GALLERY_NAMES[2], LayoutKind::Random, &random, &encoding, canvas)?;

    // 1-4: fill follows size.
    encoding.vertex_fill = Fill::Mapped(visit_sizes);
    emit(GALLERY_NAMES[3], LayoutKind::Random, &random, &encoding, canvas)?;

    // 1-5: closeness instead of visits, on a copy.
    let closeness_sizes =
        prop_to_size(&closeness, settings.vertex_size_min, settings.vertex_size_max);
    let by_closeness = VisualEncoding {
        vertex_size: Encoding::PerItem(closeness_sizes.clone()),
        vertex_fill: Fill::Mapped(closeness_sizes),
        ..encoding.clone()
    };
    emit(GALLERY_NAMES[4], LayoutKind::Random, &random, &by_closeness, canvas)?;

    // 2-x .. 4-x: same encoding as 1-4, different layouts.
    let sfdp = SfdpLayout::new(seed);
    let fr = FruchtermanReingold::new(seed);
    let arf = ArfLayout::new(seed);
    let runs: [(&str, LayoutKind, &dyn Layout, &LayoutWeights<'_>); 7] = [
        (GALLERY_NAMES[5], LayoutKind::Sfdp, &sfdp, &none),
        (GALLERY_NAMES[6], LayoutKind::Sfdp, &sfdp, &by_edge),
        (GALLERY_NAMES[7], LayoutKind::Sfdp, &sfdp, &by_both),
        (GALLERY_NAMES[8], LayoutKind::FruchtermanReingold, &fr, &none),
        (GALLERY_NAMES[9], LayoutKind::FruchtermanReingold, &fr, &by_edge),
        (GALLERY_NAMES[10], LayoutKind::Arf, &arf, &none),
        (GALLERY_NAMES[11], LayoutKind::Arf, &arf, &by_edge),
    ];
    for (name, kind, layout, weights) in runs {
        let result = layout.compute(graph, weights)?;
        emit(name, kind, &result, &encoding, canvas)?;
    }

    Ok(written)
}
