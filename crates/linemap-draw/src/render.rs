//! Rendering a laid-out graph to a file.
//!
//! The output format follows the file extension:
//!
//! - `.svg`: standalone vector image. Vertices are circles (diameter = vertex
//!   size), directed edges are lines ending in an arrowhead at the target's
//!   rim, self-loops are small rings above their vertex.
//! - `.dot`: Graphviz source with pinned `pos` attributes, so `neato -n`
//!   reproduces the same picture.
//!
//! Layout coordinates are fitted to the canvas, preserving aspect ratio,
//! with a margin large enough for the biggest vertex.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument};

use linemap_core::{Edge, LineGraph, Vertex};

use crate::color::{Colormap, Rgba};
use crate::layout::Point;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Errors from [`render`] and the string renderers.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unsupported output format for {path} (expected .svg or .dot)")]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("expected {expected} {what} values, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A numeric visual channel: one value for everything, or one per item.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoding {
    Uniform(f64),
    PerItem(Vec<f64>),
}

impl Encoding {
    fn resolve(&self, what: &'static str, n: usize) -> Result<Vec<f64>, RenderError> {
        match self {
            Self::Uniform(v) => Ok(vec![v.max(0.0); n]),
            Self::PerItem(values) if values.len() == n => {
                Ok(values.iter().map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 }).collect())
            }
            Self::PerItem(values) => Err(RenderError::LengthMismatch {
                what,
                expected: n,
                actual: values.len(),
            }),
        }
    }
}

/// Vertex fill: a fixed color, or values mapped through a [`Colormap`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Uniform(Rgba),
    Mapped(Vec<f64>),
}

/// How vertices and edges are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEncoding {
    /// Vertex diameter in pixels.
    pub vertex_size: Encoding,
    pub vertex_fill: Fill,
    /// Edge stroke width in pixels.
    pub edge_pen_width: Encoding,
    /// Draw token labels on vertices.
    pub labels: bool,
    pub colormap: Colormap,
}

impl Default for VisualEncoding {
    fn default() -> Self {
        Self {
            vertex_size: Encoding::Uniform(5.0),
            vertex_fill: Fill::Uniform(Rgba::VERTEX_FILL),
            edge_pen_width: Encoding::Uniform(1.0),
            labels: true,
            colormap: Colormap::default(),
        }
    }
}

/// Output size in pixels (SVG) or points (DOT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    #[must_use]
    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::square(600)
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Dot,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Dot => "dot",
        }
    }

    /// Pick the format from the file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Ok(Self::Svg),
            Some("dot" | "gv") => Ok(Self::Dot),
            _ => Err(RenderError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// Resolved scene
// ---------------------------------------------------------------------------

/// Everything a renderer needs, validated and in canvas coordinates.
struct Scene {
    canvas: Canvas,
    points: Vec<Point>,
    sizes: Vec<f64>,
    fills: Vec<Rgba>,
    widths: Vec<f64>,
}

impl Scene {
    fn build(
        graph: &LineGraph,
        positions: &[Point],
        encoding: &VisualEncoding,
        canvas: Canvas,
    ) -> Result<Self, RenderError> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: canvas.width,
                height: canvas.height,
            });
        }
        let n = graph.vertex_count();
        if positions.len() != n {
            return Err(RenderError::LengthMismatch {
                what: "position",
                expected: n,
                actual: positions.len(),
            });
        }
        let sizes = encoding.vertex_size.resolve("vertex size", n)?;
        let widths = encoding
            .edge_pen_width
            .resolve("edge pen width", graph.edge_count())?;
        let fills = match &encoding.vertex_fill {
            Fill::Uniform(color) => vec![*color; n],
            Fill::Mapped(values) if values.len() == n => encoding.colormap.map_values(values),
            Fill::Mapped(values) => {
                return Err(RenderError::LengthMismatch {
                    what: "vertex fill",
                    expected: n,
                    actual: values.len(),
                });
            }
        };

        let margin = sizes.iter().copied().fold(0.0_f64, f64::max) / 2.0 + 10.0;
        let points = fit(positions, canvas, margin);

        Ok(Self {
            canvas,
            points,
            sizes,
            fills,
            widths,
        })
    }
}

/// Map layout coordinates into the canvas, centred, keeping aspect ratio.
fn fit(positions: &[Point], canvas: Canvas, margin: f64) -> Vec<Point> {
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let (cx, cy) = (w / 2.0, h / 2.0);
    let finite: Vec<Point> = positions.iter().copied().filter(|p| p.is_finite()).collect();
    if finite.is_empty() {
        return vec![Point::new(cx, cy); positions.len()];
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &finite {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let (span_x, span_y) = (max_x - min_x, max_y - min_y);
    let avail_x = (w - 2.0 * margin).max(1.0);
    let avail_y = (h - 2.0 * margin).max(1.0);
    let scale = match (span_x > 0.0, span_y > 0.0) {
        (true, true) => (avail_x / span_x).min(avail_y / span_y),
        (true, false) => avail_x / span_x,
        (false, true) => avail_y / span_y,
        (false, false) => 0.0,
    };
    let (mid_x, mid_y) = (f64::midpoint(min_x, max_x), f64::midpoint(min_y, max_y));

    positions
        .iter()
        .map(|p| {
            if p.is_finite() {
                Point::new(
                    (p.x - mid_x).mul_add(scale, cx),
                    (p.y - mid_y).mul_add(scale, cy),
                )
            } else {
                Point::new(cx, cy)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SVG
// ---------------------------------------------------------------------------

/// Render to an SVG document.
///
/// # Errors
///
/// Returns [`RenderError::InvalidDimensions`] or
/// [`RenderError::LengthMismatch`] for inconsistent inputs.
pub fn render_svg(
    graph: &LineGraph,
    positions: &[Point],
    encoding: &VisualEncoding,
    canvas: Canvas,
) -> Result<String, RenderError> {
    let scene = Scene::build(graph, positions, encoding, canvas)?;
    let Canvas { width, height } = scene.canvas;
    let edge_color = Rgba::EDGE_STROKE;
    let stroke = Rgba::VERTEX_STROKE;

    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(
        out,
        r#"  <defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="4" markerHeight="4" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="{}" fill-opacity="{:.3}"/></marker></defs>"#,
        edge_color.to_hex(),
        edge_color.a
    );
    let _ = writeln!(out, r#"  <rect width="100%" height="100%" fill="white"/>"#);

    let _ = writeln!(
        out,
        r#"  <g class="edges" fill="none" stroke="{}" stroke-opacity="{:.3}">"#,
        edge_color.to_hex(),
        edge_color.a
    );
    for e in graph.graph.edge_references() {
        let (s, t) = (e.source().index(), e.target().index());
        let width = scene.widths[e.id().index()];
        let (ps, pt) = (scene.points[s], scene.points[t]);
        let count = e.weight().traverse_count;

        if s == t {
            let r = scene.sizes[s].max(4.0) / 2.0;
            let _ = writeln!(
                out,
                r#"    <circle cx="{:.2}" cy="{:.2}" r="{r:.2}" stroke-width="{width:.2}"><title>{count}</title></circle>"#,
                ps.x,
                ps.y - r
            );
            continue;
        }

        let (dx, dy) = (pt.x - ps.x, pt.y - ps.y);
        let len = dx.hypot(dy);
        let (ux, uy) = if len > 0.0 { (dx / len, dy / len) } else { (0.0, 0.0) };
        let (rs, rt) = (scene.sizes[s] / 2.0, scene.sizes[t] / 2.0);
        let _ = writeln!(
            out,
            r#"    <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke-width="{width:.2}" marker-end="url(#arrow)"><title>{count}</title></line>"#,
            ux.mul_add(rs, ps.x),
            uy.mul_add(rs, ps.y),
            ux.mul_add(-rt, pt.x),
            uy.mul_add(-rt, pt.y),
        );
    }
    let _ = writeln!(out, "  </g>");

    let _ = writeln!(
        out,
        r#"  <g class="vertices" stroke="{}" stroke-opacity="{:.3}" stroke-width="1">"#,
        stroke.to_hex(),
        stroke.a
    );
    for idx in graph.graph.node_indices() {
        let i = idx.index();
        let (p, fill) = (scene.points[i], scene.fills[i]);
        let _ = writeln!(
            out,
            r#"    <circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" fill-opacity="{:.3}"><title>{}</title></circle>"#,
            p.x,
            p.y,
            scene.sizes[i] / 2.0,
            fill.to_hex(),
            fill.a,
            escape_xml(&graph.graph[idx].token)
        );
    }
    let _ = writeln!(out, "  </g>");

    if encoding.labels {
        let _ = writeln!(
            out,
            r#"  <g class="labels" font-family="sans-serif" text-anchor="middle" dominant-baseline="central" fill="black">"#
        );
        for idx in graph.graph.node_indices() {
            let i = idx.index();
            let p = scene.points[i];
            let font = (scene.sizes[i] * 0.5).max(8.0);
            let _ = writeln!(
                out,
                r#"    <text x="{:.2}" y="{:.2}" font-size="{font:.1}">{}</text>"#,
                p.x,
                p.y - scene.sizes[i] / 2.0 - font * 0.6,
                escape_xml(&graph.graph[idx].token)
            );
        }
        let _ = writeln!(out, "  </g>");
    }

    let _ = writeln!(out, "</svg>");
    Ok(out)
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// DOT
// ---------------------------------------------------------------------------

/// Render to Graphviz DOT with pinned positions.
///
/// Node labels are tokens, edge labels traversal counts.
///
/// # Errors
///
/// Same as [`render_svg`].
pub fn render_dot(
    graph: &LineGraph,
    positions: &[Point],
    encoding: &VisualEncoding,
    canvas: Canvas,
) -> Result<String, RenderError> {
    let scene = Scene::build(graph, positions, encoding, canvas)?;
    let height = f64::from(scene.canvas.height);

    let node_attrs = |_: &DiGraph<Vertex, Edge>, (idx, _): (NodeIndex, &Vertex)| -> String {
        let i = idx.index();
        let p = scene.points[i];
        let fill = scene.fills[i];
        // Graphviz puts the origin bottom-left.
        format!(
            "pos=\"{:.2},{:.2}!\" shape=circle fixedsize=true width={:.4} style=filled fillcolor=\"{}\"",
            p.x,
            height - p.y,
            scene.sizes[i] / 72.0,
            fill.to_hex_rgba()
        )
    };
    let edge_attrs = |_: &DiGraph<Vertex, Edge>, e: EdgeReference<'_, Edge>| -> String {
        format!(
            "penwidth={:.2} color=\"{}\"",
            scene.widths[e.id().index()],
            Rgba::EDGE_STROKE.to_hex_rgba()
        )
    };

    let config: &[Config] = if encoding.labels {
        &[]
    } else {
        &[Config::NodeNoLabel, Config::EdgeNoLabel]
    };
    let dot = Dot::with_attr_getters(&graph.graph, config, &edge_attrs, &node_attrs);
    Ok(format!("{dot}"))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Render `graph` at `positions` to `path`; the extension picks the format.
///
/// Parent directories are not created.
///
/// # Errors
///
/// Returns [`RenderError`] for an unsupported extension, invalid inputs, or
/// a failed write.
#[instrument(skip(graph, positions, encoding, path), fields(path = %path.display()))]
pub fn render(
    graph: &LineGraph,
    positions: &[Point],
    encoding: &VisualEncoding,
    path: &Path,
    canvas: Canvas,
) -> Result<(), RenderError> {
    let format = OutputFormat::from_path(path)?;
    let body = match format {
        OutputFormat::Svg => render_svg(graph, positions, encoding, canvas)?,
        OutputFormat::Dot => render_dot(graph, positions, encoding, canvas)?,
    };
    std::fs::write(path, body).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(%format, "rendered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linemap_core::compose;

    fn sample() -> (LineGraph, Vec<Point>) {
        let g = compose(&[vec!["A", "B", "C"], vec!["A", "B"], vec!["C", "C"]]);
        let pos = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        (g, pos)
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.svg")).unwrap(), OutputFormat::Svg);
        assert_eq!(OutputFormat::from_path(Path::new("a.SVG")).unwrap(), OutputFormat::Svg);
        assert_eq!(OutputFormat::from_path(Path::new("a.dot")).unwrap(), OutputFormat::Dot);
        assert!(matches!(
            OutputFormat::from_path(Path::new("a.pdf")),
            Err(RenderError::UnsupportedFormat { .. })
        ));
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn svg_contains_every_vertex_and_edge() {
        let (g, pos) = sample();
        let svg = render_svg(&g, &pos, &VisualEncoding::default(), Canvas::default()).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<line ").count(), 2, "A→B and B→C");
        // 3 vertex circles + 1 self-loop ring.
        assert_eq!(svg.matches("<circle ").count(), 4);
        assert_eq!(svg.matches("<text ").count(), 3);
    }

    #[test]
    fn labels_can_be_turned_off() {
        let (g, pos) = sample();
        let encoding = VisualEncoding {
            labels: false,
            ..VisualEncoding::default()
        };
        let svg = render_svg(&g, &pos, &encoding, Canvas::default()).unwrap();
        assert!(!svg.contains("<text "));
    }

    #[test]
    fn tokens_are_escaped() {
        let g = compose(&[vec!["<a&b>"]]);
        let svg = render_svg(
            &g,
            &[Point::new(0.0, 0.0)],
            &VisualEncoding::default(),
            Canvas::default(),
        )
        .unwrap();
        assert!(svg.contains("&lt;a&amp;b&gt;"));
        assert!(!svg.contains("<a&b>"));
    }

    #[test]
    fn positions_fit_inside_canvas() {
        let g = compose(&[vec!["A", "B"]]);
        let pos = [Point::new(-1000.0, 5.0), Point::new(1000.0, 5.0)];
        let pts = fit(&pos, Canvas::square(400), 20.0);
        assert!((pts[0].x - 20.0).abs() < 1e-9);
        assert!((pts[1].x - 380.0).abs() < 1e-9);
        assert!((pts[0].y - 200.0).abs() < 1e-9);
        assert_eq!(g.vertex_count(), 2);
    }

    #[test]
    fn single_point_is_centred() {
        let pts = fit(&[Point::new(7.0, -3.0)], Canvas { width: 300, height: 100 }, 10.0);
        assert_eq!(pts[0], Point::new(150.0, 50.0));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let (g, pos) = sample();
        let enc = VisualEncoding::default();
        assert!(matches!(
            render_svg(&g, &pos, &enc, Canvas::square(0)),
            Err(RenderError::InvalidDimensions { width: 0, height: 0 })
        ));
        assert!(matches!(
            render_svg(&g, &pos[..2], &enc, Canvas::default()),
            Err(RenderError::LengthMismatch { what: "position", expected: 3, actual: 2 })
        ));
        let bad_sizes = VisualEncoding {
            vertex_size: Encoding::PerItem(vec![1.0]),
            ..VisualEncoding::default()
        };
        assert!(matches!(
            render_svg(&g, &pos, &bad_sizes, Canvas::default()),
            Err(RenderError::LengthMismatch { what: "vertex size", .. })
        ));
        let bad_widths = VisualEncoding {
            edge_pen_width: Encoding::PerItem(vec![1.0; 9]),
            ..VisualEncoding::default()
        };
        assert!(matches!(
            render_svg(&g, &pos, &bad_widths, Canvas::default()),
            Err(RenderError::LengthMismatch { what: "edge pen width", expected: 3, .. })
        ));
        let bad_fill = VisualEncoding {
            vertex_fill: Fill::Mapped(vec![]),
            ..VisualEncoding::default()
        };
        assert!(matches!(
            render_dot(&g, &pos, &bad_fill, Canvas::default()),
            Err(RenderError::LengthMismatch { what: "vertex fill", .. })
        ));
    }

    #[test]
    fn dot_pins_positions_and_labels() {
        let (g, pos) = sample();
        let dot = render_dot(&g, &pos, &VisualEncoding::default(), Canvas::default()).unwrap();
        assert!(dot.starts_with("digraph"));
        assert_eq!(dot.matches("pos=\"").count(), 3);
        assert!(dot.contains("label = \"A\""));
        assert!(dot.contains("label = \"2\""), "A→B traversed twice");
        assert!(dot.contains("penwidth="));
    }

    #[test]
    fn mapped_fill_uses_colormap() {
        let (g, pos) = sample();
        let encoding = VisualEncoding {
            vertex_fill: Fill::Mapped(vec![0.0, 1.0, 2.0]),
            ..VisualEncoding::default()
        };
        let svg = render_svg(&g, &pos, &encoding, Canvas::default()).unwrap();
        let cm = Colormap::default();
        assert!(svg.contains(&cm.at(0.0).to_hex()));
        assert!(svg.contains(&cm.at(1.0).to_hex()));
    }

    #[test]
    fn render_writes_file_and_reports_io_errors() {
        let (g, pos) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.svg");
        render(&g, &pos, &VisualEncoding::default(), &path, Canvas::default()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<svg"));

        let missing = dir.path().join("no-such-dir").join("graph.dot");
        assert!(matches!(
            render(&g, &pos, &VisualEncoding::default(), &missing, Canvas::default()),
            Err(RenderError::Io { .. })
        ));
    }
}
