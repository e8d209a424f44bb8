use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::info;

use linemap_core::WeightPolicy;
use linemap_core::error::ErrorCode;
use linemap_draw::{
    GalleryError, GallerySettings, LayoutError, OutputFormat, RenderError, RenderedFile,
    render_gallery,
};

use crate::cmd::support::{GraphArgs, Globals, build_graph, fail, load_config};
use crate::output::{CliError, pretty_kv, pretty_section, render_mode};

/// Image formats selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageFormat {
    Svg,
    Dot,
}

impl From<ImageFormat> for OutputFormat {
    fn from(f: ImageFormat) -> Self {
        match f {
            ImageFormat::Svg => Self::Svg,
            ImageFormat::Dot => Self::Dot,
        }
    }
}

/// Arguments for `linemap render`.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Directory for the images (created if missing). Overrides `render.out_dir`.
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Image format. Overrides `render.format`.
    #[arg(long = "format-ext", value_enum, value_name = "EXT")]
    pub format_ext: Option<ImageFormat>,

    /// Layout seed. Overrides `render.seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Omit token labels.
    #[arg(long)]
    pub no_labels: bool,
}

#[derive(Debug, Serialize)]
struct RenderReport {
    out_dir: PathBuf,
    format: String,
    seed: u64,
    weighting: WeightPolicy,
    files: Vec<RenderedFile>,
}

/// Render the comparison gallery for the input graph.
///
/// # Errors
///
/// Fails on config, input or weighting errors, when the output directory
/// cannot be created, or when a layout or render step fails.
pub fn run_render(args: &RenderArgs, globals: &Globals) -> Result<()> {
    let output = globals.output;
    let config = load_config(globals)?;
    let built = build_graph(&args.graph, &config, output)?;

    let mut settings = GallerySettings::try_from(&config.render)
        .map_err(|e| fail(output, &gallery_error(&e)))?;
    if let Some(format) = args.format_ext {
        settings.format = format.into();
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    settings.labels = !args.no_labels;

    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| config.render.out_dir.clone());
    let out_dir = if out_dir.is_absolute() {
        out_dir
    } else {
        globals.project_root.join(out_dir)
    };
    std::fs::create_dir_all(&out_dir).map_err(|e| {
        fail(
            output,
            &CliError::from_code(
                ErrorCode::OutputWriteFailed,
                format!("cannot create {}: {e}", out_dir.display()),
            ),
        )
    })?;

    let files = render_gallery(&built.graph, &settings, &out_dir)
        .map_err(|e| fail(output, &gallery_error(&e)))?;
    info!(count = files.len(), out_dir = %out_dir.display(), "gallery rendered");

    let report = RenderReport {
        out_dir,
        format: settings.format.to_string(),
        seed: settings.seed,
        weighting: built.weighting,
        files,
    };
    render_mode(output, &report, render_text, render_pretty)
}

fn gallery_error(e: &GalleryError) -> CliError {
    let code = match e {
        GalleryError::Layout(LayoutError::Diverged { .. }) => ErrorCode::LayoutDiverged,
        GalleryError::Layout(_) => ErrorCode::InternalUnexpected,
        GalleryError::Render(RenderError::Io { .. }) => ErrorCode::OutputWriteFailed,
        GalleryError::Render(_) | GalleryError::UnknownFormat(_) => ErrorCode::RenderInvalid,
    };
    CliError::from_code(code, e)
}

fn render_text(report: &RenderReport, w: &mut dyn Write) -> std::io::Result<()> {
    for file in &report.files {
        writeln!(
            w,
            "{}  {}  {}  {}",
            file.path.display(),
            file.layout,
            file.iterations,
            if file.converged { "converged" } else { "capped" }
        )?;
    }
    Ok(())
}

fn render_pretty(report: &RenderReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Gallery")?;
    pretty_kv(w, "directory", report.out_dir.display().to_string())?;
    pretty_kv(w, "format", &report.format)?;
    pretty_kv(w, "seed", report.seed.to_string())?;
    pretty_kv(w, "weighting", report.weighting.as_str())?;
    writeln!(w)?;
    let width = report.files.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for file in &report.files {
        let note = if file.converged {
            String::new()
        } else {
            format!("  (stopped after {} iterations)", file.iterations)
        };
        writeln!(w, "  {:<width$}  {}{note}", file.name, file.layout)?;
    }
    Ok(())
}
