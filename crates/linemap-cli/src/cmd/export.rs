use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use linemap_core::WeightPolicy;
use linemap_core::error::ErrorCode;
use linemap_core::model::GraphExport;

use crate::cmd::support::{GraphArgs, Globals, build_graph, fail, load_config};
use crate::output::CliError;

/// Arguments for `linemap export`.
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Write to a file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ExportDocument {
    weighting: WeightPolicy,
    normalized: bool,
    #[serde(flatten)]
    graph: GraphExport,
}

/// Dump the annotated graph as JSON.
///
/// The document is JSON in every output mode.
///
/// # Errors
///
/// Fails on config, input or weighting errors, or if the file cannot be
/// written.
pub fn run_export(args: &ExportArgs, globals: &Globals) -> Result<()> {
    let config = load_config(globals)?;
    let built = build_graph(&args.graph, &config, globals.output)?;

    let document = ExportDocument {
        weighting: built.weighting,
        normalized: built.normalized,
        graph: built.graph.to_export(),
    };
    let json = serde_json::to_string_pretty(&document).context("serialize graph export")?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n")).map_err(|e| {
                fail(
                    globals.output,
                    &CliError::from_code(
                        ErrorCode::OutputWriteFailed,
                        format!("{}: {e}", path.display()),
                    ),
                )
            })?;
            info!(path = %path.display(), "wrote export");
        }
        None => println!("{json}"),
    }
    Ok(())
}
