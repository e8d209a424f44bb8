//! Shared plumbing for the graph commands: config, input, closeness.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{debug, info};

use linemap_core::config::resolve_config;
use linemap_core::error::ErrorCode;
use linemap_core::input::{InputError, demo_lines, load_sequences};
use linemap_core::{LineGraph, LinemapConfig, WeightPolicy, compose};
use linemap_metrics::{ClosenessError, ClosenessOptions, annotate_closeness};

use crate::output::{CliError, OutputMode, render_error};

/// Process-wide settings shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    pub output: OutputMode,
    pub config: Option<PathBuf>,
    pub project_root: PathBuf,
}

/// Input and closeness flags shared by `analyze`, `render` and `export`.
#[derive(Args, Debug, Clone, Default)]
pub struct GraphArgs {
    /// Sequence file: one sequence per line, or a `.json` array of arrays.
    /// Defaults to the built-in demo network.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Closeness path weighting: `raw` (traverse count) or `inverted`
    /// (max count minus traverse count). Overrides `closeness.weighting`.
    #[arg(short, long, value_name = "POLICY")]
    pub weighting: Option<WeightPolicy>,

    /// Report `1 / sum` instead of `(reachable - 1) / sum`.
    #[arg(long)]
    pub unnormalized: bool,
}

/// A composed graph with closeness attached.
#[derive(Debug)]
pub struct AnnotatedGraph {
    pub graph: LineGraph,
    pub weighting: WeightPolicy,
    pub normalized: bool,
    /// Scores that were NaN or infinite before being replaced with zero.
    pub sanitized: usize,
}

/// Render `error` to stderr and turn it into an `anyhow` error for `main`.
pub fn fail(output: OutputMode, error: &CliError) -> anyhow::Error {
    if let Err(e) = render_error(output, error) {
        return e;
    }
    anyhow::anyhow!("{}", error.message)
}

/// Resolve the effective config for this invocation.
///
/// # Errors
///
/// Fails with `E1003` when the chosen config file is unreadable or invalid.
pub fn load_config(globals: &Globals) -> Result<LinemapConfig> {
    match resolve_config(globals.config.as_deref(), &globals.project_root) {
        Ok((config, source)) => {
            debug!(?source, "resolved config");
            Ok(config)
        }
        Err(e) => Err(fail(
            globals.output,
            &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
        )),
    }
}

/// Read the input sequences, or the demo network when no path was given.
///
/// # Errors
///
/// Fails with `E1001` for unreadable files and `E1002` for malformed JSON.
pub fn load_input(args: &GraphArgs, output: OutputMode) -> Result<Vec<Vec<String>>> {
    let Some(path) = args.input.as_deref() else {
        info!("no --input given; using the built-in demo network");
        return Ok(demo_lines());
    };
    load_sequences(path).map_err(|e| {
        let code = match &e {
            InputError::Read { .. } => ErrorCode::InputReadFailed,
            InputError::Json { .. } => ErrorCode::InputParseFailed,
        };
        fail(output, &CliError::from_code(code, e))
    })
}

/// Flag wins over config; there is no built-in default.
pub fn resolve_weighting(
    flag: Option<WeightPolicy>,
    config: &LinemapConfig,
) -> Option<WeightPolicy> {
    flag.or(config.closeness.weighting)
}

/// Load input, compose it and attach closeness.
///
/// # Errors
///
/// Propagates input failures, fails with `E2001` when no weighting was
/// chosen and with `E9001` if closeness cannot be attached.
pub fn build_graph(
    args: &GraphArgs,
    config: &LinemapConfig,
    output: OutputMode,
) -> Result<AnnotatedGraph> {
    let Some(weighting) = resolve_weighting(args.weighting, config) else {
        return Err(fail(
            output,
            &CliError::from_code(
                ErrorCode::WeightingUnspecified,
                "choose how traversal counts weight closeness paths",
            ),
        ));
    };

    let sequences = load_input(args, output)?;
    let mut graph = compose(&sequences);

    let normalized = config.closeness.normalized && !args.unnormalized;
    let sanitized = annotate_closeness(&mut graph, weighting, &ClosenessOptions { normalized })
        .map_err(|e| fail(output, &closeness_error(&e)))?;
    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        sanitized,
        "graph ready"
    );

    Ok(AnnotatedGraph {
        graph,
        weighting,
        normalized,
        sanitized,
    })
}

fn closeness_error(e: &ClosenessError) -> CliError {
    CliError::from_code(ErrorCode::InternalUnexpected, format!("closeness: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_config_weighting() {
        let mut config = LinemapConfig::default();
        assert_eq!(resolve_weighting(None, &config), None);

        config.closeness.weighting = Some(WeightPolicy::Inverted);
        assert_eq!(resolve_weighting(None, &config), Some(WeightPolicy::Inverted));
        assert_eq!(
            resolve_weighting(Some(WeightPolicy::Raw), &config),
            Some(WeightPolicy::Raw)
        );
    }

    #[test]
    fn demo_input_when_no_path() {
        let sequences = load_input(&GraphArgs::default(), OutputMode::Text).unwrap();
        assert_eq!(sequences, demo_lines());
    }

    #[test]
    fn build_graph_requires_weighting() {
        let err = build_graph(&GraphArgs::default(), &LinemapConfig::default(), OutputMode::Text)
            .unwrap_err();
        assert!(err.to_string().contains("weighting"), "{err}");
    }

    #[test]
    fn build_graph_attaches_closeness() {
        let args = GraphArgs {
            weighting: Some(WeightPolicy::Raw),
            ..GraphArgs::default()
        };
        let built = build_graph(&args, &LinemapConfig::default(), OutputMode::Text).unwrap();
        assert_eq!(built.graph.vertex_count(), 17);
        assert_eq!(built.weighting, WeightPolicy::Raw);
        assert!(built.normalized);
        assert!(built.graph.closeness_scores().iter().any(|c| *c > 0.0));
    }

    #[test]
    fn closeness_failures_are_internal_errors() {
        let err = closeness_error(&ClosenessError::WeightCountMismatch {
            expected: 3,
            actual: 1,
        });
        assert_eq!(err.error_code.as_deref(), Some("E9001"));
        assert!(err.message.contains("expected 3 edge weights, got 1"), "{}", err.message);
    }

    #[test]
    fn unnormalized_flag_disables_normalization() {
        let args = GraphArgs {
            weighting: Some(WeightPolicy::Raw),
            unnormalized: true,
            ..GraphArgs::default()
        };
        let built = build_graph(&args, &LinemapConfig::default(), OutputMode::Text).unwrap();
        assert!(!built.normalized);
    }
}
