use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use linemap_core::WeightPolicy;
use linemap_core::report::{GraphSummary, Metric, Ranked, RankedEdge, top_edges, top_n};

use crate::cmd::support::{GraphArgs, Globals, build_graph, load_config};
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Arguments for `linemap analyze`.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Rows per ranking. Overrides `report.top`.
    #[arg(short = 'n', long, value_name = "N")]
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
struct AnalyzeReport {
    summary: GraphSummary,
    weighting: WeightPolicy,
    normalized: bool,
    sanitized: usize,
    top_visited: Vec<Ranked>,
    top_closeness: Vec<Ranked>,
    top_edges: Vec<RankedEdge>,
}

/// Compose the input, attach closeness and print rankings.
///
/// # Errors
///
/// Fails on config, input or weighting errors, or if writing output fails.
pub fn run_analyze(args: &AnalyzeArgs, globals: &Globals) -> Result<()> {
    let config = load_config(globals)?;
    let built = build_graph(&args.graph, &config, globals.output)?;
    let n = args.top.unwrap_or(config.report.top);
    let graph = &built.graph;

    let report = AnalyzeReport {
        summary: GraphSummary::from_graph(graph),
        weighting: built.weighting,
        normalized: built.normalized,
        sanitized: built.sanitized,
        top_visited: top_n(graph, Metric::VisitCount, n),
        top_closeness: top_n(graph, Metric::Closeness, n),
        top_edges: top_edges(graph, n),
    };

    render_mode(globals.output, &report, render_text, render_pretty)
}

fn render_text(report: &AnalyzeReport, w: &mut dyn Write) -> std::io::Result<()> {
    let s = &report.summary;
    writeln!(
        w,
        "graph vertices={} edges={} visits={} traversals={} hash={}",
        s.vertex_count, s.edge_count, s.total_visits, s.total_traversals, s.content_hash
    )?;
    for row in &report.top_visited {
        writeln!(w, "visit_count  {}  {}  {}", row.rank, row.token, row.value)?;
    }
    for row in &report.top_closeness {
        writeln!(w, "closeness  {}  {}  {}", row.rank, row.token, row.value)?;
    }
    for row in &report.top_edges {
        writeln!(
            w,
            "edge  {}  {}  {}  {}",
            row.rank, row.source, row.target, row.traverse_count
        )?;
    }
    Ok(())
}

fn render_pretty(report: &AnalyzeReport, w: &mut dyn Write) -> std::io::Result<()> {
    let s = &report.summary;
    pretty_section(w, "Graph")?;
    pretty_kv(w, "shape", s.to_string())?;
    pretty_kv(w, "total visits", s.total_visits.to_string())?;
    pretty_kv(w, "total traversals", s.total_traversals.to_string())?;
    pretty_kv(w, "content hash", &s.content_hash)?;
    let scoring = if report.normalized {
        format!("{} weighting, normalized", report.weighting)
    } else {
        format!("{} weighting", report.weighting)
    };
    pretty_kv(w, "closeness", scoring)?;
    if report.sanitized > 0 {
        pretty_kv(
            w,
            "zeroed scores",
            format!("{} (unreachable or zero-length paths)", report.sanitized),
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Most visited")?;
    write_ranked(w, &report.top_visited)?;

    writeln!(w)?;
    pretty_section(w, "Highest closeness")?;
    write_ranked(w, &report.top_closeness)?;

    writeln!(w)?;
    pretty_section(w, "Busiest edges")?;
    if report.top_edges.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for row in &report.top_edges {
        writeln!(
            w,
            "{:>4}. {} -> {}  ({})",
            row.rank, row.source, row.target, row.traverse_count
        )?;
    }
    Ok(())
}

fn write_ranked(w: &mut dyn Write, rows: &[Ranked]) -> std::io::Result<()> {
    if rows.is_empty() {
        return writeln!(w, "  (none)");
    }
    let width = rows.iter().map(|r| r.token.len()).max().unwrap_or(0);
    for row in rows {
        writeln!(w, "{:>4}. {:<width$}  {}", row.rank, row.token, row.value)?;
    }
    Ok(())
}
