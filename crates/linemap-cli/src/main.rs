#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "linemap: compose token sequences into a weighted graph, rank and draw it",
    long_about = None
)]
struct Cli {
    /// Enable debug logging for linemap crates.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (pretty, text, json). Defaults to pretty on a TTY.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file. Defaults to ./linemap.toml, then the user config dir.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Rank vertices and edges",
        long_about = "Compose the input into a graph, attach closeness, and print the summary \
                      with top vertices by visit count and closeness and top edges by traversals.",
        after_help = "EXAMPLES:\n    # Built-in demo network, raw weighting\n    linemap analyze --weighting raw\n\n    # Own input, top 5, machine-readable\n    linemap analyze --input lines.txt --weighting inverted --top 5 --format json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        about = "Render the layout gallery",
        long_about = "Lay out the graph with each algorithm and write the comparison images.",
        after_help = "EXAMPLES:\n    # SVG gallery into ./output\n    linemap render --weighting raw\n\n    # Graphviz sources with another seed\n    linemap render --weighting raw --format-ext dot --seed 7 --out-dir graphs"
    )]
    Render(cmd::render::RenderArgs),

    #[command(
        about = "Export the annotated graph as JSON",
        after_help = "EXAMPLES:\n    linemap export --weighting raw > graph.json\n    linemap export --input lines.json --weighting inverted --out graph.json"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    linemap completions bash\n    linemap completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("LINEMAP_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "linemap=debug,info"
        } else {
            "linemap=info,warn"
        })
    });

    let format = env::var("LINEMAP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(?cli, "parsed arguments");

    let globals = cmd::support::Globals {
        output: cli.output_mode(),
        config: cli.config.clone(),
        project_root: env::current_dir()?,
    };

    match cli.command {
        Commands::Analyze(ref args) => cmd::analyze::run_analyze(args, &globals),
        Commands::Render(ref args) => cmd::render::run_render(args, &globals),
        Commands::Export(ref args) => cmd::export::run_export(args, &globals),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
