//! darkroom - darkroom print simulator CLI
//!
//! Renders a print from a negative image and a project of exposures,
//! and edits projects from the command line.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "darkroom")]
#[command(author, version, about = "Darkroom print simulator")]
#[command(long_about = "
Simulates exposing a scanned negative onto photographic paper.

Examples:
  darkroom render neg.jpg --project print.ddr -o print.png
  darkroom render neg.jpg -p print.json -o print.png --histogram hist.json
  darkroom render neg.jpg -p print.ddr -o print.png --backend cpu --tone threshold
  darkroom papers
  darkroom inspect print.ddr
  darkroom convert print.ddr print.json
  darkroom paint neg.jpg -p print.ddr --strokes dodge.json -o painted.ddr
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file (defaults come from DARKROOM_* variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a print from a negative and a project
    #[command(visible_alias = "r")]
    Render(RenderArgs),

    /// List the paper stocks and their grade ranges
    Papers(PapersArgs),

    /// Describe the exposures stored in a project
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),

    /// Convert a project between binary (.ddr) and JSON
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Paint dodge or erase strokes into exposure masks from a script
    Paint(PaintArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Negative image (any format the image crate decodes)
    input: PathBuf,

    /// Project file (.ddr or .json)
    #[arg(short, long)]
    project: PathBuf,

    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,

    /// Also write the RGB histogram as JSON
    #[arg(long)]
    histogram: Option<PathBuf>,

    /// Backend: auto, gpu, cpu
    #[arg(short, long)]
    backend: Option<String>,

    /// Tone blend: reflectance, threshold
    #[arg(short, long)]
    tone: Option<String>,
}

#[derive(Args)]
struct PapersArgs {
    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Project file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input project
    input: PathBuf,

    /// Output project; format follows the extension
    output: PathBuf,
}

#[derive(Args)]
struct PaintArgs {
    /// Negative the masks are painted against
    input: PathBuf,

    /// Project to start from; a fresh project when omitted
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Stroke script (JSON)
    #[arg(short, long)]
    strokes: PathBuf,

    /// Output project
    #[arg(short, long)]
    output: PathBuf,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render(args) => commands::render::run(args, &config, cli.verbose),
        Commands::Papers(args) => commands::papers::run(args, cli.verbose),
        Commands::Inspect(args) => commands::inspect::run(args, cli.verbose),
        Commands::Convert(args) => commands::convert::run(args, cli.verbose),
        Commands::Paint(args) => commands::paint::run(args, &config, cli.verbose),
    }
}
