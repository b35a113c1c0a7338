//! apigraph CLI
//!
//! Command-line interface for the API knowledge graph

use apigraph_core::logging_facility::{init, Profile};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "apigraph")]
#[command(about = "apigraph - API knowledge graph: ingest, diff, drift and dependencies", long_about = None)]
struct Cli {
    /// Graph store directory
    #[arg(long, global = true, default_value = ".apigraph/graphs")]
    store: PathBuf,

    /// Configuration file (defaults to ./apigraph.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON logs on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest a specification or live samples into a named graph
    Ingest(commands::ingest::IngestArgs),
    /// Detect breaking changes between two graphs or specifications
    Diff(commands::analyze::DiffArgs),
    /// Compare a stored graph with live-traffic observations
    Drift(commands::analyze::DriftArgs),
    /// Infer resource dependencies between endpoints
    Deps(commands::analyze::DepsArgs),
    /// Invoke an analyzer with JSON parameters
    Run(commands::tools::RunArgs),
    /// List registered analyzers
    Tools,
}

fn main() {
    let cli = Cli::parse();

    init(if cli.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let ctx = match commands::Context::open(&cli.store, cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(&ctx, args),
        Commands::Diff(args) => commands::analyze::execute_diff(&ctx, args),
        Commands::Drift(args) => commands::analyze::execute_drift(&ctx, args),
        Commands::Deps(args) => commands::analyze::execute_deps(&ctx, args),
        Commands::Run(args) => commands::tools::execute_run(&ctx, args),
        Commands::Tools => commands::tools::execute_tools(&ctx),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
