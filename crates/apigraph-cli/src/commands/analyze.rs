//! Analyzer shortcuts: diff, drift, deps

use super::{print_json, CommandResult, Context};
use apigraph_core::diff::render_human_summary;
use apigraph_engine::analyzers::{
    BreakingChangeAnalyzer, BreakingChangeParams, DependencyAnalyzer, DependencyParams,
    DriftAnalyzer, DriftParams, GraphSource,
};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Old side: `snapshot:<name>`, `spec:<path>`, or a bare spec path / graph name
    #[arg(long)]
    pub old: String,

    /// New side, same forms as --old
    #[arg(long)]
    pub new: String,

    /// Print a Markdown summary instead of JSON
    #[arg(long)]
    pub markdown: bool,

    /// Exit with status 2 when any breaking change is found
    #[arg(long)]
    pub fail_on_breaking: bool,
}

#[derive(Debug, Args)]
pub struct DriftArgs {
    /// Stored graph name
    pub graph: String,

    /// Observations file (JSON array or JSON Lines)
    #[arg(long)]
    pub observations: PathBuf,
}

#[derive(Debug, Args)]
pub struct DepsArgs {
    /// Stored graph name
    pub graph: String,

    /// Store the inferred edges with the graph
    #[arg(long)]
    pub persist: bool,
}

pub fn execute_diff(ctx: &Context, args: DiffArgs) -> CommandResult {
    let analyzer = BreakingChangeAnalyzer::new(ctx.store.clone(), &ctx.config);
    let report = analyzer.analyze(BreakingChangeParams {
        old: Some(parse_source(&args.old)),
        new: Some(parse_source(&args.new)),
    })?;

    if args.markdown {
        print!("{}", render_human_summary(&report.to_diff_report()));
    } else {
        print_json(&report)?;
    }

    Ok(if args.fail_on_breaking && report.has_breaking() {
        2
    } else {
        0
    })
}

pub fn execute_drift(ctx: &Context, args: DriftArgs) -> CommandResult {
    let analyzer = DriftAnalyzer::new(ctx.store.clone(), &ctx.config);
    let report = analyzer.analyze(DriftParams {
        graph: args.graph,
        observations: None,
        observations_file: Some(args.observations),
    })?;
    print_json(&report)?;
    Ok(0)
}

pub fn execute_deps(ctx: &Context, args: DepsArgs) -> CommandResult {
    let analyzer = DependencyAnalyzer::new(ctx.store.clone(), &ctx.config);
    let report = analyzer.analyze(DependencyParams {
        graph: args.graph,
        persist: args.persist,
    })?;
    print_json(&report)?;
    Ok(0)
}

/// `snapshot:<name>` and `spec:<path>` are explicit; a bare value is a spec
/// path when such a file exists, otherwise a graph name.
fn parse_source(raw: &str) -> GraphSource {
    if let Some(name) = raw.strip_prefix("snapshot:") {
        return GraphSource::Snapshot(name.to_string());
    }
    if let Some(path) = raw.strip_prefix("spec:") {
        return GraphSource::Spec(PathBuf::from(path));
    }
    let path = PathBuf::from(raw);
    if path.is_file() {
        GraphSource::Spec(path)
    } else {
        GraphSource::Snapshot(raw.to_string())
    }
}
