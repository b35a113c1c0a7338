//! Ingest command

use super::{print_json, CommandResult, Context};
use apigraph_store::MergePolicy;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Graph name
    pub name: String,

    /// OpenAPI 3.x / Swagger 2.0 document (JSON or YAML)
    #[arg(long, conflicts_with = "observations", required_unless_present = "observations")]
    pub spec: Option<PathBuf>,

    /// Live samples (JSON array or JSON Lines)
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// replace | merge
    #[arg(long, default_value = "replace")]
    pub policy: MergePolicy,
}

pub fn execute(ctx: &Context, args: IngestArgs) -> CommandResult {
    let report = match (&args.spec, &args.observations) {
        (Some(spec), _) => ctx.store.ingest_spec_file(&args.name, spec, args.policy)?,
        (None, Some(observations)) => {
            ctx.store
                .ingest_observations_file(&args.name, observations, args.policy)?
        }
        (None, None) => return Err("Must specify either --spec or --observations".into()),
    };
    print_json(&report)?;
    Ok(0)
}
