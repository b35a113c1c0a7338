//! Generic tool invocation and listing

use super::{print_json, CommandResult, Context};
use clap::Args;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Analyzer name (see `apigraph tools`)
    pub analyzer: String,

    /// JSON object of parameters, or `@<file>` to read them from a file
    #[arg(long, default_value = "{}")]
    pub params: String,
}

pub fn execute_run(ctx: &Context, args: RunArgs) -> CommandResult {
    let text = match args.params.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => args.params,
    };
    let params: serde_json::Value = serde_json::from_str(&text)?;
    let result = ctx.registry.invoke(&args.analyzer, &params)?;
    print_json(&result)?;
    Ok(0)
}

pub fn execute_tools(ctx: &Context) -> CommandResult {
    for info in ctx.registry.describe() {
        println!("{:<18} {}", info.name, info.description);
    }
    Ok(0)
}
