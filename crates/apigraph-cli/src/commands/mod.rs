//! Subcommand implementations

pub mod analyze;
pub mod ingest;
pub mod tools;

use apigraph_core::config::EngineConfig;
use apigraph_engine::AnalyzerRegistry;
use apigraph_store::GraphStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Exit code result; errors exit with 1.
pub type CommandResult = Result<i32, Box<dyn std::error::Error>>;

/// Store, configuration and registry shared by every subcommand.
pub struct Context {
    pub config: EngineConfig,
    pub store: Arc<GraphStore>,
    pub registry: AnalyzerRegistry,
}

impl Context {
    pub fn open(store_dir: &Path, config_path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::load()?,
        };
        let store = Arc::new(GraphStore::open(store_dir)?.with_normalizer(config.normalizer.clone()));
        let registry = AnalyzerRegistry::with_defaults(store.clone(), &config);
        Ok(Self {
            config,
            store,
            registry,
        })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
