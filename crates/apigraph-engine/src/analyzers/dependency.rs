//! Dependency mapper: infer resource edges from declared shapes.

use crate::analyzer::{parse_params, to_result, Analyzer};
use crate::errors::{missing_input, Result};
use crate::report::DependencyReport;
use apigraph_core::config::{DependencyConfig, EngineConfig};
use apigraph_core::dependency::infer_edges;
use apigraph_store::GraphStore;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub const NAME: &str = "dependencies";

/// `{ "graph": .., "persist"?: bool }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyParams {
    pub graph: String,
    /// Replace the stored edge set with the inferred one.
    #[serde(default)]
    pub persist: bool,
}

pub struct DependencyAnalyzer {
    store: Arc<GraphStore>,
    config: DependencyConfig,
}

impl DependencyAnalyzer {
    pub fn new(store: Arc<GraphStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            config: config.dependency.clone(),
        }
    }

    /// # Errors
    ///
    /// `MissingInput` when the graph cannot be loaded, or a persistence error
    /// when `persist` is set and the write fails.
    pub fn analyze(&self, params: DependencyParams) -> Result<DependencyReport> {
        let graph = self.store.load(&params.graph).map_err(|cause| {
            missing_input(
                "graph",
                format!("graph '{}' could not be loaded", params.graph),
                Some(cause),
            )
        })?;

        let edges = infer_edges(&graph, &self.config);
        tracing::debug!(graph = %params.graph, edges = edges.len(), "Inferred dependencies");

        let mut view = graph.as_ref().clone();
        view.set_edges(edges.clone());
        if params.persist {
            self.store.replace_edges(&params.graph, edges)?;
        }
        Ok(DependencyReport::new(&params.graph, &view, params.persist))
    }
}

impl Analyzer for DependencyAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Infer which endpoints provide identifiers that other endpoints consume (heuristic, with confidence levels)"
    }

    fn run(&self, params: &Value) -> Result<Value> {
        let params: DependencyParams = parse_params(NAME, params)?;
        let report = self.analyze(params)?;
        to_result(NAME, &report)
    }
}
