//! Drift analyzer: a stored graph against live-traffic observations.

use crate::analyzer::{parse_params, to_result, Analyzer};
use crate::errors::{invalid_params, missing_input, report_serialization, Result};
use crate::report::{DriftReport, SourcedNote};
use apigraph_core::config::EngineConfig;
use apigraph_core::drift::{analyze_drift, DriftOptions};
use apigraph_core::model::Observation;
use apigraph_store::persist::graph_digest;
use apigraph_store::{read_observations_file, GraphStore};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub const NAME: &str = "drift";

/// `{ "graph": .., "observations": [..] }` or `{ "graph": .., "observations_file": .. }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriftParams {
    pub graph: String,
    #[serde(default)]
    pub observations: Option<Vec<Observation>>,
    #[serde(default)]
    pub observations_file: Option<PathBuf>,
}

pub struct DriftAnalyzer {
    store: Arc<GraphStore>,
    options: DriftOptions,
}

impl DriftAnalyzer {
    pub fn new(store: Arc<GraphStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            options: DriftOptions {
                policy: config.drift.clone(),
                max_depth: config.normalizer.max_depth,
                include_informational: config.diff.include_informational,
            },
        }
    }

    /// # Errors
    ///
    /// `InvalidInput` unless exactly one observation source is given,
    /// `MissingInput` when the graph or observation file cannot be resolved.
    pub fn analyze(&self, params: DriftParams) -> Result<DriftReport> {
        let observations = match (params.observations, params.observations_file) {
            (Some(inline), None) => inline,
            (None, Some(path)) => read_observations_file(&path).map_err(|cause| {
                missing_input(
                    "observations",
                    format!("{} could not be read", path.display()),
                    Some(cause),
                )
            })?,
            (Some(_), Some(_)) => {
                return Err(invalid_params(
                    NAME,
                    "give either 'observations' or 'observations_file', not both",
                ))
            }
            (None, None) => {
                return Err(missing_input(
                    "observations",
                    "neither 'observations' nor 'observations_file' given",
                    None,
                ))
            }
        };

        let graph = self.store.load(&params.graph).map_err(|cause| {
            missing_input(
                "graph",
                format!("graph '{}' could not be loaded", params.graph),
                Some(cause),
            )
        })?;

        let findings = analyze_drift(&graph, &observations, &self.options);
        let digest = graph_digest(&graph).map_err(|e| report_serialization(NAME, e))?;
        tracing::debug!(
            graph = %params.graph,
            observations = observations.len(),
            shadow = findings.shadow.len(),
            missing = findings.missing.len(),
            "Classified drift"
        );
        Ok(DriftReport::new(
            &params.graph,
            digest,
            observations.len(),
            findings,
            SourcedNote::collect(&params.graph, &graph),
        ))
    }
}

impl Analyzer for DriftAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Compare a stored API graph with live-traffic observations and report shadow, missing, drifted and unresolved endpoints"
    }

    fn run(&self, params: &Value) -> Result<Value> {
        let params: DriftParams = parse_params(NAME, params)?;
        let report = self.analyze(params)?;
        to_result(NAME, &report)
    }
}
