//! Analyzer capability interface and the explicit registry.
//!
//! Every analyzer takes one JSON object of named parameters and returns a
//! JSON result or fails. The registry owns no global state: it is built by
//! the orchestration layer with the store each analyzer should read.

use crate::analyzers::{BreakingChangeAnalyzer, DependencyAnalyzer, DriftAnalyzer};
use crate::errors::{invalid_params, report_serialization, Result};
use apigraph_core_types::RequestId;
use apigraph_core::config::EngineConfig;
use apigraph_core::errors::ApiGraphError;
use apigraph_core::{log_op_end, log_op_error, log_op_start};
use apigraph_store::GraphStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Uniform analyzer contract.
pub trait Analyzer: Send + Sync {
    /// Stable tool name used for invocation.
    fn name(&self) -> &'static str;

    /// One-line description for tool listings.
    fn description(&self) -> &'static str;

    /// Run with a JSON object of named parameters.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for malformed parameters, `MissingInput` when a required
    /// graph or spec cannot be resolved, or a persistence error.
    fn run(&self, params: &Value) -> Result<Value>;
}

/// Name and description of a registered analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzerInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Registered analyzers in registration order.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the breaking-change, drift and dependency analyzers.
    pub fn with_defaults(store: Arc<GraphStore>, config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BreakingChangeAnalyzer::new(store.clone(), config)));
        registry.register(Box::new(DriftAnalyzer::new(store.clone(), config)));
        registry.register(Box::new(DependencyAnalyzer::new(store, config)));
        registry
    }

    /// Add an analyzer; a later registration under the same name replaces the earlier one.
    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        match self.analyzers.iter().position(|a| a.name() == analyzer.name()) {
            Some(idx) => self.analyzers[idx] = analyzer,
            None => self.analyzers.push(analyzer),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Analyzer> {
        self.analyzers
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    pub fn describe(&self) -> Vec<AnalyzerInfo> {
        self.analyzers
            .iter()
            .map(|a| AnalyzerInfo {
                name: a.name(),
                description: a.description(),
            })
            .collect()
    }

    /// Invoke an analyzer by name.
    ///
    /// # Errors
    ///
    /// `UnknownAnalyzer` for an unregistered name, `InvalidInput` when
    /// `params` is not a JSON object, otherwise whatever the analyzer returns.
    pub fn invoke(&self, name: &str, params: &Value) -> Result<Value> {
        let request_id = RequestId::new();
        log_op_start!(
            "invoke_analyzer",
            analyzer = name,
            request_id = request_id.as_str()
        );
        let start = std::time::Instant::now();

        let result = match self.get(name) {
            None => Err(ApiGraphError::UnknownAnalyzer {
                name: name.to_string(),
            }
            .into()),
            Some(_) if !params.is_object() => Err(invalid_params(
                name,
                "parameters must be a JSON object",
            )),
            Some(analyzer) => analyzer.run(params),
        }
        .map_err(|e| e.with_request_id(request_id.clone()));

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => log_op_end!(
                "invoke_analyzer",
                duration_ms = elapsed,
                analyzer = name,
                request_id = request_id.as_str()
            ),
            Err(e) => {
                let e_clone = e.clone();
                log_op_error!(
                    "invoke_analyzer",
                    e_clone,
                    duration_ms = elapsed,
                    analyzer = name,
                    request_id = request_id.as_str()
                );
            }
        }
        result
    }
}

/// Decode tool parameters into an analyzer's typed parameter struct.
///
/// # Errors
///
/// `InvalidInput` naming the analyzer and the serde complaint.
pub fn parse_params<T: DeserializeOwned>(analyzer: &str, params: &Value) -> Result<T> {
    serde_json::from_value(params.clone()).map_err(|e| invalid_params(analyzer, e.to_string()))
}

/// Encode a typed report as the tool result.
///
/// # Errors
///
/// `Serialization` if the report cannot be encoded.
pub fn to_result<T: Serialize>(analyzer: &str, report: &T) -> Result<Value> {
    serde_json::to_value(report).map_err(|e| report_serialization(analyzer, e))
}
