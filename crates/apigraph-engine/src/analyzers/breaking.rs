//! Breaking-change detector: resolve two graphs, diff, bucket by severity.

use crate::analyzer::{parse_params, to_result, Analyzer};
use crate::errors::{missing_input, Result};
use crate::report::{BreakingChangeReport, InputDigests, SourcedNote};
use apigraph_core::builder::SpecBuilder;
use apigraph_core::config::{EngineConfig, NormalizerConfig};
use apigraph_core::diff::{diff_graphs, DiffReport};
use apigraph_core::errors::{ExError, ExErrorKind};
use apigraph_core::model::KnowledgeGraph;
use apigraph_store::persist::graph_digest;
use apigraph_store::GraphStore;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub const NAME: &str = "breaking_changes";

/// Where one side of the comparison comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum GraphSource {
    /// A graph persisted in the store.
    Snapshot(String),
    /// A specification file, ingested fresh for this call only.
    Spec(PathBuf),
    /// An inline specification document.
    Document(Value),
}

impl GraphSource {
    fn label(&self) -> String {
        match self {
            GraphSource::Snapshot(name) => format!("snapshot:{}", name),
            GraphSource::Spec(path) => format!("spec:{}", path.display()),
            GraphSource::Document(_) => "document".to_string(),
        }
    }
}

/// `{ "old": <source>, "new": <source> }`; both sides are required.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakingChangeParams {
    #[serde(default)]
    pub old: Option<GraphSource>,
    #[serde(default)]
    pub new: Option<GraphSource>,
}

pub struct BreakingChangeAnalyzer {
    store: Arc<GraphStore>,
    normalizer: NormalizerConfig,
    include_informational: bool,
}

impl BreakingChangeAnalyzer {
    pub fn new(store: Arc<GraphStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            normalizer: config.normalizer.clone(),
            include_informational: config.diff.include_informational,
        }
    }

    /// Compare two resolved sides.
    ///
    /// # Errors
    ///
    /// `MissingInput` when either side is absent or cannot be resolved; the
    /// resolution failure is attached as the source.
    pub fn analyze(&self, params: BreakingChangeParams) -> Result<BreakingChangeReport> {
        let old_source = params
            .old
            .ok_or_else(|| missing_input("old", "no source given", None))?;
        let new_source = params
            .new
            .ok_or_else(|| missing_input("new", "no source given", None))?;

        let old = self.resolve("old", &old_source)?;
        let new = self.resolve("new", &new_source)?;

        let mut diff = DiffReport::new(diff_graphs(&old, &new));
        if !self.include_informational {
            diff = diff.without_informational();
        }

        let mut notes = SourcedNote::collect("old", &old);
        notes.extend(SourcedNote::collect("new", &new));
        let inputs = InputDigests {
            old: digest_of("old", &old)?,
            new: digest_of("new", &new)?,
        };

        tracing::debug!(
            old = %old_source.label(),
            new = %new_source.label(),
            changes = diff.records.len(),
            "Compared graphs"
        );
        Ok(BreakingChangeReport::new(diff, notes, inputs))
    }

    fn resolve(&self, side: &str, source: &GraphSource) -> Result<Arc<KnowledgeGraph>> {
        let resolved = match source {
            GraphSource::Snapshot(name) => self.store.load(name),
            GraphSource::Spec(path) => std::fs::read_to_string(path)
                .map_err(|e| {
                    ExError::new(ExErrorKind::Io)
                        .with_op("read_spec")
                        .with_location(path.display().to_string())
                        .with_message(e.to_string())
                })
                .and_then(|text| self.build(|b| b.build_str(&text))),
            GraphSource::Document(doc) => self.build(|b| b.build(doc)),
        };
        resolved.map_err(|cause| {
            missing_input(
                side,
                format!("{} could not be resolved", source.label()),
                Some(cause),
            )
        })
    }

    fn build<F>(&self, f: F) -> Result<Arc<KnowledgeGraph>>
    where
        F: FnOnce(&SpecBuilder) -> apigraph_core::Result<apigraph_core::builder::BuildOutput>,
    {
        let output = f(&SpecBuilder::new(&self.normalizer))?;
        Ok(Arc::new(output.into_graph(0)?))
    }
}

fn digest_of(side: &str, graph: &KnowledgeGraph) -> Result<String> {
    graph_digest(graph).map_err(|e| {
        ExError::new(ExErrorKind::Serialization)
            .with_op(NAME)
            .with_message(format!("failed to digest {} graph: {}", side, e))
    })
}

impl Analyzer for BreakingChangeAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Diff two API graphs (stored snapshots or specifications) and classify every change as breaking, minor, patch or informational"
    }

    fn run(&self, params: &Value) -> Result<Value> {
        let params: BreakingChangeParams = parse_params(NAME, params)?;
        let report = self.analyze(params)?;
        to_result(NAME, &report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_shapes() {
        let params: BreakingChangeParams = serde_json::from_value(json!({
            "old": {"snapshot": "v1"},
            "new": {"spec": "specs/v2.yaml"}
        }))
        .unwrap();
        assert_eq!(params.old, Some(GraphSource::Snapshot("v1".to_string())));
        assert_eq!(params.new, Some(GraphSource::Spec(PathBuf::from("specs/v2.yaml"))));
    }

    #[test]
    fn test_unknown_source_kind_rejected() {
        let parsed: std::result::Result<BreakingChangeParams, _> =
            serde_json::from_value(json!({"old": {"url": "http://x"}, "new": {"snapshot": "a"}}));
        assert!(parsed.is_err());
    }
}
