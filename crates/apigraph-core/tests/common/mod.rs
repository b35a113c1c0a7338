use apigraph_core::builder::SpecBuilder;
use apigraph_core::config::NormalizerConfig;
use apigraph_core::KnowledgeGraph;
use serde_json::{json, Value};

/// Build a graph from an inline OpenAPI 3.0 `paths` object.
#[allow(dead_code)]
pub fn graph_from_paths(paths: Value) -> KnowledgeGraph {
    graph_from_document(json!({"openapi": "3.0.3", "info": {"title": "t", "version": "1"}, "paths": paths}))
}

/// Build a graph from a complete inline document.
#[allow(dead_code)]
pub fn graph_from_document(doc: Value) -> KnowledgeGraph {
    SpecBuilder::new(&NormalizerConfig::default())
        .build(&doc)
        .unwrap()
        .into_graph(1)
        .unwrap()
}

/// JSON response body declaration for OpenAPI 3.x.
#[allow(dead_code)]
pub fn json_response(schema: Value) -> Value {
    json!({"description": "ok", "content": {"application/json": {"schema": schema}}})
}
