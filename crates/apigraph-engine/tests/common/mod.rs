#![allow(dead_code)]

use apigraph_core::config::EngineConfig;
use apigraph_engine::AnalyzerRegistry;
use apigraph_store::{GraphStore, MergePolicy};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<GraphStore>,
    pub registry: AnalyzerRegistry,
}

pub fn setup() -> Fixture {
    setup_with(EngineConfig::default())
}

pub fn setup_with(config: EngineConfig) -> Fixture {
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(
        GraphStore::open(dir.path().join("graphs"))
            .expect("open store")
            .with_normalizer(config.normalizer.clone()),
    );
    let registry = AnalyzerRegistry::with_defaults(store.clone(), &config);
    Fixture {
        dir,
        store,
        registry,
    }
}

pub fn ingest(fixture: &Fixture, name: &str, doc: &Value) {
    fixture
        .store
        .ingest_spec_str(name, &doc.to_string(), MergePolicy::Replace)
        .expect("ingest");
}

/// `GET /users`, `POST /users`, `GET /users/{id}`.
pub fn users_v1() -> Value {
    json!({
        "openapi": "3.0.3",
        "paths": {
            "/users": {
                "get": {
                    "parameters": [{"name": "page", "in": "query", "schema": {"type": "integer"}}],
                    "responses": {"200": {"description": "ok", "content": {"application/json": {
                        "schema": {"type": "array", "items": {"$ref": "#/components/schemas/User"}}
                    }}}}
                },
                "post": {
                    "requestBody": {"content": {"application/json": {"schema": {
                        "type": "object", "required": ["email"],
                        "properties": {"email": {"type": "string"}}
                    }}}},
                    "responses": {"201": {"description": "created", "content": {"application/json": {
                        "schema": {"type": "object", "required": ["id"], "properties": {"id": {"type": "string"}}}
                    }}}}
                }
            },
            "/users/{id}": {
                "get": {
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}],
                    "responses": {"200": {"description": "ok", "content": {"application/json": {
                        "schema": {"$ref": "#/components/schemas/User"}
                    }}}}
                }
            }
        },
        "components": {"schemas": {"User": {
            "type": "object",
            "required": ["id", "email"],
            "properties": {"id": {"type": "string"}, "email": {"type": "string"}}
        }}}
    })
}

/// v1 with `GET /users/{id}` removed and an optional `name` added to `User`.
pub fn users_v2() -> Value {
    let mut doc = users_v1();
    doc["paths"]
        .as_object_mut()
        .expect("paths")
        .remove("/users/{id}");
    doc["components"]["schemas"]["User"]["properties"]["name"] = json!({"type": "string"});
    doc
}
