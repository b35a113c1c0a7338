#![allow(clippy::unwrap_used, clippy::expect_used)]

use apigraph_core::errors::ExErrorKind;
use apigraph_core::model::{EndpointKey, HttpMethod, Observation, ResourceEdge};
use apigraph_store::{GraphStore, MergePolicy};
use serde_json::json;
use tempfile::TempDir;

const PETSTORE_V1: &str = r##"
openapi: 3.0.3
info: {title: Petstore, version: "1"}
paths:
  /pets:
    get:
      summary: List pets
      parameters:
        - {name: limit, in: query, schema: {type: integer}}
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: {$ref: "#/components/schemas/Pet"}
    post:
      requestBody:
        content:
          application/json:
            schema: {$ref: "#/components/schemas/Pet"}
      responses:
        "201":
          description: created
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Pet"}
  /pets/{petId}:
    get:
      parameters:
        - {name: petId, in: path, required: true, schema: {type: string}}
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Pet"}
components:
  schemas:
    Pet:
      type: object
      required: [id, name]
      properties:
        id: {type: string}
        name: {type: string}
        status: {type: string, enum: [available, sold]}
"##;

const ORDERS: &str = r#"{
    "openapi": "3.1.0",
    "paths": {
        "/orders": {"get": {"responses": {"200": {"description": "ok"}}}}
    }
}"#;

fn setup() -> (GraphStore, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let store = GraphStore::open(dir.path().join("graphs")).unwrap();
    (store, dir)
}

#[test]
fn test_persist_and_reload_equal() {
    let (store, dir) = setup();
    let report = store
        .ingest_spec_str("petstore", PETSTORE_V1, MergePolicy::Replace)
        .unwrap();
    assert_eq!(report.endpoints, 3);
    assert_eq!(report.pass, 1);

    let original = store.load("petstore").unwrap();

    // A fresh store has no cache and must rebuild from the document alone.
    let reopened = GraphStore::open(dir.path().join("graphs")).unwrap();
    let reloaded = reopened.load("petstore").unwrap();

    assert_eq!(*reloaded, *original);
    assert_eq!(reopened.digest("petstore").unwrap(), report.digest);
}

#[test]
fn test_persisted_document_shape() {
    let (store, _dir) = setup();
    store
        .ingest_spec_str("petstore", PETSTORE_V1, MergePolicy::Replace)
        .unwrap();
    let text = std::fs::read_to_string(store.graph_path("petstore").unwrap()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();

    let get_pet = &doc["endpoints"]["GET /pets/{petId}"];
    assert_eq!(get_pet["parameters"][0]["name"], json!("petId"));
    assert_eq!(get_pet["responses"]["200"]["kind"], json!("object"));
    assert_eq!(doc["endpoints"]["POST /pets"]["requestBody"]["kind"], json!("object"));
    assert_eq!(doc["edges"], json!([]));
}

#[test]
fn test_failed_ingest_leaves_store_untouched() {
    let (store, _dir) = setup();
    store
        .ingest_spec_str("petstore", PETSTORE_V1, MergePolicy::Replace)
        .unwrap();
    let path = store.graph_path("petstore").unwrap();
    let before = std::fs::read(&path).unwrap();

    let bad = r#"{"swagger": "1.2", "paths": {}}"#;
    let err = store
        .ingest_spec_str("petstore", bad, MergePolicy::Replace)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::UnsupportedFormat);

    let malformed = "openapi: 3.0.0\npaths: [unclosed";
    let err = store
        .ingest_spec_str("petstore", malformed, MergePolicy::Merge)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Parse);

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(store.load("petstore").unwrap().len(), 3);
}

#[test]
fn test_failed_first_ingest_creates_nothing() {
    let (store, _dir) = setup();
    let dup = r#"{"openapi": "3.0.0", "paths": {
        "/users/{id}": {"get": {"responses": {}}},
        "/users/{userId}": {"get": {"responses": {}}}
    }}"#;
    let err = store.ingest_spec_str("users", dup, MergePolicy::Replace).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::DuplicateEndpoint);
    assert!(!store.exists("users"));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_merge_keeps_unseen_endpoints_and_replace_drops_them() {
    let (store, _dir) = setup();
    store
        .ingest_spec_str("shop", PETSTORE_V1, MergePolicy::Replace)
        .unwrap();

    let merged = store.ingest_spec_str("shop", ORDERS, MergePolicy::Merge).unwrap();
    assert_eq!(merged.pass, 2);
    assert_eq!(merged.endpoints, 4);
    assert_eq!(merged.merge.inserted, 1);

    let graph = store.load("shop").unwrap();
    let orders = graph
        .get(&EndpointKey::new(HttpMethod::Get, "/orders"))
        .unwrap();
    assert_eq!(orders.pass, 2);
    let pets = graph.get(&EndpointKey::new(HttpMethod::Get, "/pets")).unwrap();
    assert_eq!(pets.pass, 1);

    let replaced = store.ingest_spec_str("shop", ORDERS, MergePolicy::Replace).unwrap();
    assert_eq!(replaced.endpoints, 1);
    assert_eq!(replaced.pass, 3);
}

#[test]
fn test_ingest_observations_templates_paths() {
    let (store, _dir) = setup();
    let observations = vec![
        Observation::new(HttpMethod::Get, "/users/42", 200).with_body(json!({"id": "42", "name": "a"})),
        Observation::new(HttpMethod::Get, "/users/7", 200).with_body(json!({"id": "7"})),
        Observation::new(HttpMethod::Delete, "/users/7", 500),
    ];
    let report = store
        .ingest_observations("live", &observations, MergePolicy::Replace)
        .unwrap();
    assert_eq!(report.endpoints, 1);
    assert_eq!(report.excluded, vec![EndpointKey::new(HttpMethod::Delete, "/users/{userId}")]);
    assert!(report.format.is_none());

    let graph = store.load("live").unwrap();
    let key = graph
        .match_request(HttpMethod::Get, "/users/99")
        .cloned()
        .unwrap();
    assert_eq!(key.template(), "/users/{userId}");
}

#[test]
fn test_ingest_observations_file_jsonl() {
    let (store, dir) = setup();
    let path = dir.path().join("traffic.jsonl");
    std::fs::write(
        &path,
        "{\"method\":\"GET\",\"path\":\"/health\",\"status\":200,\"body\":{\"ok\":true}}\n",
    )
    .unwrap();
    let report = store
        .ingest_observations_file("live", &path, MergePolicy::Replace)
        .unwrap();
    assert_eq!(report.endpoints, 1);
}

#[test]
fn test_load_missing_graph_is_not_found() {
    let (store, _dir) = setup();
    let err = store.load("ghost").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_corrupt_document_is_storage_error() {
    let (store, _dir) = setup();
    let path = store.graph_path("broken").unwrap();
    std::fs::write(&path, "{\"endpoints\": {\"FETCH /x\": {}}}").unwrap();
    let err = store.load("broken").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Storage);
    assert_eq!(err.location(), Some(path.display().to_string().as_str()));
}

#[test]
fn test_invalid_graph_name_rejected() {
    let (store, _dir) = setup();
    let err = store
        .ingest_spec_str("../outside", ORDERS, MergePolicy::Replace)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_list_is_sorted() {
    let (store, _dir) = setup();
    store.ingest_spec_str("zeta", ORDERS, MergePolicy::Replace).unwrap();
    store.ingest_spec_str("alpha", ORDERS, MergePolicy::Replace).unwrap();
    assert_eq!(store.list().unwrap(), vec!["alpha".to_string(), "zeta".to_string()]);
}

#[test]
fn test_replace_edges_persists_and_prunes() {
    let (store, dir) = setup();
    store
        .ingest_spec_str("petstore", PETSTORE_V1, MergePolicy::Replace)
        .unwrap();
    let post = EndpointKey::new(HttpMethod::Post, "/pets");
    let get = EndpointKey::new(HttpMethod::Get, "/pets/{petId}");
    let dangling = EndpointKey::new(HttpMethod::Get, "/nowhere/{id}");
    store
        .replace_edges(
            "petstore",
            vec![
                ResourceEdge::provides(post.clone(), get.clone(), "petId"),
                ResourceEdge::provides(post.clone(), dangling, "id"),
            ],
        )
        .unwrap();

    let reopened = GraphStore::open(dir.path().join("graphs")).unwrap();
    let graph = reopened.load("petstore").unwrap();
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.edges()[0].from, post);
    assert_eq!(graph.requirements_of(&get).len(), 1);
}

#[test]
fn test_spec_file_error_names_file() {
    let (store, dir) = setup();
    let path = dir.path().join("v9.json");
    std::fs::write(&path, r#"{"openapi": "9.0.0", "paths": {}}"#).unwrap();
    let err = store
        .ingest_spec_file("api", &path, MergePolicy::Replace)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::UnsupportedFormat);
    assert!(err.message().contains("v9.json"));

    let missing = dir.path().join("absent.yaml");
    let err = store
        .ingest_spec_file("api", &missing, MergePolicy::Replace)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Io);
}
