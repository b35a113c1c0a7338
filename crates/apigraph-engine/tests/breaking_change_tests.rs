#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use apigraph_core::config::EngineConfig;
use apigraph_core::errors::ExErrorKind;
use apigraph_engine::analyzers::breaking::{BreakingChangeAnalyzer, BreakingChangeParams, GraphSource};
use common::{ingest, setup, users_v1, users_v2};
use serde_json::json;

#[test]
fn test_snapshot_to_snapshot() {
    let fx = setup();
    ingest(&fx, "v1", &users_v1());
    ingest(&fx, "v2", &users_v2());

    let result = fx
        .registry
        .invoke(
            "breaking_changes",
            &json!({"old": {"snapshot": "v1"}, "new": {"snapshot": "v2"}}),
        )
        .unwrap();

    assert_eq!(result["counts"]["breaking"], json!(1));
    assert_eq!(result["counts"]["minor"], json!(1));
    assert_eq!(result["counts"]["removed"], json!(1));
    assert_eq!(result["maxSeverity"], json!("breaking"));

    let entries = result["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["kind"], json!("removed"));
    assert_eq!(entries[0]["subject"], json!("GET /users/{id}"));
    assert_eq!(entries[1]["fieldPath"], json!("responses.200[].name"));

    assert_eq!(result["buckets"]["breaking"].as_array().unwrap().len(), 1);
    assert_eq!(
        result["summary"],
        json!("2 changes across 2 endpoints: 1 breaking, 1 minor (0 added, 1 removed)")
    );
    assert_eq!(result["inputs"]["old"], json!(fx.store.digest("v1").unwrap()));
}

#[test]
fn test_removed_endpoint_has_no_other_records() {
    let fx = setup();
    let analyzer = BreakingChangeAnalyzer::new(fx.store.clone(), &EngineConfig::default());
    let report = analyzer
        .analyze(BreakingChangeParams {
            old: Some(GraphSource::Document(users_v1())),
            new: Some(GraphSource::Document(users_v2())),
        })
        .unwrap();
    let about_removed: Vec<_> = report
        .entries
        .iter()
        .filter(|r| r.subject.to_string() == "GET /users/{id}")
        .collect();
    assert_eq!(about_removed.len(), 1);
    assert!(about_removed[0].is_breaking());
    assert!(report.has_breaking());
}

#[test]
fn test_self_comparison_is_empty() {
    let fx = setup();
    ingest(&fx, "v1", &users_v1());
    let result = fx
        .registry
        .invoke(
            "breaking_changes",
            &json!({"old": {"snapshot": "v1"}, "new": {"document": users_v1()}}),
        )
        .unwrap();
    assert_eq!(result["entries"], json!([]));
    assert_eq!(result["summary"], json!("No changes."));
    assert_eq!(result["inputs"]["old"], result["inputs"]["new"]);
}

#[test]
fn test_spec_file_source() {
    let fx = setup();
    let old_path = fx.dir.path().join("v1.json");
    let new_path = fx.dir.path().join("v2.json");
    std::fs::write(&old_path, users_v1().to_string()).unwrap();
    std::fs::write(&new_path, users_v2().to_string()).unwrap();

    let result = fx
        .registry
        .invoke(
            "breaking_changes",
            &json!({"old": {"spec": old_path}, "new": {"spec": new_path}}),
        )
        .unwrap();
    assert_eq!(result["counts"]["breaking"], json!(1));
    // Fresh spec ingestion does not touch the store.
    assert!(fx.store.list().unwrap().is_empty());
}

#[test]
fn test_unresolvable_side_is_missing_input() {
    let fx = setup();
    ingest(&fx, "v1", &users_v1());

    let err = fx
        .registry
        .invoke(
            "breaking_changes",
            &json!({"old": {"snapshot": "v1"}, "new": {"snapshot": "v9"}}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::MissingInput);
    assert!(err.message().contains("'new'"));
    assert_eq!(err.source_error().map(|e| e.kind()), Some(ExErrorKind::NotFound));
}

#[test]
fn test_failed_ingestion_of_one_side_is_not_no_changes() {
    let fx = setup();
    let err = fx
        .registry
        .invoke(
            "breaking_changes",
            &json!({
                "old": {"document": users_v1()},
                "new": {"document": {"openapi": "4.0.0", "paths": {}}}
            }),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::MissingInput);
    assert_eq!(
        err.source_error().map(|e| e.kind()),
        Some(ExErrorKind::UnsupportedFormat)
    );
}

#[test]
fn test_absent_side_is_missing_input() {
    let fx = setup();
    let err = fx
        .registry
        .invoke("breaking_changes", &json!({"old": {"document": users_v1()}}))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::MissingInput);
    assert!(err.message().contains("'new'"));
}

#[test]
fn test_informational_records_can_be_suppressed() {
    let untyped = json!({"openapi": "3.0.0", "paths": {"/a": {"get": {"responses": {
        "200": {"description": "ok", "content": {"application/json": {"schema": {
            "type": "object", "properties": {"v": {}}
        }}}}
    }}}}});
    let typed = json!({"openapi": "3.0.0", "paths": {"/a": {"get": {"responses": {
        "200": {"description": "ok", "content": {"application/json": {"schema": {
            "type": "object", "properties": {"v": {"type": "string"}}
        }}}}
    }}}}});
    let params = json!({"old": {"document": untyped}, "new": {"document": typed}});

    let fx = setup();
    let with = fx.registry.invoke("breaking_changes", &params).unwrap();
    assert_eq!(with["counts"]["informational"], json!(1));

    let mut config = EngineConfig::default();
    config.diff.include_informational = false;
    let quiet = common::setup_with(config);
    let without = quiet.registry.invoke("breaking_changes", &params).unwrap();
    assert_eq!(without["entries"], json!([]));
}
