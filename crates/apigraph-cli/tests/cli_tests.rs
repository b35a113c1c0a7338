#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SPEC: &str = r#"{
    "openapi": "3.0.3",
    "paths": {
        "/users": {"post": {"responses": {"201": {"description": "created", "content": {"application/json": {
            "schema": {"type": "object", "properties": {"id": {"type": "string"}}}
        }}}}}},
        "/users/{id}": {"get": {
            "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}],
            "responses": {"200": {"description": "ok"}}
        }}
    }
}"#;

fn apigraph(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_apigraph"))
        .arg("--store")
        .arg(store)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("run apigraph")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("json on stdout")
}

#[test]
fn test_tools_lists_default_analyzers() {
    let dir = TempDir::new().unwrap();
    let out = apigraph(&dir.path().join("graphs"), &["tools"]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let names: Vec<&str> = text
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    assert_eq!(names, vec!["breaking_changes", "drift", "dependencies"]);
}

#[test]
fn test_ingest_then_deps() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("graphs");
    let spec = dir.path().join("users.json");
    std::fs::write(&spec, SPEC).unwrap();

    let out = apigraph(&store, &["ingest", "users", "--spec", spec.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout_json(&out)["endpoints"], serde_json::json!(2));

    let out = apigraph(&store, &["deps", "users"]);
    assert!(out.status.success());
    let report = stdout_json(&out);
    assert_eq!(report["counts"]["edges"], serde_json::json!(1));
    assert_eq!(report["entries"][0]["resource"], serde_json::json!("id"));
}

#[test]
fn test_diff_fail_on_breaking_exit_code() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("graphs");
    let old = dir.path().join("old.json");
    let new = dir.path().join("new.json");
    std::fs::write(&old, SPEC).unwrap();
    std::fs::write(&new, r#"{"openapi": "3.0.3", "paths": {}}"#).unwrap();

    let out = apigraph(
        &store,
        &[
            "diff",
            "--old",
            old.to_str().unwrap(),
            "--new",
            new.to_str().unwrap(),
            "--fail-on-breaking",
        ],
    );
    assert_eq!(out.status.code(), Some(2));
    assert_eq!(stdout_json(&out)["counts"]["removed"], serde_json::json!(2));
}

#[test]
fn test_unknown_analyzer_fails() {
    let dir = TempDir::new().unwrap();
    let out = apigraph(&dir.path().join("graphs"), &["run", "lint"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("ERR_UNKNOWN_ANALYZER"));
}
