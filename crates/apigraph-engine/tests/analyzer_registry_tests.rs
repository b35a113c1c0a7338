#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use apigraph_core::apigraph_core_types::schema::{EVENT_END, EVENT_END_ERROR, FIELD_ERR_CODE};
use apigraph_core::errors::ExErrorKind;
use apigraph_core::logging_facility::init_test_capture;
use apigraph_engine::analyzer::Analyzer;
use apigraph_engine::Result;
use common::{ingest, setup, users_v1};
use serde_json::{json, Value};

struct Echo;

impl Analyzer for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn description(&self) -> &'static str {
        "Return the parameters unchanged"
    }

    fn run(&self, params: &Value) -> Result<Value> {
        Ok(params.clone())
    }
}

#[test]
fn test_defaults_in_registration_order() {
    let fx = setup();
    let names: Vec<_> = fx.registry.describe().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["breaking_changes", "drift", "dependencies"]);
    assert!(fx.registry.describe().iter().all(|i| !i.description.is_empty()));
}

#[test]
fn test_unknown_analyzer() {
    let fx = setup();
    let err = fx.registry.invoke("lint", &json!({})).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::UnknownAnalyzer);
    assert!(err.request_id().is_some());
}

#[test]
fn test_params_must_be_object() {
    let fx = setup();
    let err = fx.registry.invoke("drift", &json!(["users"])).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_malformed_params_are_invalid_input() {
    let fx = setup();
    let err = fx
        .registry
        .invoke("dependencies", &json!({"graph": "users", "persist": "yes"}))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(err.op(), Some("dependencies"));
}

#[test]
fn test_custom_analyzer_registration() {
    let mut fx = setup();
    fx.registry.register(Box::new(Echo));
    let out = fx.registry.invoke("echo", &json!({"a": 1})).unwrap();
    assert_eq!(out, json!({"a": 1}));
    assert_eq!(fx.registry.describe().len(), 4);
}

#[test]
fn test_invocation_is_logged_with_request_id() {
    let capture = init_test_capture();
    let fx = setup();
    ingest(&fx, "users", &users_v1());

    fx.registry
        .invoke("dependencies", &json!({"graph": "users"}))
        .unwrap();
    let _ = fx.registry.invoke("no_such_tool_logged", &json!({}));

    let events = capture.events_for("invoke_analyzer");
    let end = events
        .iter()
        .find(|e| {
            e.event.as_deref() == Some(EVENT_END)
                && e.fields.get("analyzer").map(String::as_str) == Some("dependencies")
        })
        .expect("end event");
    assert!(end.fields.contains_key("request_id"));
    assert!(end.fields.contains_key("duration_ms"));

    let failed = events
        .iter()
        .find(|e| {
            e.event.as_deref() == Some(EVENT_END_ERROR)
                && e.fields.get("analyzer").map(String::as_str) == Some("no_such_tool_logged")
        })
        .expect("error event");
    assert_eq!(
        failed.fields.get(FIELD_ERR_CODE).map(String::as_str),
        Some("ERR_UNKNOWN_ANALYZER")
    );
}
