//! Drift classification: a knowledge graph against live-traffic observations.
//!
//! Observations are grouped by matched endpoint key before anything is
//! compared, so the result does not depend on arrival order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::builder::template_path;
use crate::config::DriftConfig;
use crate::diff::{diff_schema, BodyRole, SchemaDiffMode};
use crate::model::{
    ChangeKind, ChangeRecord, EndpointDescriptor, EndpointKey, KnowledgeGraph, Observation,
    SchemaNode, Severity,
};
use crate::normalize::SampleInference;

/// Why a declared endpoint is considered missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "evidence", rename_all = "snake_case")]
pub enum MissingEvidence {
    /// No observation matched the endpoint at all.
    NotObserved,
    /// Every response carried a not-found style status.
    NotFound { statuses: Vec<u16> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingEndpoint {
    pub endpoint: EndpointKey,
    #[serde(flatten)]
    pub evidence: MissingEvidence,
}

/// An observed route with no declared counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowEndpoint {
    /// Method plus templated path of the observed route.
    pub endpoint: EndpointKey,
    pub statuses: Vec<u16>,
    pub observations: usize,
    /// Distinct concrete paths seen, sorted.
    pub paths: Vec<String>,
}

/// Why a classification could not be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Every response was an authorization failure; "access denied" is not "missing".
    AuthorizationDenied,
    /// No call produced an HTTP response.
    TransportFailure,
    /// The server failed every call with a 5xx.
    ServerError,
    /// Responses were neither successful nor uniformly not-found.
    Inconclusive,
    /// An undeclared route answered only with failures.
    UnmatchedFailure,
}

/// Insufficient evidence. Always reported, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedEntry {
    pub endpoint: EndpointKey,
    pub reason: UnresolvedReason,
    pub statuses: Vec<u16>,
    pub observations: usize,
}

/// Everything the drift classification found.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftFindings {
    pub shadow: Vec<ShadowEndpoint>,
    pub missing: Vec<MissingEndpoint>,
    /// Breaking and minor mismatches only.
    pub schema_drift: Vec<ChangeRecord>,
    /// Comparisons the samples could not settle (e.g. an empty list against
    /// a declared element type). Never counted as drift.
    pub informational: Vec<ChangeRecord>,
    pub unresolved: Vec<UnresolvedEntry>,
    /// Declared endpoints with at least one successful observation.
    pub confirmed: usize,
}

impl DriftFindings {
    pub fn is_clean(&self) -> bool {
        self.shadow.is_empty() && self.missing.is_empty() && self.schema_drift.is_empty()
    }
}

/// Drift classification settings beyond [`DriftConfig`].
#[derive(Debug, Clone)]
pub struct DriftOptions {
    pub policy: DriftConfig,
    pub max_depth: usize,
    pub include_informational: bool,
}

/// Classify `observations` against `graph`.
pub fn analyze_drift(graph: &KnowledgeGraph, observations: &[Observation], options: &DriftOptions) -> DriftFindings {
    let policy = &options.policy;
    let mut matched: BTreeMap<&EndpointKey, Vec<&Observation>> = BTreeMap::new();
    let mut unmatched: BTreeMap<EndpointKey, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        match graph.match_request(obs.method, &obs.path) {
            Some(key) => matched.entry(key).or_default().push(obs),
            None => unmatched
                .entry(EndpointKey::new(obs.method, &template_path(&obs.path)))
                .or_default()
                .push(obs),
        }
    }

    let mut findings = DriftFindings::default();

    for (key, group) in unmatched {
        let statuses = statuses_of(&group);
        let evidences_route = statuses.iter().any(|s| {
            !policy.not_found_statuses.contains(s)
                && !policy.auth_failure_statuses.contains(s)
                && !(500..=599).contains(s)
        });
        if evidences_route {
            let paths: BTreeSet<String> = group.iter().map(|o| o.path.clone()).collect();
            findings.shadow.push(ShadowEndpoint {
                endpoint: key,
                statuses: statuses.into_iter().collect(),
                observations: group.len(),
                paths: paths.into_iter().collect(),
            });
        } else if !statuses.iter().all(|s| policy.not_found_statuses.contains(s)) || statuses.is_empty() {
            findings.unresolved.push(UnresolvedEntry {
                endpoint: key,
                reason: UnresolvedReason::UnmatchedFailure,
                statuses: statuses.into_iter().collect(),
                observations: group.len(),
            });
        }
    }

    for descriptor in graph.endpoints() {
        let key = &descriptor.key;
        let group = matched.get(key).map(Vec::as_slice).unwrap_or_default();
        if group.is_empty() {
            if policy.unobserved_is_missing {
                findings.missing.push(MissingEndpoint {
                    endpoint: key.clone(),
                    evidence: MissingEvidence::NotObserved,
                });
            }
            continue;
        }
        if group.iter().any(|o| o.is_success()) {
            findings.confirmed += 1;
            let (drift, informational) = schema_drift_for(descriptor, group, options);
            findings.schema_drift.extend(drift);
            if options.include_informational {
                findings.informational.extend(informational);
            }
            continue;
        }

        let statuses = statuses_of(group);
        let entry = |reason| UnresolvedEntry {
            endpoint: key.clone(),
            reason,
            statuses: statuses.iter().copied().collect(),
            observations: group.len(),
        };
        if statuses.is_empty() {
            findings.unresolved.push(entry(UnresolvedReason::TransportFailure));
        } else if statuses.iter().all(|s| policy.not_found_statuses.contains(s)) {
            findings.missing.push(MissingEndpoint {
                endpoint: key.clone(),
                evidence: MissingEvidence::NotFound {
                    statuses: statuses.iter().copied().collect(),
                },
            });
        } else if statuses.iter().all(|s| policy.auth_failure_statuses.contains(s)) {
            findings.unresolved.push(entry(UnresolvedReason::AuthorizationDenied));
        } else if statuses.iter().any(|s| (500..=599).contains(s)) {
            findings.unresolved.push(entry(UnresolvedReason::ServerError));
        } else {
            findings.unresolved.push(entry(UnresolvedReason::Inconclusive));
        }
    }

    findings
}

fn statuses_of(group: &[&Observation]) -> BTreeSet<u16> {
    group.iter().filter_map(|o| o.status).collect()
}

/// Compare merged successful response bodies with the declared schemas.
///
/// Returns the breaking/minor drift and, separately, the informational records.
fn schema_drift_for(
    descriptor: &EndpointDescriptor,
    group: &[&Observation],
    options: &DriftOptions,
) -> (Vec<ChangeRecord>, Vec<ChangeRecord>) {
    let mut by_status: BTreeMap<String, SampleInference> = BTreeMap::new();
    for obs in group.iter().filter(|o| o.is_success()) {
        let Some(status) = obs.status_key() else {
            continue;
        };
        let inference = by_status
            .entry(status)
            .or_insert_with(|| SampleInference::new(options.max_depth));
        if let Some(body) = &obs.body {
            inference.add(body);
        }
    }

    let mut out = Vec::new();
    let mut informational = Vec::new();
    for (status, inference) in by_status {
        let path = format!("responses.{}", status);
        let Some(declared) = declared_response(descriptor, &status) else {
            out.push(ChangeRecord::field(
                ChangeKind::Modified,
                descriptor.key.clone(),
                path,
                Severity::Minor,
                format!("undocumented success status {} observed", status),
            ));
            continue;
        };
        if inference.sample_count() == 0 {
            continue;
        }
        let observed = inference.finish();
        let records = diff_schema(
            &descriptor.key,
            &path,
            declared,
            &observed,
            SchemaDiffMode::Observation,
            BodyRole::Response,
        );
        for record in records {
            match record.severity {
                Severity::Breaking | Severity::Minor => out.push(record),
                Severity::Informational => informational.push(record),
                Severity::Patch => {}
            }
        }
    }
    (out, informational)
}

/// Declared schema for an observed status, falling back to `2XX` and `default`.
fn declared_response<'d>(descriptor: &'d EndpointDescriptor, status: &str) -> Option<&'d SchemaNode> {
    descriptor
        .responses
        .get(status)
        .or_else(|| descriptor.responses.get("2XX"))
        .or_else(|| descriptor.responses.get("default"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;
    use serde_json::json;

    fn options() -> DriftOptions {
        DriftOptions {
            policy: DriftConfig::default(),
            max_depth: 10,
            include_informational: true,
        }
    }

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::from_descriptors(vec![
            EndpointDescriptor::new(EndpointKey::new(HttpMethod::Get, "/users/{id}")).with_response(
                "200",
                SchemaNode::object([("id", SchemaNode::string())], ["id"]),
            ),
            EndpointDescriptor::new(EndpointKey::new(HttpMethod::Get, "/admin")),
        ])
        .unwrap()
    }

    #[test]
    fn test_auth_only_is_unresolved_not_missing() {
        let obs = vec![
            Observation::new(HttpMethod::Get, "/users/1", 200).with_body(json!({"id": "1"})),
            Observation::new(HttpMethod::Get, "/admin", 403),
            Observation::new(HttpMethod::Get, "/admin", 401),
        ];
        let f = analyze_drift(&graph(), &obs, &options());
        assert!(f.missing.is_empty());
        assert_eq!(f.unresolved.len(), 1);
        assert_eq!(f.unresolved[0].reason, UnresolvedReason::AuthorizationDenied);
        assert_eq!(f.confirmed, 1);
    }

    #[test]
    fn test_not_found_is_missing_with_evidence() {
        let obs = vec![Observation::new(HttpMethod::Get, "/admin", 404)];
        let f = analyze_drift(&graph(), &obs, &options());
        let admin = f.missing.iter().find(|m| m.endpoint.template() == "/admin").unwrap();
        assert_eq!(admin.evidence, MissingEvidence::NotFound { statuses: vec![404] });
        let users = f.missing.iter().find(|m| m.endpoint.template() == "/users/{id}").unwrap();
        assert_eq!(users.evidence, MissingEvidence::NotObserved);
    }

    #[test]
    fn test_shadow_endpoint_templated() {
        let obs = vec![
            Observation::new(HttpMethod::Get, "/orders/9", 200),
            Observation::new(HttpMethod::Get, "/orders/7", 200),
        ];
        let f = analyze_drift(&graph(), &obs, &options());
        assert_eq!(f.shadow.len(), 1);
        assert_eq!(f.shadow[0].endpoint.template(), "/orders/{orderId}");
        assert_eq!(f.shadow[0].paths, vec!["/orders/7", "/orders/9"]);
    }

    #[test]
    fn test_transport_failures_are_unresolved() {
        let obs = vec![Observation::transport_failure(HttpMethod::Get, "/admin", "connection refused")];
        let f = analyze_drift(&graph(), &obs, &options());
        assert_eq!(f.unresolved[0].reason, UnresolvedReason::TransportFailure);
        assert!(f.missing.iter().all(|m| m.endpoint.template() != "/admin"));
    }

    #[test]
    fn test_type_mismatch_is_schema_drift() {
        let obs = vec![Observation::new(HttpMethod::Get, "/users/1", 200).with_body(json!({"id": 1}))];
        let f = analyze_drift(&graph(), &obs, &options());
        assert_eq!(f.schema_drift.len(), 1);
        assert_eq!(f.schema_drift[0].field_path.as_deref(), Some("responses.200.id"));
        assert_eq!(f.schema_drift[0].severity, Severity::Breaking);
    }

    #[test]
    fn test_unsettled_comparison_is_informational_not_drift() {
        let g = KnowledgeGraph::from_descriptors(vec![EndpointDescriptor::new(EndpointKey::new(
            HttpMethod::Get,
            "/users",
        ))
        .with_response(
            "200",
            SchemaNode::array(SchemaNode::object([("id", SchemaNode::string())], ["id"])),
        )])
        .unwrap();
        let obs = vec![Observation::new(HttpMethod::Get, "/users", 200).with_body(json!([]))];

        let f = analyze_drift(&g, &obs, &options());
        assert!(f.schema_drift.is_empty());
        assert!(f.is_clean());
        assert_eq!(f.informational.len(), 1);
        assert_eq!(f.informational[0].field_path.as_deref(), Some("responses.200[]"));

        let quiet = DriftOptions {
            include_informational: false,
            ..options()
        };
        assert!(analyze_drift(&g, &obs, &quiet).informational.is_empty());
    }
}
