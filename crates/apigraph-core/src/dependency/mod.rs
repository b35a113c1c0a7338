//! Dependency inference: which endpoints produce identifiers that others consume.
//!
//! Purely structural and explicitly heuristic. A creator's success-response
//! field names are reconciled against other endpoints' path placeholders;
//! every edge records the rule that matched and a confidence level.

use std::collections::BTreeSet;

use crate::config::DependencyConfig;
use crate::model::{
    Confidence, EdgeType, EndpointDescriptor, EndpointKey, KnowledgeGraph, MatchRule,
    ResourceEdge, SchemaNode,
};

/// Infer `provides_identifier` edges over `graph`, sorted by (from, to, resource).
pub fn infer_edges(graph: &KnowledgeGraph, config: &DependencyConfig) -> Vec<ResourceEdge> {
    let mut edges = Vec::new();
    for creator in graph
        .endpoints()
        .filter(|d| config.creation_methods.contains(&d.key.method()))
    {
        let fields = identifier_candidates(creator);
        if fields.is_empty() {
            continue;
        }
        for consumer in graph.endpoints() {
            if consumer.key == creator.key {
                continue;
            }
            for param in consumer.key.path_params() {
                let best = fields.iter().filter_map(|f| reconcile(f, param)).min();
                if let Some(rule) = best {
                    edges.push(ResourceEdge {
                        from: creator.key.clone(),
                        to: consumer.key.clone(),
                        resource: param.to_string(),
                        edge_type: EdgeType::ProvidesIdentifier,
                        rule: Some(rule),
                        confidence: Some(confidence(&creator.key, &consumer.key, param, rule)),
                    });
                }
            }
        }
    }
    edges.sort_by(|a, b| {
        (&a.from, &a.to, &a.resource).cmp(&(&b.from, &b.to, &b.resource))
    });
    edges.dedup_by(|a, b| a.from == b.from && a.to == b.to && a.resource == b.resource);
    edges
}

/// Field names reachable through objects (not arrays) in 2xx response bodies.
fn identifier_candidates(creator: &EndpointDescriptor) -> BTreeSet<String> {
    fn walk(node: &SchemaNode, out: &mut BTreeSet<String>) {
        if let SchemaNode::Object { fields, .. } = node {
            for (name, child) in fields {
                out.insert(name.clone());
                walk(child, out);
            }
        }
    }
    let mut out = BTreeSet::new();
    for (_, body) in creator.success_responses() {
        walk(body, &mut out);
    }
    out
}

/// Apply the reconciliation rules in order; the first that matches wins.
pub fn reconcile(field: &str, param: &str) -> Option<MatchRule> {
    if field.eq_ignore_ascii_case(param) {
        return Some(MatchRule::Exact);
    }
    if singular(field).eq_ignore_ascii_case(singular(param)) {
        return Some(MatchRule::Plural);
    }
    let (f, p) = (fold(field), fold(param));
    if f == p || singular(&f) == singular(&p) {
        return Some(MatchRule::CaseFold);
    }
    None
}

fn singular(name: &str) -> &str {
    match name.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem,
        _ => name,
    }
}

/// `user_id`, `user-id` and `userId` all fold to `userid`.
fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn confidence(creator: &EndpointKey, consumer: &EndpointKey, param: &str, rule: MatchRule) -> Confidence {
    let nested = consumer
        .template()
        .strip_prefix(creator.template())
        .is_some_and(|rest| rest.starts_with('/'));
    let generic = param.eq_ignore_ascii_case("id");
    match (rule, nested) {
        (MatchRule::Exact, true) => Confidence::High,
        (_, true) => Confidence::Medium,
        (MatchRule::Exact, false) if !generic => Confidence::Medium,
        _ => Confidence::Low,
    }
}
