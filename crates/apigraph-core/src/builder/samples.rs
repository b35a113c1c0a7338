//! Descriptors from live request/response samples.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::NormalizerConfig;
use crate::errors::Result;
use crate::model::{
    EndpointDescriptor, EndpointKey, KnowledgeGraph, NormalizationNote, NoteReason, Observation,
    ParameterDescriptor, ParameterLocation, SchemaNode,
};
use crate::model::key::normalize_path;
use crate::normalize::SampleInference;

/// Descriptors inferred from samples, plus the keys that were dropped.
#[derive(Debug, Clone, Default)]
pub struct SampleOutput {
    pub descriptors: Vec<EndpointDescriptor>,
    pub notes: Vec<NormalizationNote>,
    /// Groups with no successful response; no descriptor is produced for them.
    pub excluded: Vec<EndpointKey>,
}

impl SampleOutput {
    /// # Errors
    ///
    /// Propagates key or parameter uniqueness violations.
    pub fn into_graph(self, pass: u64) -> Result<KnowledgeGraph> {
        let mut graph = KnowledgeGraph::from_descriptors(
            self.descriptors.into_iter().map(|d| d.with_pass(pass)),
        )?;
        graph.add_notes(self.notes);
        Ok(graph)
    }
}

/// Replace identifier-like segments of a concrete path with named placeholders.
///
/// `/users/42/orders/7` becomes `/users/{userId}/orders/{orderId}`; a leading
/// identifier becomes `{id}`.
pub fn template_path(concrete: &str) -> String {
    let normalized = normalize_path(concrete);
    let mut used = BTreeSet::new();
    let mut previous_literal: Option<&str> = None;
    let mut out = Vec::new();
    for segment in normalized.split('/').filter(|s| !s.is_empty()) {
        if looks_like_identifier(segment) {
            let base = previous_literal
                .map(|collection| format!("{}Id", camel_singular(collection)))
                .unwrap_or_else(|| "id".to_string());
            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{}{}", base, n);
                n += 1;
            }
            out.push(format!("{{{}}}", name));
            previous_literal = None;
        } else {
            out.push(segment.to_string());
            previous_literal = Some(segment);
        }
    }
    format!("/{}", out.join("/"))
}

fn looks_like_identifier(segment: &str) -> bool {
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if is_uuid(segment) {
        return true;
    }
    segment.len() >= 16
        && segment.chars().all(|c| c.is_ascii_alphanumeric())
        && segment.chars().any(|c| c.is_ascii_digit())
}

fn is_uuid(segment: &str) -> bool {
    let groups: Vec<&str> = segment.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

/// `user-accounts` → `userAccount`, `categories` → `category`.
fn camel_singular(collection: &str) -> String {
    let singular = if let Some(stem) = collection.strip_suffix("ies") {
        format!("{}y", stem)
    } else if collection.ends_with("ss") {
        collection.to_string()
    } else {
        collection.strip_suffix('s').unwrap_or(collection).to_string()
    };
    let mut out = String::new();
    for (i, word) in singular
        .split(['-', '_', '.'])
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        "resource".to_string()
    } else {
        out
    }
}

/// Builds descriptors from observations grouped by method and templated path.
#[derive(Debug, Clone)]
pub struct SampleBuilder {
    max_depth: usize,
}

impl SampleBuilder {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }

    pub fn build(&self, observations: &[Observation]) -> SampleOutput {
        let mut groups: BTreeMap<EndpointKey, Vec<&Observation>> = BTreeMap::new();
        for obs in observations {
            let key = EndpointKey::new(obs.method, &template_path(&obs.path));
            groups.entry(key).or_default().push(obs);
        }

        let mut output = SampleOutput::default();
        for (key, group) in groups {
            let successes: Vec<&Observation> = group.iter().copied().filter(|o| o.is_success()).collect();
            if successes.is_empty() {
                output.excluded.push(key);
                continue;
            }
            let endpoint = key.to_string();
            let mut descriptor = EndpointDescriptor::new(key.clone());

            for name in key.path_params() {
                descriptor.parameters.push(ParameterDescriptor::new(
                    name,
                    ParameterLocation::Path,
                    SchemaNode::string(),
                    true,
                ));
            }
            let mut query_seen: BTreeMap<String, usize> = BTreeMap::new();
            for obs in &successes {
                for name in obs.query_names() {
                    *query_seen.entry(name).or_insert(0) += 1;
                }
            }
            for (name, count) in query_seen {
                if descriptor.parameter(&name).is_some() {
                    continue;
                }
                descriptor.parameters.push(ParameterDescriptor::new(
                    name,
                    ParameterLocation::Query,
                    SchemaNode::string(),
                    count == successes.len(),
                ));
            }

            let mut by_status: BTreeMap<String, SampleInference> = BTreeMap::new();
            for obs in &group {
                let Some(status) = obs.status_key() else {
                    continue;
                };
                let inference = by_status
                    .entry(status)
                    .or_insert_with(|| SampleInference::new(self.max_depth));
                if let Some(body) = &obs.body {
                    inference.add(body);
                }
            }
            for (status, inference) in by_status {
                if inference.is_truncated() {
                    output.notes.push(NormalizationNote {
                        endpoint: endpoint.clone(),
                        field_path: format!("responses.{}", status),
                        reason: NoteReason::DepthLimit,
                        detail: format!("sample nesting deeper than {} collapsed to unknown", self.max_depth),
                    });
                }
                descriptor.responses.insert(status, inference.finish());
            }
            output.descriptors.push(descriptor);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;
    use serde_json::json;

    #[test]
    fn test_template_path_names_after_collection() {
        assert_eq!(template_path("/users/42/orders/7"), "/users/{userId}/orders/{orderId}");
        assert_eq!(template_path("/42"), "/{id}");
        assert_eq!(template_path("/categories/9"), "/categories/{categoryId}");
        assert_eq!(
            template_path("/items/3f2504e0-4f89-11d3-9a0c-0305e82c3301?x=1"),
            "/items/{itemId}"
        );
        assert_eq!(template_path("/users/me"), "/users/me");
    }

    #[test]
    fn test_template_path_disambiguates_repeats() {
        assert_eq!(template_path("/1/2"), "/{id}/{id2}");
    }

    #[test]
    fn test_failed_groups_are_excluded() {
        let builder = SampleBuilder::new(&NormalizerConfig::default());
        let out = builder.build(&[
            Observation::transport_failure(HttpMethod::Get, "/health", "timeout"),
            Observation::new(HttpMethod::Get, "/users/1", 200).with_body(json!({"id": "1"})),
        ]);
        assert_eq!(out.descriptors.len(), 1);
        assert_eq!(out.excluded.len(), 1);
        assert_eq!(out.excluded[0].template(), "/health");
        let d = &out.descriptors[0];
        assert_eq!(d.key.template(), "/users/{userId}");
        assert!(d.parameter("userId").unwrap().required);
        assert_eq!(
            d.responses.get("200"),
            Some(&SchemaNode::object([("id", SchemaNode::string())], ["id"]))
        );
    }

    #[test]
    fn test_query_string_in_path_infers_parameters() {
        let builder = SampleBuilder::new(&NormalizerConfig::default());
        let out = builder.build(&[
            Observation::new(HttpMethod::Get, "/users?page=1&sort=name", 200),
            Observation::new(HttpMethod::Get, "/users?page=2", 200),
        ]);
        let d = &out.descriptors[0];
        assert_eq!(d.key.template(), "/users");
        let page = d.parameter("page").unwrap();
        assert_eq!(page.location, ParameterLocation::Query);
        assert!(page.required);
        assert!(!d.parameter("sort").unwrap().required);
    }
}
