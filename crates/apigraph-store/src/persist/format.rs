//! Persisted graph document.
//!
//! ```json
//! {
//!   "endpoints": {
//!     "GET /users/{id}": { "parameters": [...], "requestBody": {...}, "responses": { "200": {...} } }
//!   },
//!   "edges": [ { "from": "POST /users", "to": "GET /users/{id}", "resource": "id", "type": "provides_identifier" } ]
//! }
//! ```
//!
//! Endpoints are keyed by `"<METHOD> <path-template>"` and stored in key order,
//! so the serialized text is canonical and can be digested directly.

use apigraph_core::errors::ApiGraphError;
use apigraph_core::model::{
    EndpointDescriptor, EndpointKey, EndpointMetadata, KnowledgeGraph, NormalizationNote,
    ParameterDescriptor, ResourceEdge, SchemaNode,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedGraph {
    pub endpoints: BTreeMap<String, PersistedEndpoint>,
    #[serde(default)]
    pub edges: Vec<ResourceEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<NormalizationNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEndpoint {
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<SchemaNode>,
    #[serde(default)]
    pub responses: BTreeMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "EndpointMetadata::is_empty")]
    pub metadata: EndpointMetadata,
    #[serde(default)]
    pub pass: u64,
}

impl From<&KnowledgeGraph> for PersistedGraph {
    fn from(graph: &KnowledgeGraph) -> Self {
        let endpoints = graph
            .endpoints()
            .map(|d| {
                (
                    d.key.to_string(),
                    PersistedEndpoint {
                        parameters: d.parameters.clone(),
                        request_body: d.request_body.clone(),
                        responses: d.responses.clone(),
                        metadata: d.metadata.clone(),
                        pass: d.pass,
                    },
                )
            })
            .collect();
        Self {
            endpoints,
            edges: graph.edges().to_vec(),
            notes: graph.notes().to_vec(),
        }
    }
}

impl PersistedGraph {
    /// Rebuild the in-memory graph.
    ///
    /// # Errors
    ///
    /// `ParseError` for a malformed endpoint key, `DuplicateEndpoint` when two
    /// keys normalize to the same shape, `DuplicateParameter` on a repeated name.
    pub fn into_graph(self) -> Result<KnowledgeGraph, ApiGraphError> {
        let mut descriptors = Vec::with_capacity(self.endpoints.len());
        for (rendered, endpoint) in self.endpoints {
            let key = EndpointKey::parse(&rendered).map_err(|e| ApiGraphError::ParseError {
                location: Some(format!("endpoints.{}", rendered)),
                reason: e.to_string(),
            })?;
            let mut descriptor = EndpointDescriptor::new(key).with_pass(endpoint.pass);
            descriptor.parameters = endpoint.parameters;
            descriptor.request_body = endpoint.request_body;
            descriptor.responses = endpoint.responses;
            descriptor.metadata = endpoint.metadata;
            descriptors.push(descriptor);
        }
        let mut graph = KnowledgeGraph::from_descriptors(descriptors)?;
        graph.set_edges(self.edges);
        graph.add_notes(self.notes);
        Ok(graph)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 over the compact canonical serialization, hex-encoded.
    pub fn digest(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Digest of a graph's persisted form.
///
/// # Errors
///
/// Fails only if serialization fails.
pub fn graph_digest(graph: &KnowledgeGraph) -> serde_json::Result<String> {
    PersistedGraph::from(graph).digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apigraph_core::model::{HttpMethod, ParameterLocation};
    use serde_json::json;

    fn sample_graph() -> KnowledgeGraph {
        let get = EndpointDescriptor::new(EndpointKey::new(HttpMethod::Get, "/users/{id}"))
            .with_parameter(ParameterDescriptor::new(
                "id",
                ParameterLocation::Path,
                SchemaNode::string(),
                true,
            ))
            .unwrap()
            .with_response(
                "200",
                SchemaNode::object([("id".to_string(), SchemaNode::string())], ["id".to_string()]),
            );
        let post = EndpointDescriptor::new(EndpointKey::new(HttpMethod::Post, "/users"))
            .with_response(
                "201",
                SchemaNode::object([("id".to_string(), SchemaNode::string())], ["id".to_string()]),
            );
        let mut graph = KnowledgeGraph::from_descriptors([get, post]).unwrap();
        graph.set_edges(vec![ResourceEdge::provides(
            EndpointKey::new(HttpMethod::Post, "/users"),
            EndpointKey::new(HttpMethod::Get, "/users/{id}"),
            "id",
        )]);
        graph
    }

    #[test]
    fn test_document_shape() {
        let value = serde_json::to_value(PersistedGraph::from(&sample_graph())).unwrap();
        assert_eq!(value["endpoints"]["GET /users/{id}"]["parameters"][0]["in"], json!("path"));
        assert_eq!(
            value["endpoints"]["POST /users"]["responses"]["201"]["kind"],
            json!("object")
        );
        assert_eq!(value["edges"][0]["type"], json!("provides_identifier"));
        assert_eq!(value["edges"][0]["from"], json!("POST /users"));
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn test_reload_is_equal() {
        let graph = sample_graph();
        let text = PersistedGraph::from(&graph).to_json_pretty().unwrap();
        let reloaded: PersistedGraph = serde_json::from_str(&text).unwrap();
        assert_eq!(reloaded.into_graph().unwrap(), graph);
    }

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let graph = sample_graph();
        let a = graph_digest(&graph).unwrap();
        assert_eq!(a, graph_digest(&graph.clone()).unwrap());
        assert_eq!(a.len(), 64);

        let mut other = graph.clone();
        other.set_edges(Vec::new());
        assert_ne!(a, graph_digest(&other).unwrap());
    }

    #[test]
    fn test_colliding_keys_rejected() {
        let doc = json!({
            "endpoints": {
                "GET /users/{id}": {},
                "GET /users/{userId}": {}
            }
        });
        let persisted: PersistedGraph = serde_json::from_value(doc).unwrap();
        assert!(matches!(
            persisted.into_graph(),
            Err(ApiGraphError::DuplicateEndpoint { .. })
        ));
    }
}
