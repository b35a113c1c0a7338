use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::key::EndpointKey;
use super::schema::SchemaNode;
use crate::errors::{ApiGraphError, Result};

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
        }
    }
}

/// A declared request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub schema: SchemaNode,
    #[serde(default)]
    pub required: bool,
}

impl ParameterDescriptor {
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        schema: SchemaNode,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            schema,
            required,
        }
    }
}

/// Non-structural endpoint documentation.
///
/// Differences confined to these fields are reported as `patch` changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl EndpointMetadata {
    pub fn is_empty(&self) -> bool {
        *self == EndpointMetadata::default()
    }

    /// Field-by-field differences as `(field, old, new)` in field-name order.
    pub fn differences(&self, other: &EndpointMetadata) -> Vec<(&'static str, String, String)> {
        fn show(v: &Option<String>) -> String {
            v.clone().unwrap_or_else(|| "<none>".to_string())
        }
        let mut out = Vec::new();
        if self.deprecated != other.deprecated {
            out.push((
                "deprecated",
                self.deprecated.to_string(),
                other.deprecated.to_string(),
            ));
        }
        if self.description != other.description {
            out.push(("description", show(&self.description), show(&other.description)));
        }
        if self.operation_id != other.operation_id {
            out.push(("operationId", show(&self.operation_id), show(&other.operation_id)));
        }
        if self.summary != other.summary {
            out.push(("summary", show(&self.summary), show(&other.summary)));
        }
        if self.tags != other.tags {
            out.push(("tags", self.tags.join(","), other.tags.join(",")));
        }
        out
    }
}

/// One endpoint of the API surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub key: EndpointKey,
    /// Declaration order is preserved; names are unique.
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<SchemaNode>,
    /// Response body schema by status code (`"200"`, `"2XX"`, `"default"`).
    #[serde(default)]
    pub responses: BTreeMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "EndpointMetadata::is_empty")]
    pub metadata: EndpointMetadata,
    /// Ingestion pass that produced this descriptor.
    #[serde(default)]
    pub pass: u64,
}

impl EndpointDescriptor {
    pub fn new(key: EndpointKey) -> Self {
        Self {
            key,
            parameters: Vec::new(),
            request_body: None,
            responses: BTreeMap::new(),
            metadata: EndpointMetadata::default(),
            pass: 0,
        }
    }

    /// Append a parameter, enforcing name uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateParameter` when the name is already declared.
    pub fn add_parameter(&mut self, parameter: ParameterDescriptor) -> Result<()> {
        if self.parameter(&parameter.name).is_some() {
            return Err(ApiGraphError::DuplicateParameter {
                endpoint: self.key.to_string(),
                name: parameter.name,
            });
        }
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Result<Self> {
        self.add_parameter(parameter)?;
        Ok(self)
    }

    pub fn with_request_body(mut self, body: SchemaNode) -> Self {
        self.request_body = Some(body);
        self
    }

    pub fn with_response(mut self, status: impl Into<String>, body: SchemaNode) -> Self {
        self.responses.insert(status.into(), body);
        self
    }

    pub fn with_pass(mut self, pass: u64) -> Self {
        self.pass = pass;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check the per-descriptor invariants (unique parameter names).
    ///
    /// # Errors
    ///
    /// Returns `DuplicateParameter` naming the first repeated parameter.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for p in &self.parameters {
            if !seen.insert(p.name.as_str()) {
                return Err(ApiGraphError::DuplicateParameter {
                    endpoint: self.key.to_string(),
                    name: p.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Response schemas for 2xx statuses, in status order.
    pub fn success_responses(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.responses
            .iter()
            .filter(|(status, _)| status.starts_with('2'))
    }
}
