use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::NormalizerConfig;
use crate::errors::{ApiGraphError, Result};
use crate::model::{
    EndpointDescriptor, EndpointKey, EndpointMetadata, HttpMethod, KnowledgeGraph,
    NormalizationNote, ParameterDescriptor, ParameterLocation, SchemaNode,
};
use crate::normalize::DeclaredNormalizer;

/// Accepted specification dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecVersion {
    #[serde(rename = "swagger-2.0")]
    Swagger2,
    #[serde(rename = "openapi-3.0")]
    OpenApi30,
    #[serde(rename = "openapi-3.1")]
    OpenApi31,
}

impl SpecVersion {
    fn is_swagger(self) -> bool {
        self == SpecVersion::Swagger2
    }
}

/// Descriptors and notes produced from one document.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub version: SpecVersion,
    pub descriptors: Vec<EndpointDescriptor>,
    pub notes: Vec<NormalizationNote>,
}

impl BuildOutput {
    /// Stamp every descriptor with `pass` and assemble a graph.
    ///
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

/// Parse JSON or YAML text into a JSON value.
///
/// Text whose first non-blank character is `{` is parsed as JSON, anything
/// else as YAML. Syntax errors carry the parser's line and column.
///
/// # Errors
///
/// Returns `ParseError` on malformed input.
pub fn parse_document(text: &str) -> Result<Value> {
    if text.trim_start().starts_with('{') {
        return serde_json::from_str(text).map_err(|e| ApiGraphError::ParseError {
            location: Some(format!("line {}, column {}", e.line(), e.column())),
            reason: e.to_string(),
        });
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| ApiGraphError::ParseError {
        location: e
            .location()
            .map(|l| format!("line {}, column {}", l.line(), l.column())),
        reason: e.to_string(),
    })?;
    yaml_to_json(yaml, "")
}

fn yaml_to_json(value: serde_yaml::Value, at: &str) -> Result<Value> {
    use serde_yaml::Value as Y;
    Ok(match value {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| ApiGraphError::ParseError {
                        location: Some(display_location(at)),
                        reason: format!("number {} is not representable", n),
                    })?
            }
        }
        Y::String(s) => Value::String(s),
        Y::Sequence(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| yaml_to_json(v, &format!("{}[{}]", at, i)))
                .collect::<Result<Vec<_>>>()?,
        ),
        Y::Mapping(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                // Status codes are commonly written as bare integers.
                let key = match k {
                    Y::String(s) => s,
                    Y::Number(n) => n.to_string(),
                    Y::Bool(b) => b.to_string(),
                    other => {
                        return Err(ApiGraphError::ParseError {
                            location: Some(display_location(at)),
                            reason: format!("unsupported mapping key {:?}", other),
                        })
                    }
                };
                let child = yaml_to_json(v, &child_location(at, &key))?;
                out.insert(key, child);
            }
            Value::Object(out)
        }
        Y::Tagged(tagged) => yaml_to_json(tagged.value, at)?,
    })
}

/// Determine the dialect from the `openapi`/`swagger` version tag.
///
/// # Errors
///
/// Returns `UnsupportedFormat` for a missing or unaccepted tag.
pub fn detect_version(doc: &Value) -> Result<SpecVersion> {
    fn tag(v: &Value) -> Option<String> {
        match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
    fn minor_of(version: &str, prefix: &str) -> bool {
        version == prefix || version.starts_with(&format!("{}.", prefix))
    }

    if let Some(raw) = doc.get("openapi") {
        let version = tag(raw).unwrap_or_else(|| raw.to_string());
        return if minor_of(&version, "3.0") {
            Ok(SpecVersion::OpenApi30)
        } else if minor_of(&version, "3.1") {
            Ok(SpecVersion::OpenApi31)
        } else {
            Err(ApiGraphError::UnsupportedFormat {
                version: format!("openapi {}", version),
            })
        };
    }
    if let Some(raw) = doc.get("swagger") {
        let version = tag(raw).unwrap_or_else(|| raw.to_string());
        return if version == "2.0" || version == "2" {
            Ok(SpecVersion::Swagger2)
        } else {
            Err(ApiGraphError::UnsupportedFormat {
                version: format!("swagger {}", version),
            })
        };
    }
    Err(ApiGraphError::UnsupportedFormat {
        version: "missing 'openapi' or 'swagger' version tag".to_string(),
    })
}

/// Builds descriptors from OpenAPI 3.x and Swagger 2.0 documents.
#[derive(Debug, Clone)]
pub struct SpecBuilder {
    max_depth: usize,
}

impl SpecBuilder {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }

    /// Parse and build from document text.
    ///
    /// # Errors
    ///
    /// `ParseError`, `UnsupportedFormat`, `DuplicateEndpoint` or `DuplicateParameter`.
    pub fn build_str(&self, text: &str) -> Result<BuildOutput> {
        let doc = parse_document(text)?;
        self.build(&doc)
    }

    /// Build from an already-parsed document.
    ///
    /// # Errors
    ///
    /// `ParseError`, `UnsupportedFormat`, `DuplicateEndpoint` or `DuplicateParameter`.
    pub fn build(&self, doc: &Value) -> Result<BuildOutput> {
        let root = doc.as_object().ok_or_else(|| parse_err("$", "document root must be an object"))?;
        let version = detect_version(doc)?;
        let mut normalizer = DeclaredNormalizer::new(doc, self.max_depth);
        let mut descriptors = Vec::new();
        let mut seen = BTreeSet::new();

        let paths = match root.get("paths") {
            None | Some(Value::Null) => return Ok(BuildOutput { version, descriptors, notes: Vec::new() }),
            Some(Value::Object(paths)) => paths,
            Some(_) => return Err(parse_err("paths", "must be an object")),
        };

        for (path, item) in paths {
            if path.starts_with("x-") {
                continue;
            }
            let item_loc = format!("paths.{}", path);
            if !path.starts_with('/') {
                return Err(parse_err(&item_loc, "path must start with '/'"));
            }
            let item = self.resolve_object(&normalizer, item, &item_loc)?;
            let inherited = parameter_list(item.get("parameters"), &format!("{}.parameters", item_loc))?;

            for method in HttpMethod::ALL {
                let name = method.as_str().to_ascii_lowercase();
                let Some(op) = item.get(&name) else {
                    continue;
                };
                let op_loc = format!("{}.{}", item_loc, name);
                let op = op
                    .as_object()
                    .ok_or_else(|| parse_err(&op_loc, "operation must be an object"))?;
                let key = EndpointKey::new(method, path);
                if !seen.insert(key.clone()) {
                    return Err(ApiGraphError::DuplicateEndpoint {
                        key: key.to_string(),
                    });
                }
                let descriptor =
                    self.build_operation(&mut normalizer, version, key, op, &inherited, &op_loc)?;
                descriptors.push(descriptor);
            }
        }

        let mut notes = normalizer.take_notes();
        notes.sort();
        notes.dedup();
        Ok(BuildOutput {
            version,
            descriptors,
            notes,
        })
    }

    fn build_operation(
        &self,
        normalizer: &mut DeclaredNormalizer<'_>,
        version: SpecVersion,
        key: EndpointKey,
        op: &Map<String, Value>,
        inherited: &[(Value, String)],
        op_loc: &str,
    ) -> Result<EndpointDescriptor> {
        let endpoint = key.to_string();
        let mut descriptor = EndpointDescriptor::new(key);
        descriptor.metadata = metadata_of(op);

        // Operation parameters override path-level ones with the same name and location.
        let own = parameter_list(op.get("parameters"), &format!("{}.parameters", op_loc))?;
        let mut merged: Vec<(Map<String, Value>, String)> = Vec::new();
        for (raw, loc) in inherited.iter().chain(own.iter()) {
            let param = self.resolve_object(normalizer, raw, loc)?.clone();
            let ident = param_identity(&param, loc)?;
            if let Some(slot) = merged
                .iter_mut()
                .find(|(p, l)| param_identity(p, l).ok().as_ref() == Some(&ident))
            {
                *slot = (param, loc.clone());
            } else {
                merged.push((param, loc.clone()));
            }
        }

        let mut form_fields = BTreeMap::new();
        let mut form_required = BTreeSet::new();
        for (param, loc) in &merged {
            let (name, location) = param_identity(param, loc)?;
            let field_path = format!("parameters.{}", name);
            match location.as_str() {
                "body" if version.is_swagger() => {
                    let schema = param.get("schema").cloned().unwrap_or(Value::Null);
                    descriptor.request_body = Some(normalizer.normalize(&schema, &endpoint, "requestBody"));
                }
                "formData" if version.is_swagger() => {
                    let node = normalizer.normalize(&Value::Object(param.clone()), &endpoint, &format!("requestBody.{}", name));
                    if is_required(param) {
                        form_required.insert(name.clone());
                    }
                    form_fields.insert(name, node);
                }
                other => {
                    let location = parse_location(other).ok_or_else(|| {
                        parse_err(loc, &format!("unsupported parameter location '{}'", other))
                    })?;
                    let schema = parameter_schema(param, version);
                    let node = match schema {
                        Some(schema) => normalizer.normalize(schema, &endpoint, &field_path),
                        None => normalizer.normalize(&Value::Object(param.clone()), &endpoint, &field_path),
                    };
                    let required = location == ParameterLocation::Path || is_required(param);
                    descriptor.add_parameter(ParameterDescriptor::new(name, location, node, required))?;
                }
            }
        }
        if !form_fields.is_empty() {
            descriptor.request_body = Some(SchemaNode::Object {
                fields: form_fields,
                required: form_required,
            });
        }

        if let Some(body) = op.get("requestBody") {
            let body_loc = format!("{}.requestBody", op_loc);
            let body = self.resolve_object(normalizer, body, &body_loc)?;
            if let Some(schema) = content_schema(body) {
                descriptor.request_body = Some(normalizer.normalize(schema, &endpoint, "requestBody"));
            } else {
                descriptor.request_body = Some(SchemaNode::Unknown);
            }
        }

        match op.get("responses") {
            None | Some(Value::Null) => {}
            Some(Value::Object(responses)) => {
                for (status, response) in responses {
                    if status.starts_with("x-") {
                        continue;
                    }
                    let resp_loc = format!("{}.responses.{}", op_loc, status);
                    let response = self.resolve_object(normalizer, response, &resp_loc)?;
                    let schema = if version.is_swagger() {
                        response.get("schema")
                    } else {
                        content_schema(response)
                    };
                    let node = match schema {
                        Some(schema) => normalizer.normalize(schema, &endpoint, &format!("responses.{}", status)),
                        None => SchemaNode::Unknown,
                    };
                    descriptor.responses.insert(status.clone(), node);
                }
            }
            Some(_) => {
                return Err(parse_err(&format!("{}.responses", op_loc), "must be an object"));
            }
        }

        Ok(descriptor)
    }

    /// Follow a local `$ref` (at most a few hops) and require an object.
    fn resolve_object<'v>(
        &self,
        normalizer: &DeclaredNormalizer<'v>,
        value: &'v Value,
        loc: &str,
    ) -> Result<&'v Map<String, Value>> {
        let mut current = value;
        for _ in 0..self.max_depth {
            let obj = current
                .as_object()
                .ok_or_else(|| parse_err(loc, "expected an object"))?;
            match obj.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    current = normalizer.resolve_ref(reference).ok_or_else(|| {
                        parse_err(loc, &format!("unresolved reference '{}'", reference))
                    })?;
                }
                None => return Ok(obj),
            }
        }
        Err(parse_err(loc, "reference chain too long"))
    }
}

fn parse_err(location: &str, reason: &str) -> ApiGraphError {
    ApiGraphError::ParseError {
        location: Some(location.to_string()),
        reason: reason.to_string(),
    }
}

fn display_location(at: &str) -> String {
    if at.is_empty() {
        "$".to_string()
    } else {
        at.to_string()
    }
}

fn child_location(at: &str, key: &str) -> String {
    if at.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", at, key)
    }
}

fn parameter_list(value: Option<&Value>, loc: &str) -> Result<Vec<(Value, String)>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), format!("{}[{}]", loc, i)))
            .collect()),
        Some(_) => Err(parse_err(loc, "parameters must be an array")),
    }
}

fn param_identity(param: &Map<String, Value>, loc: &str) -> Result<(String, String)> {
    let name = param
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_err(loc, "parameter is missing 'name'"))?;
    let location = param
        .get("in")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_err(loc, "parameter is missing 'in'"))?;
    Ok((name.to_string(), location.to_string()))
}

fn parse_location(raw: &str) -> Option<ParameterLocation> {
    match raw {
        "path" => Some(ParameterLocation::Path),
        "query" => Some(ParameterLocation::Query),
        "header" => Some(ParameterLocation::Header),
        "cookie" => Some(ParameterLocation::Cookie),
        _ => None,
    }
}

fn is_required(param: &Map<String, Value>) -> bool {
    param.get("required").and_then(Value::as_bool).unwrap_or(false)
}

fn parameter_schema(param: &Map<String, Value>, version: SpecVersion) -> Option<&Value> {
    if version.is_swagger() {
        return None;
    }
    param.get("schema").or_else(|| content_schema(param))
}

/// Pick the schema of the preferred media type under `content`.
fn content_schema(holder: &Map<String, Value>) -> Option<&Value> {
    let content = holder.get("content")?.as_object()?;
    let media = content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(mt, _)| mt.contains("json"))
                .map(|(_, v)| v)
        })
        .or_else(|| content.values().next())?;
    media.get("schema")
}

fn metadata_of(op: &Map<String, Value>) -> EndpointMetadata {
    let text = |field: &str| op.get(field).and_then(Value::as_str).map(str::to_string);
    EndpointMetadata {
        summary: text("summary"),
        description: text("description"),
        operation_id: text("operationId"),
        deprecated: op.get("deprecated").and_then(Value::as_bool).unwrap_or(false),
        tags: op
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
    }
}
