//! Structural diff computation.
//!
//! The entry point is [`diff_graphs`]; [`diff_schema`] is exposed on its own
//! for comparing a declared schema against an observed one.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    ChangeKind, ChangeRecord, EndpointDescriptor, EndpointKey, KnowledgeGraph, ParameterDescriptor,
    ParameterLocation, ScalarKind, SchemaNode, Severity,
};
use crate::normalize::{items_path, join_path};

/// How the two sides of a schema comparison relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDiffMode {
    /// Old revision against new revision of a specification.
    Revision,
    /// Declared schema (old side) against a schema inferred from live samples
    /// (new side). Sparse sampling is tolerated: optional declared fields that
    /// were never observed, enumerations and observed `null`s are not drift.
    Observation,
}

/// Which direction a body flows; adding a required request field breaks callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRole {
    Request,
    Response,
}

#[derive(Clone, Copy)]
struct Context<'k> {
    subject: &'k EndpointKey,
    mode: SchemaDiffMode,
    role: BodyRole,
}

impl Context<'_> {
    /// Every record inside a surviving endpoint is a modification of that endpoint.
    fn record(&self, path: &str, severity: Severity, description: String) -> ChangeRecord {
        ChangeRecord::field(ChangeKind::Modified, self.subject.clone(), path, severity, description)
    }
}

/// Diff two graphs endpoint by endpoint.
pub fn diff_graphs(old: &KnowledgeGraph, new: &KnowledgeGraph) -> Vec<ChangeRecord> {
    diff_descriptors(old.endpoints(), new.endpoints())
}

/// Diff two descriptor sets.
///
/// Output order: removed endpoints, then modified endpoints, then added
/// endpoints, each group lexical by key; records of a modified endpoint are
/// ordered by field path.
pub fn diff_descriptors<'a>(
    old: impl IntoIterator<Item = &'a EndpointDescriptor>,
    new: impl IntoIterator<Item = &'a EndpointDescriptor>,
) -> Vec<ChangeRecord> {
    let old: BTreeMap<&EndpointKey, &EndpointDescriptor> = old.into_iter().map(|d| (&d.key, d)).collect();
    let new: BTreeMap<&EndpointKey, &EndpointDescriptor> = new.into_iter().map(|d| (&d.key, d)).collect();

    let mut removed = Vec::new();
    let mut modified = Vec::new();
    let mut added = Vec::new();

    for (key, old_desc) in &old {
        match new.get(key) {
            None => removed.push(ChangeRecord::endpoint(
                ChangeKind::Removed,
                (*key).clone(),
                Severity::Breaking,
                format!("endpoint {} removed", key),
            )),
            Some(new_desc) => modified.extend(diff_endpoint(old_desc, new_desc)),
        }
    }
    for key in new.keys() {
        if !old.contains_key(key) {
            added.push(ChangeRecord::endpoint(
                ChangeKind::Added,
                (*key).clone(),
                Severity::Minor,
                format!("endpoint {} added", key),
            ));
        }
    }

    let mut out = removed;
    out.extend(modified);
    out.extend(added);
    out
}

/// Diff two descriptors that share a key. Records are ordered by field path.
pub fn diff_endpoint(old: &EndpointDescriptor, new: &EndpointDescriptor) -> Vec<ChangeRecord> {
    let subject = &new.key;
    let ctx = Context {
        subject,
        mode: SchemaDiffMode::Revision,
        role: BodyRole::Request,
    };
    let mut out = Vec::new();

    // Path parameters pair by placeholder position; the key ignores their names.
    let mut paired: Vec<(&ParameterDescriptor, &ParameterDescriptor)> = Vec::new();
    for (old_name, new_name) in old.key.path_params().into_iter().zip(new.key.path_params()) {
        if old_name == new_name {
            continue;
        }
        let a = old.parameter(old_name).filter(|p| p.location == ParameterLocation::Path);
        let b = new.parameter(new_name).filter(|p| p.location == ParameterLocation::Path);
        if let (Some(a), Some(b)) = (a, b) {
            paired.push((a, b));
        }
    }
    for (a, b) in &paired {
        parameter_records(&ctx, &format!("parameters.{}", b.name), &b.name, a, b, &mut out);
    }
    let unpaired_old: Vec<&ParameterDescriptor> = old
        .parameters
        .iter()
        .filter(|p| !paired.iter().any(|(a, _)| std::ptr::eq(*a, *p)))
        .collect();
    let unpaired_new: Vec<&ParameterDescriptor> = new
        .parameters
        .iter()
        .filter(|p| !paired.iter().any(|(_, b)| std::ptr::eq(*b, *p)))
        .collect();

    // Remaining parameters, by name.
    let mut names: BTreeSet<&str> = unpaired_old.iter().map(|p| p.name.as_str()).collect();
    names.extend(unpaired_new.iter().map(|p| p.name.as_str()));
    for name in names {
        let path = format!("parameters.{}", name);
        match (find(&unpaired_old, name), find(&unpaired_new, name)) {
            (None, Some(p)) => {
                let (severity, label) = if p.required {
                    (Severity::Breaking, "required")
                } else {
                    (Severity::Minor, "optional")
                };
                out.push(ctx.record(
                    &path,
                    severity,
                    format!("{} {} parameter '{}' added", label, p.location.as_str(), name),
                ));
            }
            (Some(p), None) => out.push(ctx.record(
                &path,
                Severity::Breaking,
                format!("{} parameter '{}' removed", p.location.as_str(), name),
            )),
            (Some(a), Some(b)) => parameter_records(&ctx, &path, name, a, b, &mut out),
            (None, None) => {}
        }
    }

    // Request body.
    match (&old.request_body, &new.request_body) {
        (None, Some(body)) => {
            let severity = if body.has_required_fields() {
                Severity::Breaking
            } else {
                Severity::Minor
            };
            out.push(ctx.record(
                "requestBody",
                severity,
                "request body introduced".to_string(),
            ));
        }
        (Some(_), None) => out.push(ctx.record(
            "requestBody",
            Severity::Minor,
            "request body removed".to_string(),
        )),
        (Some(a), Some(b)) => schema_records(&ctx, "requestBody", a, b, &mut out),
        (None, None) => {}
    }

    // Responses, by status.
    let response_ctx = Context {
        role: BodyRole::Response,
        ..ctx
    };
    let mut statuses: BTreeSet<&String> = old.responses.keys().collect();
    statuses.extend(new.responses.keys());
    for status in statuses {
        let path = format!("responses.{}", status);
        match (old.responses.get(status), new.responses.get(status)) {
            (Some(_), None) => out.push(response_ctx.record(
                &path,
                Severity::Breaking,
                format!("response status {} removed", status),
            )),
            (None, Some(_)) => out.push(response_ctx.record(
                &path,
                Severity::Minor,
                format!("response status {} added", status),
            )),
            (Some(a), Some(b)) => schema_records(&response_ctx, &path, a, b, &mut out),
            (None, None) => {}
        }
    }

    // Metadata: descriptions, summaries and the like only ever rate a patch.
    for (field, before, after) in old.metadata.differences(&new.metadata) {
        out.push(ctx.record(
            &format!("metadata.{}", field),
            Severity::Patch,
            format!("{} changed from '{}' to '{}'", field, before, after),
        ));
    }

    out.sort_by(|a, b| {
        a.field_path
            .cmp(&b.field_path)
            .then_with(|| a.description.cmp(&b.description))
    });
    out
}

fn find<'p>(side: &[&'p ParameterDescriptor], name: &str) -> Option<&'p ParameterDescriptor> {
    side.iter().copied().find(|p| p.name == name)
}

/// Records for one parameter present on both sides.
fn parameter_records(
    ctx: &Context<'_>,
    path: &str,
    name: &str,
    a: &ParameterDescriptor,
    b: &ParameterDescriptor,
    out: &mut Vec<ChangeRecord>,
) {
    if a.location != b.location {
        out.push(ctx.record(
            path,
            Severity::Breaking,
            format!(
                "parameter '{}' moved from {} to {}",
                name,
                a.location.as_str(),
                b.location.as_str()
            ),
        ));
    }
    match (a.required, b.required) {
        (false, true) => out.push(ctx.record(
            path,
            Severity::Breaking,
            format!("parameter '{}' became required", name),
        )),
        (true, false) => out.push(ctx.record(
            path,
            Severity::Minor,
            format!("parameter '{}' became optional", name),
        )),
        _ => {}
    }
    schema_records(ctx, path, &a.schema, &b.schema, out);
}

/// Diff two schema trees rooted at `path` on `subject`.
///
/// Records come out in field-path order.
pub fn diff_schema(
    subject: &EndpointKey,
    path: &str,
    old: &SchemaNode,
    new: &SchemaNode,
    mode: SchemaDiffMode,
    role: BodyRole,
) -> Vec<ChangeRecord> {
    let ctx = Context {
        subject,
        mode,
        role,
    };
    let mut out = Vec::new();
    schema_records(&ctx, path, old, new, &mut out);
    out.sort_by(|a, b| {
        a.field_path
            .cmp(&b.field_path)
            .then_with(|| a.description.cmp(&b.description))
    });
    out
}

fn schema_records(ctx: &Context<'_>, path: &str, old: &SchemaNode, new: &SchemaNode, out: &mut Vec<ChangeRecord>) {
    if old == new {
        return;
    }
    match (old, new) {
        (SchemaNode::Unknown, _) | (_, SchemaNode::Unknown) => out.push(ctx.record(
            path,
            Severity::Informational,
            format!(
                "cannot compare {} with {}",
                old.type_label(),
                new.type_label()
            ),
        )),
        (
            SchemaNode::Scalar {
                scalar: a,
                values: va,
            },
            SchemaNode::Scalar {
                scalar: b,
                values: vb,
            },
        ) => {
            if a != b {
                let observed_null = ctx.mode == SchemaDiffMode::Observation
                    && (*a == ScalarKind::Null || *b == ScalarKind::Null);
                if observed_null {
                    out.push(ctx.record(
                        path,
                        Severity::Informational,
                        format!("observed {} where {} is declared", b.as_str(), a.as_str()),
                    ));
                } else {
                    out.push(ctx.record(
                        path,
                        Severity::Breaking,
                        format!("type changed from {} to {}", a.as_str(), b.as_str()),
                    ));
                }
            } else if ctx.mode == SchemaDiffMode::Revision {
                enum_records(ctx, path, va.as_ref(), vb.as_ref(), out);
            }
        }
        (SchemaNode::Array { items: a }, SchemaNode::Array { items: b }) => {
            schema_records(ctx, &items_path(path), a, b, out);
        }
        (
            SchemaNode::Object {
                fields: fa,
                required: ra,
            },
            SchemaNode::Object {
                fields: fb,
                required: rb,
            },
        ) => {
            let names: BTreeSet<&String> = fa.keys().chain(fb.keys()).collect();
            for name in names {
                let field_path = join_path(path, name);
                let was_required = ra.contains(name);
                let is_required = rb.contains(name);
                match (fa.get(name), fb.get(name)) {
                    (Some(_), None) => match ctx.mode {
                        SchemaDiffMode::Revision => out.push(ctx.record(
                            &field_path,
                            Severity::Breaking,
                            format!("field '{}' removed", name),
                        )),
                        SchemaDiffMode::Observation if was_required => out.push(ctx.record(
                            &field_path,
                            Severity::Breaking,
                            format!("required field '{}' never observed", name),
                        )),
                        SchemaDiffMode::Observation => {}
                    },
                    (None, Some(node)) => {
                        let severity = if ctx.mode == SchemaDiffMode::Revision
                            && ctx.role == BodyRole::Request
                            && is_required
                        {
                            Severity::Breaking
                        } else {
                            Severity::Minor
                        };
                        let verb = match ctx.mode {
                            SchemaDiffMode::Revision => "added",
                            SchemaDiffMode::Observation => "observed but not declared",
                        };
                        out.push(ctx.record(
                            &field_path,
                            severity,
                            format!("field '{}' {} ({})", name, verb, node.type_label()),
                        ));
                    }
                    (Some(a), Some(b)) => {
                        match (was_required, is_required, ctx.mode) {
                            (false, true, SchemaDiffMode::Revision) => out.push(ctx.record(
                                &field_path,
                                Severity::Breaking,
                                format!("field '{}' became required", name),
                            )),
                            (true, false, SchemaDiffMode::Revision) => out.push(ctx.record(
                                &field_path,
                                Severity::Minor,
                                format!("field '{}' became optional", name),
                            )),
                            (true, false, SchemaDiffMode::Observation) => out.push(ctx.record(
                                &field_path,
                                Severity::Breaking,
                                format!("required field '{}' absent from some responses", name),
                            )),
                            _ => {}
                        }
                        schema_records(ctx, &field_path, a, b, out);
                    }
                    (None, None) => {}
                }
            }
        }
        _ => out.push(ctx.record(
            path,
            Severity::Breaking,
            format!("type changed from {} to {}", old.type_label(), new.type_label()),
        )),
    }
}

fn enum_records(
    ctx: &Context<'_>,
    path: &str,
    old: Option<&BTreeSet<String>>,
    new: Option<&BTreeSet<String>>,
    out: &mut Vec<ChangeRecord>,
) {
    match (old, new) {
        (None, Some(values)) => out.push(ctx.record(
            path,
            Severity::Breaking,
            format!("values restricted to [{}]", join(values.iter())),
        )),
        (Some(_), None) => out.push(ctx.record(
            path,
            Severity::Minor,
            "value restriction removed".to_string(),
        )),
        (Some(a), Some(b)) => {
            let dropped: Vec<&String> = a.difference(b).collect();
            let gained: Vec<&String> = b.difference(a).collect();
            if !dropped.is_empty() {
                let mut description = format!("allowed values removed: [{}]", join(dropped.into_iter()));
                if !gained.is_empty() {
                    description.push_str(&format!("; added: [{}]", join(gained.into_iter())));
                }
                out.push(ctx.record(path, Severity::Breaking, description));
            } else if !gained.is_empty() {
                out.push(ctx.record(
                    path,
                    Severity::Minor,
                    format!("allowed values added: [{}]", join(gained.into_iter())),
                ));
            }
        }
        (None, None) => {}
    }
}

fn join<'a>(values: impl Iterator<Item = &'a String>) -> String {
    values.map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;

    fn key() -> EndpointKey {
        EndpointKey::new(HttpMethod::Get, "/orders")
    }

    #[test]
    fn test_enum_narrowing_is_breaking() {
        let old = SchemaNode::enumeration(ScalarKind::String, ["\"a\"", "\"b\""]);
        let new = SchemaNode::enumeration(ScalarKind::String, ["\"a\""]);
        let recs = diff_schema(&key(), "responses.200", &old, &new, SchemaDiffMode::Revision, BodyRole::Response);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Breaking);

        let recs = diff_schema(&key(), "responses.200", &new, &old, SchemaDiffMode::Revision, BodyRole::Response);
        assert_eq!(recs[0].severity, Severity::Minor);
    }

    #[test]
    fn test_unknown_is_informational() {
        let recs = diff_schema(
            &key(),
            "responses.200",
            &SchemaNode::string(),
            &SchemaNode::Unknown,
            SchemaDiffMode::Revision,
            BodyRole::Response,
        );
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Informational);
    }

    #[test]
    fn test_array_items_path() {
        let old = SchemaNode::array(SchemaNode::object([("id", SchemaNode::string())], ["id"]));
        let new = SchemaNode::array(SchemaNode::object([("id", SchemaNode::number())], ["id"]));
        let recs = diff_schema(&key(), "responses.200", &old, &new, SchemaDiffMode::Revision, BodyRole::Response);
        assert_eq!(recs[0].field_path.as_deref(), Some("responses.200[].id"));
        assert_eq!(recs[0].severity, Severity::Breaking);
    }

    #[test]
    fn test_required_request_field_added_is_breaking() {
        let old = SchemaNode::object([("name", SchemaNode::string())], ["name"]);
        let new = SchemaNode::object(
            [("name", SchemaNode::string()), ("email", SchemaNode::string())],
            ["name", "email"],
        );
        let recs = diff_schema(&key(), "requestBody", &old, &new, SchemaDiffMode::Revision, BodyRole::Request);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Breaking);
        let recs = diff_schema(&key(), "responses.200", &old, &new, SchemaDiffMode::Revision, BodyRole::Response);
        assert_eq!(recs[0].severity, Severity::Minor);
    }

    #[test]
    fn test_observation_mode_tolerates_sparse_samples() {
        let declared = SchemaNode::object(
            [
                ("id", SchemaNode::string()),
                ("nickname", SchemaNode::string()),
                ("status", SchemaNode::enumeration(ScalarKind::String, ["\"on\"", "\"off\""])),
            ],
            ["id", "status"],
        );
        let observed = SchemaNode::object([("id", SchemaNode::string()), ("status", SchemaNode::string())], ["id", "status"]);
        let recs = diff_schema(
            &key(),
            "responses.200",
            &declared,
            &observed,
            SchemaDiffMode::Observation,
            BodyRole::Response,
        );
        assert!(recs.is_empty(), "unexpected records: {recs:?}");
    }

    #[test]
    fn test_parameter_location_change_is_breaking() {
        let old = EndpointDescriptor::new(key())
            .with_parameter(ParameterDescriptor::new("v", ParameterLocation::Query, SchemaNode::string(), false))
            .unwrap();
        let new = EndpointDescriptor::new(key())
            .with_parameter(ParameterDescriptor::new("v", ParameterLocation::Header, SchemaNode::string(), false))
            .unwrap();
        let recs = diff_endpoint(&old, &new);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Breaking);
    }
}
