use serde::{Deserialize, Serialize};

use super::key::EndpointKey;

/// What happened to the subject between the two compared sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Modified => "modified",
        }
    }
}

/// Severity tier of a change.
///
/// Variant order is precedence order, so `Ord::max` yields the endpoint-level
/// severity: breaking > minor > patch > informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Comparison against `Unknown`; suppressible.
    Informational,
    Patch,
    Minor,
    Breaking,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Informational => "informational",
            Severity::Patch => "patch",
            Severity::Minor => "minor",
            Severity::Breaking => "breaking",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structural difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub subject: EndpointKey,
    /// Dot/bracket path inside the endpoint, e.g. `responses.200.items[].id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    pub description: String,
    pub severity: Severity,
}

impl ChangeRecord {
    pub fn endpoint(kind: ChangeKind, subject: EndpointKey, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind,
            subject,
            field_path: None,
            description: description.into(),
            severity,
        }
    }

    pub fn field(
        kind: ChangeKind,
        subject: EndpointKey,
        field_path: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject,
            field_path: Some(field_path.into()),
            description: description.into(),
            severity,
        }
    }

    pub fn is_breaking(&self) -> bool {
        self.severity == Severity::Breaking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::key::HttpMethod;

    #[test]
    fn test_severity_precedence() {
        assert!(Severity::Breaking > Severity::Minor);
        assert!(Severity::Minor > Severity::Patch);
        assert!(Severity::Patch > Severity::Informational);
        let max = [Severity::Patch, Severity::Breaking, Severity::Minor]
            .into_iter()
            .max();
        assert_eq!(max, Some(Severity::Breaking));
    }

    #[test]
    fn test_record_json_shape() {
        let rec = ChangeRecord::field(
            ChangeKind::Added,
            EndpointKey::new(HttpMethod::Get, "/orders"),
            "responses.200.total",
            Severity::Minor,
            "field added",
        );
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["kind"], "added");
        assert_eq!(value["subject"], "GET /orders");
        assert_eq!(value["fieldPath"], "responses.200.total");
        assert_eq!(value["severity"], "minor");
    }
}
