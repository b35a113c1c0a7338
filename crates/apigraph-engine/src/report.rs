//! Result report shapes returned by the analyzers.
//!
//! Each report carries counts, an ordered list of entries and a summary
//! string. The summary is always rendered from the structured fields.

use apigraph_core::diff::{summary_line, ChangeCounts, DiffReport, EndpointSeverity};
use apigraph_core::drift::{DriftFindings, MissingEndpoint, ShadowEndpoint, UnresolvedEntry};
use apigraph_core::model::{
    ChangeRecord, Confidence, EndpointKey, KnowledgeGraph, NormalizationNote, ResourceEdge,
    Severity,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Statement attached to every dependency report.
pub const DEPENDENCY_DISCLAIMER: &str = "Dependencies are inferred heuristically from declared \
response fields and path parameter names. Expect false positives and missed edges; \
confidence levels indicate how strongly each name matched.";

/// A normalization note tagged with the input it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcedNote {
    pub source: String,
    #[serde(flatten)]
    pub note: NormalizationNote,
}

impl SourcedNote {
    pub fn collect(source: &str, graph: &KnowledgeGraph) -> Vec<SourcedNote> {
        graph
            .notes()
            .iter()
            .cloned()
            .map(|note| SourcedNote {
                source: source.to_string(),
                note,
            })
            .collect()
    }
}

/// Digests identifying the two compared graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDigests {
    pub old: String,
    pub new: String,
}

/// Records bucketed by severity tier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SeverityBuckets {
    pub breaking: Vec<ChangeRecord>,
    pub minor: Vec<ChangeRecord>,
    pub patch: Vec<ChangeRecord>,
    pub informational: Vec<ChangeRecord>,
}

impl SeverityBuckets {
    pub fn from_records(records: &[ChangeRecord]) -> Self {
        let mut buckets = Self::default();
        for r in records {
            let bucket = match r.severity {
                Severity::Breaking => &mut buckets.breaking,
                Severity::Minor => &mut buckets.minor,
                Severity::Patch => &mut buckets.patch,
                Severity::Informational => &mut buckets.informational,
            };
            bucket.push(r.clone());
        }
        buckets
    }
}

/// Output of the breaking-change detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakingChangeReport {
    pub counts: ChangeCounts,
    /// Highest severity across all records; absent when nothing changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_severity: Option<Severity>,
    pub endpoints: Vec<EndpointSeverity>,
    /// Removed, then modified, then added endpoints; fields ordered within each.
    pub entries: Vec<ChangeRecord>,
    pub buckets: SeverityBuckets,
    pub summary: String,
    pub notes: Vec<SourcedNote>,
    pub inputs: InputDigests,
}

impl BreakingChangeReport {
    pub fn new(diff: DiffReport, notes: Vec<SourcedNote>, inputs: InputDigests) -> Self {
        let summary = summary_line(&diff.counts, diff.endpoints.len());
        Self {
            counts: diff.counts,
            max_severity: diff.max_severity(),
            buckets: SeverityBuckets::from_records(&diff.records),
            endpoints: diff.endpoints,
            entries: diff.records,
            summary,
            notes,
            inputs,
        }
    }

    /// The diff view used by the Markdown renderer.
    pub fn to_diff_report(&self) -> DiffReport {
        DiffReport::new(self.entries.clone())
    }

    pub fn has_breaking(&self) -> bool {
        self.counts.breaking > 0
    }
}

/// Drift tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftCounts {
    pub observations: usize,
    pub confirmed: usize,
    pub shadow: usize,
    pub missing: usize,
    pub schema_drift: usize,
    pub unresolved: usize,
    pub breaking: usize,
    pub minor: usize,
    /// Informational comparisons; not part of `schema_drift`.
    pub informational: usize,
}

/// Output of the drift analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub graph: String,
    pub digest: String,
    pub counts: DriftCounts,
    pub shadow: Vec<ShadowEndpoint>,
    pub missing: Vec<MissingEndpoint>,
    pub schema_drift: Vec<ChangeRecord>,
    pub informational: Vec<ChangeRecord>,
    /// Insufficient evidence; reported, never dropped.
    pub unresolved: Vec<UnresolvedEntry>,
    pub summary: String,
    pub notes: Vec<SourcedNote>,
}

impl DriftReport {
    pub fn new(
        graph: &str,
        digest: String,
        observations: usize,
        findings: DriftFindings,
        notes: Vec<SourcedNote>,
    ) -> Self {
        let severity_count =
            |s: Severity| findings.schema_drift.iter().filter(|r| r.severity == s).count();
        let counts = DriftCounts {
            observations,
            confirmed: findings.confirmed,
            shadow: findings.shadow.len(),
            missing: findings.missing.len(),
            schema_drift: findings.schema_drift.len(),
            unresolved: findings.unresolved.len(),
            breaking: severity_count(Severity::Breaking),
            minor: severity_count(Severity::Minor),
            informational: findings.informational.len(),
        };
        Self {
            graph: graph.to_string(),
            digest,
            summary: drift_summary(&counts),
            counts,
            shadow: findings.shadow,
            missing: findings.missing,
            schema_drift: findings.schema_drift,
            informational: findings.informational,
            unresolved: findings.unresolved,
            notes,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.counts.shadow == 0 && self.counts.missing == 0 && self.counts.schema_drift == 0
    }
}

fn drift_summary(counts: &DriftCounts) -> String {
    if counts.observations == 0 {
        return format!(
            "No observations; {} missing, {} unresolved.",
            counts.missing, counts.unresolved
        );
    }
    let mut out = format!(
        "{} observation{}: {} confirmed, {} shadow, {} missing, {} schema drift",
        counts.observations,
        plural(counts.observations),
        counts.confirmed,
        counts.shadow,
        counts.missing,
        counts.schema_drift
    );
    if counts.schema_drift > 0 {
        out.push_str(&format!(
            " ({} breaking, {} minor)",
            counts.breaking, counts.minor
        ));
    }
    out.push_str(&format!(", {} unresolved.", counts.unresolved));
    out
}

/// Dependency tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DependencyCounts {
    pub edges: usize,
    pub providers: usize,
    pub consumers: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Output of the dependency mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub graph: String,
    pub counts: DependencyCounts,
    /// `provides_identifier` edges sorted by (from, to, resource).
    pub entries: Vec<ResourceEdge>,
    /// `requires_resource` view keyed by consuming endpoint.
    pub requirements: BTreeMap<String, Vec<ResourceEdge>>,
    pub summary: String,
    pub disclaimer: &'static str,
    pub persisted: bool,
    pub notes: Vec<SourcedNote>,
}

impl DependencyReport {
    /// Build from a graph that already carries `edges`.
    pub fn new(graph_name: &str, graph: &KnowledgeGraph, persisted: bool) -> Self {
        let entries = graph.edges().to_vec();
        let mut providers: Vec<&EndpointKey> = entries.iter().map(|e| &e.from).collect();
        providers.sort();
        providers.dedup();
        let mut requirements = BTreeMap::new();
        for key in graph.keys() {
            let reqs = graph.requirements_of(key);
            if !reqs.is_empty() {
                requirements.insert(key.to_string(), reqs);
            }
        }
        let confidence_count =
            |c: Confidence| entries.iter().filter(|e| e.confidence == Some(c)).count();
        let counts = DependencyCounts {
            edges: entries.len(),
            providers: providers.len(),
            consumers: requirements.len(),
            high: confidence_count(Confidence::High),
            medium: confidence_count(Confidence::Medium),
            low: confidence_count(Confidence::Low),
        };
        Self {
            graph: graph_name.to_string(),
            summary: dependency_summary(&counts),
            counts,
            entries,
            requirements,
            disclaimer: DEPENDENCY_DISCLAIMER,
            persisted,
            notes: SourcedNote::collect(graph_name, graph),
        }
    }
}

fn dependency_summary(counts: &DependencyCounts) -> String {
    if counts.edges == 0 {
        return "No resource dependencies inferred (heuristic).".to_string();
    }
    format!(
        "{} inferred edge{} from {} provider{} to {} consumer{} ({} high, {} medium, {} low confidence; heuristic).",
        counts.edges,
        plural(counts.edges),
        counts.providers,
        plural(counts.providers),
        counts.consumers,
        plural(counts.consumers),
        counts.high,
        counts.medium,
        counts.low
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
