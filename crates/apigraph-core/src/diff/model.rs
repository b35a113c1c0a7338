//! Diff output types.
//!
//! Collections are sorted `Vec`s and `BTreeMap`s for deterministic serialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{ChangeKind, ChangeRecord, EndpointKey, Severity};

/// Record counts by kind and by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub breaking: usize,
    pub minor: usize,
    pub patch: usize,
    pub informational: usize,
}

impl ChangeCounts {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a ChangeRecord>) -> Self {
        let mut counts = Self::default();
        for r in records {
            counts.record(r.kind, r.severity);
        }
        counts
    }

    pub fn record(&mut self, kind: ChangeKind, severity: Severity) {
        match kind {
            ChangeKind::Added => self.added += 1,
            ChangeKind::Removed => self.removed += 1,
            ChangeKind::Modified => self.modified += 1,
        }
        match severity {
            Severity::Breaking => self.breaking += 1,
            Severity::Minor => self.minor += 1,
            Severity::Patch => self.patch += 1,
            Severity::Informational => self.informational += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// Maximum severity among one endpoint's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSeverity {
    pub endpoint: EndpointKey,
    pub severity: Severity,
    pub changes: usize,
}

/// Diff output with derived views.
///
/// `records` keeps the engine order; every other field is computed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    pub counts: ChangeCounts,
    /// Endpoints ordered by severity (highest first), then key.
    pub endpoints: Vec<EndpointSeverity>,
    pub records: Vec<ChangeRecord>,
}

impl DiffReport {
    pub fn new(records: Vec<ChangeRecord>) -> Self {
        let counts = ChangeCounts::tally(&records);
        let mut per_endpoint: BTreeMap<&EndpointKey, (Severity, usize)> = BTreeMap::new();
        for r in &records {
            let entry = per_endpoint.entry(&r.subject).or_insert((r.severity, 0));
            entry.0 = entry.0.max(r.severity);
            entry.1 += 1;
        }
        let mut endpoints: Vec<EndpointSeverity> = per_endpoint
            .into_iter()
            .map(|(endpoint, (severity, changes))| EndpointSeverity {
                endpoint: endpoint.clone(),
                severity,
                changes,
            })
            .collect();
        endpoints.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.endpoint.cmp(&b.endpoint)));
        Self {
            counts,
            endpoints,
            records,
        }
    }

    /// Drop `informational` records and recompute the derived views.
    pub fn without_informational(self) -> Self {
        let records = self
            .records
            .into_iter()
            .filter(|r| r.severity != Severity::Informational)
            .collect();
        Self::new(records)
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.records.iter().map(|r| r.severity).max()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records grouped by severity, highest tier first, engine order kept within a tier.
    pub fn by_severity(&self) -> Vec<(Severity, Vec<&ChangeRecord>)> {
        let mut buckets: BTreeMap<Severity, Vec<&ChangeRecord>> = BTreeMap::new();
        for r in &self.records {
            buckets.entry(r.severity).or_default().push(r);
        }
        buckets.into_iter().rev().collect()
    }
}
