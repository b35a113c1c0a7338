//! Human-readable renderings of a [`DiffReport`].
//!
//! Both renderings are derived from the structured report and carry no
//! information of their own.

use crate::diff::model::{ChangeCounts, DiffReport};
use crate::model::Severity;

/// One-line summary, e.g. `3 changes across 2 endpoints: 1 breaking, 2 minor (1 added, 0 removed)`.
pub fn summary_line(counts: &ChangeCounts, endpoints: usize) -> String {
    let total = counts.total();
    if total == 0 {
        return "No changes.".to_string();
    }
    let mut tiers = Vec::new();
    for (n, label) in [
        (counts.breaking, "breaking"),
        (counts.minor, "minor"),
        (counts.patch, "patch"),
        (counts.informational, "informational"),
    ] {
        if n > 0 {
            tiers.push(format!("{} {}", n, label));
        }
    }
    format!(
        "{} change{} across {} endpoint{}: {} ({} added, {} removed)",
        total,
        plural(total),
        endpoints,
        plural(endpoints),
        tiers.join(", "),
        counts.added,
        counts.removed
    )
}

/// Render a Markdown summary grouped by severity tier.
pub fn render_human_summary(report: &DiffReport) -> String {
    let mut out = String::new();
    out.push_str("## API Diff\n\n");
    out.push_str(&summary_line(&report.counts, report.endpoints.len()));
    out.push_str("\n\n");
    if report.is_empty() {
        return out;
    }

    out.push_str("### Endpoints\n\n");
    for e in &report.endpoints {
        out.push_str(&format!(
            "- `{}` **{}** ({} change{})\n",
            e.endpoint,
            e.severity,
            e.changes,
            plural(e.changes)
        ));
    }
    out.push('\n');

    for (severity, records) in report.by_severity() {
        out.push_str(&format!("### {}\n\n", heading(severity)));
        for r in records {
            match &r.field_path {
                Some(path) => out.push_str(&format!("- `{}` `{}`: {}\n", r.subject, path, r.description)),
                None => out.push_str(&format!("- `{}`: {}\n", r.subject, r.description)),
            }
        }
        out.push('\n');
    }
    out
}

fn heading(severity: Severity) -> &'static str {
    match severity {
        Severity::Breaking => "Breaking",
        Severity::Minor => "Minor",
        Severity::Patch => "Patch",
        Severity::Informational => "Informational",
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
