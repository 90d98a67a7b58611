//! Replication command presentation: translate, diff and rewrite text/json.

use super::shared::format_section_heading;
use crate::error::PathError;
use crate::rewrite::RewriteReport;
use crate::snapshot::{RejectedEntry, SnapshotDiff};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

/// One translated path
#[derive(Debug, Clone)]
pub struct TranslationRow {
    pub input: String,
    pub output: Result<String, PathError>,
}

pub fn format_translations_text(rows: &[TranslationRow]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "Translated"]);
    for row in rows {
        let translated = match &row.output {
            Ok(path) => path.clone(),
            Err(e) => format!("error: {}", e),
        };
        table.add_row(vec![row.input.clone(), translated]);
    }
    let failed = rows.iter().filter(|r| r.output.is_err()).count();
    let mut out = table.to_string();
    if failed > 0 {
        out.push_str(&format!("\n\n{} of {} path(s) could not be translated", failed, rows.len()));
    }
    out
}

pub fn format_translations_json(rows: &[TranslationRow]) -> Result<String, serde_json::Error> {
    let items: Vec<_> = rows
        .iter()
        .map(|row| match &row.output {
            Ok(path) => json!({ "path": row.input, "translated": path }),
            Err(e) => json!({ "path": row.input, "error": e.to_string() }),
        })
        .collect();
    serde_json::to_string_pretty(&items)
}

pub fn format_diff_text(diff: &SnapshotDiff, rejected: &[RejectedEntry]) -> String {
    if diff.is_empty() && rejected.is_empty() {
        return "No differences.".to_string();
    }
    let mut out = String::new();
    for (title, entries) in [("Changed", &diff.changed), ("Deleted", &diff.deleted)] {
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "{}\n",
            format_section_heading(&format!("{} ({})", title, entries.len()))
        ));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Path", "Version"]);
        for entry in entries.iter() {
            table.add_row(vec![entry.path.clone(), entry.version.clone()]);
        }
        out.push_str(&format!("{}\n\n", table));
    }
    if !rejected.is_empty() {
        out.push_str(&format!(
            "{}\n",
            format_section_heading(&format!("Rejected foreign entries ({})", rejected.len()))
        ));
        for r in rejected {
            out.push_str(&format!("  - #{}: {}\n", r.index, r.reason));
        }
    }
    out.trim_end().to_string()
}

pub fn format_diff_json(
    diff: &SnapshotDiff,
    rejected: &[RejectedEntry],
) -> Result<String, serde_json::Error> {
    let out = json!({
        "changed": diff.changed,
        "deleted": diff.deleted,
        "rejected": rejected,
    });
    serde_json::to_string_pretty(&out)
}

pub fn format_rewrite_report_text(report: &RewriteReport) -> String {
    let mut out = format!(
        "Rewrite complete:\n  Nodes visited: {}\n  Properties rewritten: {}",
        report.nodes_visited, report.properties_rewritten
    );
    if !report.suspicious.is_empty() {
        out.push_str(&format!(
            "\n\nStill referencing the move source ({}):",
            report.suspicious.len()
        ));
        for path in &report.suspicious {
            out.push_str(&format!("\n  - {}", path));
        }
    }
    out
}

pub fn format_rewrite_report_json(report: &RewriteReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
