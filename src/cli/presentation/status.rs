//! Status presentation: stage summary and process table.

use super::shared::format_section_heading;
use crate::status::{ReplicationState, StatusSummary};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn styled_state(state: ReplicationState) -> String {
    let name = state.to_string();
    match state {
        ReplicationState::Synchron => format!("{}", name.green()),
        ReplicationState::Running => format!("{}", name.cyan()),
        ReplicationState::Faulty => format!("{}", name.red()),
        ReplicationState::Disabled => format!("{}", name.dimmed()),
        ReplicationState::Undefined => format!("{}", name.yellow()),
    }
}

/// Format a stage status summary as human-readable text.
pub fn format_status_text(summary: &StatusSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Replication status: {}", summary.stage))
    ));
    out.push_str(&format!(
        "  State: {}\n  Progress: {}%\n\n",
        styled_state(summary.state),
        summary.progress
    ));

    if summary.processes.is_empty() {
        out.push_str("  No replication processes configured for this stage.");
        return out;
    }

    out.push_str(&format!("{}\n", format_section_heading("Processes")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Title", "Id", "State", "Progress", "Last replication", "Finished"]);
    for p in &summary.processes {
        let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
        table.add_row(vec![
            p.title.clone(),
            p.id.clone(),
            styled_state(p.state),
            format!("{}%", p.progress),
            or_dash(&p.last_replication),
            or_dash(&p.finished_at),
        ]);
    }
    out.push_str(&table.to_string());
    out
}
