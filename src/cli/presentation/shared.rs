//! Shared presentation helpers.

use owo_colors::OwoColorize;
use serde::Serialize;

/// Section heading (bold, underlined).
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Pretty JSON for command output.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
