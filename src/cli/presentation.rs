//! CLI presentation: text and json formatters per command family.

mod replication;
mod shared;
mod status;

pub use replication::{
    format_diff_json, format_diff_text, format_rewrite_report_json, format_rewrite_report_text,
    format_translations_json, format_translations_text, TranslationRow,
};
pub use shared::{format_section_heading, to_pretty_json};
pub use status::format_status_text;
