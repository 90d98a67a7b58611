//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, MappingArgs};
pub use presentation::{
    format_diff_json, format_diff_text, format_rewrite_report_json, format_rewrite_report_text,
    format_section_heading, format_status_text, format_translations_json,
    format_translations_text, TranslationRow,
};
pub use route::RunContext;
