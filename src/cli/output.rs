//! CLI output: error mapping from domain errors to stable CLI surface.

/// Map an error and its causes to a single string for CLI output.
pub fn map_error(e: &anyhow::Error) -> String {
    format!("Error: {:#}", e)
}
