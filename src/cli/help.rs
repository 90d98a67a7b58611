//! CLI help: stable command names for logging.

use crate::cli::parse::Commands;

/// Stable name of a command, as used in log fields.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Translate { inverse: true, .. } => "translate.inverse",
        Commands::Translate { .. } => "translate",
        Commands::Snapshot { .. } => "snapshot",
        Commands::Diff { .. } => "diff",
        Commands::Fingerprint { .. } => "fingerprint",
        Commands::Rewrite { .. } => "rewrite",
        Commands::Status { .. } => "status",
        Commands::Config => "config",
    }
}
