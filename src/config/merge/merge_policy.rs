//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// List-valued settings are replaced wholesale by later sources, never merged.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("snapshot.stop_at_versioned", false)?
        .set_default(
            "fingerprint.ignored_properties",
            vec!["cpl:changeNumber", "cpl:lastReplicationDate"],
        )?
        .set_default("fingerprint.unordered_properties", vec!["jcr:mixinTypes"])?
        .set_default("logging.level", "warn")?
        .set_default("logging.output", "stderr")
}
