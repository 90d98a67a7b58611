//! Configuration loading: assembles the layered sources into a `TreesyncConfig`

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::TreesyncConfig;
use config::{ConfigError, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads configuration from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, workspace `config/{TREESYNC_ENV}.toml`,
    /// `TREESYNC__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<TreesyncConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        let config: TreesyncConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            replications = config.replications.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<TreesyncConfig, ConfigError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::Message(format!("Non UTF-8 config path: {:?}", path)))?;
        builder_with_defaults()?
            .add_source(File::new(path_str, FileFormat::Toml).required(true))
            .build()?
            .try_deserialize()
    }

    /// Path of the global config file, if a home directory is known
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
