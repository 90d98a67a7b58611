//! Configuration System
//!
//! Layered configuration: built-in defaults, the global file, workspace files
//! and `TREESYNC__*` environment variables. Replication processes are an
//! explicit table keyed by process id. Tests included.

use crate::error::{PathError, ReplicationError};
use crate::fingerprint::FingerprintOptions;
use crate::logging::LoggingConfig;
use crate::namespace::NamespaceMapping;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreesyncConfig {
    /// Replication processes by id
    #[serde(default)]
    pub replications: BTreeMap<String, ReplicationConfig>,

    /// Fingerprint settings
    #[serde(default)]
    pub fingerprint: FingerprintOptions,

    /// Snapshot collection settings
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Snapshot collection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Treat tracked nodes as atomic: do not collect below them
    #[serde(default)]
    pub stop_at_versioned: bool,
}

/// One configured replication process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Display title; falls back to the source path, then the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Release stage this process replicates
    #[serde(default = "default_stage")]
    pub stage: String,

    /// Root of the replicated release
    pub release_root: String,

    /// Part of the release that is replicated (default: all of it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,

    /// Where the content lands on the target (default: in place)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Staging location the target namespace is mounted under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_prefix: Option<String>,
}

fn default_stage() -> String {
    "public".to_string()
}

fn default_true() -> bool {
    true
}

impl ReplicationConfig {
    /// Namespace mapping of this process
    pub fn mapping(&self) -> Result<NamespaceMapping, PathError> {
        Ok(NamespaceMapping::new(
            &self.release_root,
            self.source_path.as_deref(),
            self.target_path.as_deref(),
        )?
        .with_external_prefix(self.staging_prefix.as_deref()))
    }

    /// Title shown in status output
    pub fn display_title(&self, id: &str) -> String {
        [self.title.as_deref(), self.source_path.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(id)
            .to_string()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.stage.trim().is_empty() {
            return Err("Stage cannot be empty".to_string());
        }
        self.mapping().map_err(|e| e.to_string())?;
        if let Some(prefix) = &self.staging_prefix {
            if !prefix.trim().is_empty() && !prefix.starts_with('/') {
                return Err(format!("Staging prefix must be absolute: {}", prefix));
            }
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Replication(String, String),
    Fingerprint(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Replication(id, msg) => write!(f, "Replication '{}': {}", id, msg),
            ValidationError::Fingerprint(msg) => write!(f, "Fingerprint: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TreesyncConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (id, replication) in &self.replications {
            if let Err(e) = replication.validate() {
                errors.push(ValidationError::Replication(id.clone(), e));
            }
        }

        let names = self
            .fingerprint
            .ignored_properties
            .iter()
            .chain(&self.fingerprint.unordered_properties);
        for name in names {
            if name.trim().is_empty() {
                errors.push(ValidationError::Fingerprint(
                    "Property names cannot be empty".to_string(),
                ));
                break;
            }
        }

        if !matches!(self.logging.format.as_str(), "json" | "text") {
            errors.push(ValidationError::Logging(format!(
                "Invalid format '{}'",
                self.logging.format
            )));
        }
        if !matches!(
            self.logging.output.as_str(),
            "stdout" | "stderr" | "file" | "both"
        ) {
            errors.push(ValidationError::Logging(format!(
                "Invalid output '{}'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding all problems into one error
    pub fn validated(self) -> Result<Self, ReplicationError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ReplicationError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    /// A configured replication process
    pub fn replication(&self, id: &str) -> Result<&ReplicationConfig, ReplicationError> {
        self.replications
            .get(id)
            .ok_or_else(|| ReplicationError::UnknownProcess(id.to_string()))
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ReplicationError> {
        toml::to_string_pretty(self).map_err(|e| ReplicationError::ConfigError(e.to_string()))
    }
}
