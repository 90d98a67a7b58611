//! Error types for the replication core.

use thiserror::Error;

/// Path translation and relativization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Path is outside of {root}: {path}")]
    OutOfScope { path: String, root: String },

    #[error("Source scope {scope} must be at or below the source root {root}")]
    ScopeOutsideRoot { scope: String, root: String },

    #[error("Path must be absolute: {0}")]
    NotAbsolute(String),
}

/// Content store access errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid property value at {path}/{name}: {reason}")]
    InvalidValue {
        path: String,
        name: String,
        reason: String,
    },

    #[error("Content dump is invalid: {0}")]
    InvalidDump(String),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot wire format errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot must be a JSON array of {{\"path\", \"version\"}} objects")]
    NotAnArray,

    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reference rewriter setup errors
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Move paths must be absolute: {source_path} -> {dest_path}")]
    RelativeMove {
        source_path: String,
        dest_path: String,
    },

    #[error("Failed to compile reference pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Top-level error for replication operations
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Rewrite error: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown replication process: {0}")]
    UnknownProcess(String),
}

impl From<config::ConfigError> for ReplicationError {
    fn from(err: config::ConfigError) -> Self {
        ReplicationError::ConfigError(err.to_string())
    }
}
