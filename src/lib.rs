//! Treesync: Replication Core for Versioned Content Trees
//!
//! Translates paths between a source release and a replication target,
//! fingerprints node properties, collects and diffs snapshots of
//! version-tracked nodes, and rewrites references after a content move.

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod namespace;
pub mod rewrite;
pub mod snapshot;
pub mod status;
pub mod tree;

pub use error::{PathError, ReplicationError, RewriteError, SnapshotError, StoreError};
pub use fingerprint::{FingerprintOptions, PropertyFingerprint};
pub use namespace::NamespaceMapping;
pub use rewrite::{ReferenceRewriter, RewriteReport};
pub use snapshot::{diff, Snapshot, SnapshotCollector, SnapshotDiff, VersionedEntry};
pub use tree::{ContentRead, ContentWrite, MemoryStore, PropertyValue, Versioning};
