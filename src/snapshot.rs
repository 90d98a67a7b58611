//! Snapshots of version-tracked nodes and the diff between two of them
//!
//! The sending side collects a [`Snapshot`] of its tracked nodes relative to
//! its release root and ships it as JSON. The receiving side relativizes its
//! own snapshot the same way and calls [`diff`] to get the nodes to update and
//! the nodes to remove.

use crate::error::{ReplicationError, SnapshotError};
use crate::tree::path::{is_same_or_descendant, normalize_path_string, relativize, trim_trailing_slashes};
use crate::tree::{ContentRead, Versioning};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// A tracked node and its version token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionedEntry {
    pub path: String,
    pub version: String,
}

impl VersionedEntry {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }
}

/// Ordered list of versioned entries, in depth-first discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: Vec<VersionedEntry>,
}

/// A snapshot entry that could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedEntry {
    pub index: usize,
    pub reason: String,
}

/// Result of lenient snapshot parsing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSnapshot {
    pub snapshot: Snapshot,
    pub rejected: Vec<RejectedEntry>,
}

impl Snapshot {
    pub fn new(entries: Vec<VersionedEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[VersionedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VersionedEntry> {
        self.entries.iter()
    }

    pub fn push(&mut self, entry: VersionedEntry) {
        self.entries.push(entry);
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the wire format, skipping malformed entries
    ///
    /// Only a document that is not a JSON array fails as a whole.
    pub fn from_json(json: &str) -> Result<ParsedSnapshot, SnapshotError> {
        let Value::Array(items) = serde_json::from_str::<Value>(json)? else {
            return Err(SnapshotError::NotAnArray);
        };

        let mut parsed = ParsedSnapshot::default();
        for (index, item) in items.into_iter().enumerate() {
            match entry_from_value(&item) {
                Ok(entry) => parsed.snapshot.push(entry),
                Err(reason) => {
                    warn!(index, reason = %reason, "Skipping malformed snapshot entry");
                    parsed.rejected.push(RejectedEntry { index, reason });
                }
            }
        }
        debug!(
            entries = parsed.snapshot.len(),
            rejected = parsed.rejected.len(),
            "Parsed snapshot"
        );
        Ok(parsed)
    }
}

fn entry_from_value(item: &Value) -> Result<VersionedEntry, String> {
    let object = item
        .as_object()
        .ok_or_else(|| "entry is not an object".to_string())?;
    let field = |name: &str| match object.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("{} is not a string", name)),
        None => Err(format!("missing {}", name)),
    };
    Ok(VersionedEntry {
        path: field("path")?,
        version: field("version")?,
    })
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a VersionedEntry;
    type IntoIter = std::slice::Iter<'a, VersionedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<VersionedEntry> for Snapshot {
    fn from_iter<T: IntoIterator<Item = VersionedEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Collects the tracked nodes below a set of search roots
#[derive(Debug, Clone)]
pub struct SnapshotCollector {
    roots: Vec<String>,
    relative_to: Option<String>,
    stop_at_versioned: bool,
}

impl SnapshotCollector {
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roots: roots
                .into_iter()
                .map(|r| normalize_path_string(r.as_ref()))
                .collect(),
            relative_to: None,
            stop_at_versioned: false,
        }
    }

    /// Record paths relative to `prefix`
    pub fn relative_to(mut self, prefix: Option<&str>) -> Self {
        self.relative_to = prefix.map(|p| trim_trailing_slashes(p).to_string());
        self
    }

    /// Do not descend below tracked nodes
    pub fn stop_at_versioned(mut self, stop: bool) -> Self {
        self.stop_at_versioned = stop;
        self
    }

    /// Walk every root depth-first and record each tracked node's token
    #[instrument(skip(self, store), fields(roots = self.roots.len()))]
    pub fn collect<S: ContentRead + ?Sized>(&self, store: &S) -> Result<Snapshot, ReplicationError> {
        let mut snapshot = Snapshot::default();
        for root in &self.roots {
            if !store.contains(root) {
                warn!(root = %root, "Search root does not exist, skipping");
                continue;
            }
            let mut stack = vec![root.clone()];
            while let Some(path) = stack.pop() {
                let versioning = store.versioning(&path)?;
                match &versioning {
                    Versioning::Tracked(Some(token)) => {
                        match relativize(self.relative_to.as_deref(), &path) {
                            Some(relative) => {
                                debug!(path = %relative, version = %token, "Collected versioned node");
                                snapshot.push(VersionedEntry::new(relative, token.clone()));
                            }
                            None => warn!(
                                path = %path,
                                relative_to = ?self.relative_to,
                                "Tracked node outside of the snapshot root, skipping"
                            ),
                        }
                    }
                    Versioning::Tracked(None) => {
                        warn!(path = %path, "Tracked node has no version token, skipping");
                    }
                    Versioning::Untracked => {}
                }
                if versioning.is_tracked() && self.stop_at_versioned {
                    continue;
                }
                let mut children = store.children(&path)?;
                children.reverse();
                stack.extend(children);
            }
        }
        info!(entries = snapshot.len(), "Snapshot collected");
        Ok(snapshot)
    }
}

/// Work-lists produced by comparing a foreign snapshot with the local one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    /// Foreign entries to fetch or update, in foreign order
    pub changed: Vec<VersionedEntry>,
    /// Local entries to remove, in local order
    pub deleted: Vec<VersionedEntry>,
}

impl SnapshotDiff {
    pub fn changed_paths(&self) -> Vec<&str> {
        self.changed.iter().map(|e| e.path.as_str()).collect()
    }

    pub fn deleted_paths(&self) -> Vec<&str> {
        self.deleted.iter().map(|e| e.path.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// Relativize entries against `prefix`, dropping those outside it
fn relativized(snapshot: &Snapshot, prefix: Option<&str>, side: &str) -> Vec<VersionedEntry> {
    snapshot
        .iter()
        .filter_map(|entry| match relativize(prefix, &entry.path) {
            Some(path) => Some(VersionedEntry::new(path, entry.version.clone())),
            None => {
                warn!(side, path = %entry.path, prefix = ?prefix, "Entry outside of its prefix, skipping");
                None
            }
        })
        .collect()
}

/// Compare a foreign snapshot against the local one
///
/// Paths are compared after stripping each side's prefix. `scope` is a
/// relativized path restricting the comparison to a subtree.
#[instrument(skip(foreign, local), fields(foreign_entries = foreign.len(), local_entries = local.len()))]
pub fn diff(
    foreign: &Snapshot,
    foreign_prefix: Option<&str>,
    local: &Snapshot,
    local_prefix: Option<&str>,
    scope: Option<&str>,
) -> SnapshotDiff {
    let scope = scope
        .map(trim_trailing_slashes)
        .filter(|s| !s.is_empty() && *s != "/");
    let in_scope = |entry: &VersionedEntry| scope.map_or(true, |s| is_same_or_descendant(s, &entry.path));

    let foreign: Vec<VersionedEntry> = relativized(foreign, foreign_prefix, "foreign")
        .into_iter()
        .filter(|e| in_scope(e))
        .collect();
    let local: Vec<VersionedEntry> = relativized(local, local_prefix, "local")
        .into_iter()
        .filter(|e| in_scope(e))
        .collect();

    let mut local_versions: HashMap<&str, &str> = HashMap::with_capacity(local.len());
    for entry in &local {
        local_versions
            .entry(entry.path.as_str())
            .or_insert(entry.version.as_str());
    }
    let foreign_paths: HashSet<&str> = foreign.iter().map(|e| e.path.as_str()).collect();

    let changed: Vec<VersionedEntry> = foreign
        .iter()
        .filter(|e| local_versions.get(e.path.as_str()) != Some(&e.version.as_str()))
        .cloned()
        .collect();
    let deleted: Vec<VersionedEntry> = local
        .iter()
        .filter(|e| !foreign_paths.contains(e.path.as_str()))
        .cloned()
        .collect();

    info!(
        changed = changed.len(),
        deleted = deleted.len(),
        "Snapshot diff computed"
    );
    SnapshotDiff { changed, deleted }
}
