//! In-memory content tree
//!
//! Backs staging copies and content dumps. Nodes are keyed by normalized
//! absolute path; child order is insertion order, which is the order the
//! snapshot walk and the rewriter observe.

use crate::error::StoreError;
use crate::tree::path::{append_paths, name_of, normalize_path_string};
use crate::tree::value::PropertyValue;
use crate::tree::{ContentRead, ContentWrite, Versioning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct NodeData {
    properties: BTreeMap<String, PropertyValue>,
    versioning: Versioning,
    children: Vec<String>,
}

impl NodeData {
    fn empty() -> Self {
        Self {
            properties: BTreeMap::new(),
            versioning: Versioning::Untracked,
            children: Vec::new(),
        }
    }
}

/// Ordered in-memory content tree
#[derive(Debug, Clone)]
pub struct MemoryStore {
    nodes: BTreeMap<String, NodeData>,
    pending_writes: usize,
    commits: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store containing only the root node `/`
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), NodeData::empty());
        Self {
            nodes,
            pending_writes: 0,
            commits: 0,
        }
    }

    /// Add a node (and any missing ancestors), merging the given properties
    pub fn add_node<I, K, V>(&mut self, path: &str, properties: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        let path = self.ensure_node(path)?;
        let node = self
            .nodes
            .get_mut(&path)
            .ok_or_else(|| StoreError::NodeNotFound(path.clone()))?;
        for (name, value) in properties {
            let name = name.into();
            let value = value.into();
            value.validate().map_err(|reason| StoreError::InvalidValue {
                path: path.clone(),
                name: name.clone(),
                reason,
            })?;
            node.properties.insert(name, value);
        }
        Ok(())
    }

    /// Mark a node as version-tracked with an optional version token
    pub fn set_versioned(&mut self, path: &str, token: Option<&str>) -> Result<(), StoreError> {
        let path = checked_path(path)?;
        let node = self
            .nodes
            .get_mut(&path)
            .ok_or_else(|| StoreError::NodeNotFound(path.clone()))?;
        node.versioning = Versioning::Tracked(token.map(str::to_string));
        Ok(())
    }

    /// Direct read of a property value
    pub fn get(&self, path: &str, name: &str) -> Option<&PropertyValue> {
        self.nodes
            .get(&normalize_path_string(path))
            .and_then(|node| node.properties.get(name))
    }

    /// Number of writes since the last commit
    pub fn pending_writes(&self) -> usize {
        self.pending_writes
    }

    /// Number of commits performed
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Disconnected deep copy of the subtree at `path` from any content store
    ///
    /// Nodes keep their absolute paths; ancestors of `path` are created empty.
    pub fn staging_copy<S: ContentRead + ?Sized>(source: &S, path: &str) -> Result<Self, StoreError> {
        let path = checked_path(path)?;
        if !source.contains(&path) {
            return Err(StoreError::NodeNotFound(path));
        }
        let mut copy = MemoryStore::new();
        copy.copy_from(source, &path)?;
        debug!(path = %path, nodes = copy.nodes.len(), "Created staging copy");
        Ok(copy)
    }

    fn copy_from<S: ContentRead + ?Sized>(&mut self, source: &S, path: &str) -> Result<(), StoreError> {
        self.add_node(path, source.properties(path)?)?;
        if let Versioning::Tracked(token) = source.versioning(path)? {
            self.set_versioned(path, token.as_deref())?;
        }
        for child in source.children(path)? {
            self.copy_from(source, &child)?;
        }
        Ok(())
    }

    /// Build a store from a content dump
    pub fn from_dump(dump: &TreeDump) -> Result<Self, StoreError> {
        let mut store = MemoryStore::new();
        let root = checked_path(&dump.root)?;
        store.insert_dump(&root, &dump.node)?;
        Ok(store)
    }

    fn insert_dump(&mut self, path: &str, node: &NodeDump) -> Result<(), StoreError> {
        self.add_node(path, node.properties.clone())?;
        if node.versionable || node.version.is_some() {
            self.set_versioned(path, node.version.as_deref())?;
        }
        for child in &node.children {
            if matches!(child.name.as_str(), "" | "." | "..") || child.name.contains('/') {
                return Err(StoreError::InvalidDump(format!(
                    "invalid child name {:?} below {}",
                    child.name, path
                )));
            }
            self.insert_dump(&append_paths(path, &child.name), &child.node)?;
        }
        Ok(())
    }

    /// Dump the subtree at `path`
    pub fn to_dump(&self, path: &str) -> Result<TreeDump, StoreError> {
        let path = checked_path(path)?;
        Ok(TreeDump {
            node: self.node_dump(&path)?,
            root: path,
        })
    }

    fn node_dump(&self, path: &str) -> Result<NodeDump, StoreError> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| StoreError::NodeNotFound(path.to_string()))?;
        let children = node
            .children
            .iter()
            .map(|name| {
                Ok(ChildDump {
                    name: name.clone(),
                    node: self.node_dump(&append_paths(path, name))?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(NodeDump {
            properties: node.properties.clone(),
            versionable: node.versioning.is_tracked(),
            version: node.versioning.token().map(str::to_string),
            children,
        })
    }

    /// Parse a JSON content dump
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let dump: TreeDump =
            serde_json::from_str(json).map_err(|e| StoreError::InvalidDump(e.to_string()))?;
        Self::from_dump(&dump)
    }

    /// Serialize the subtree at `path` as a pretty JSON content dump
    pub fn to_json_string(&self, path: &str) -> Result<String, StoreError> {
        let dump = self.to_dump(path)?;
        serde_json::to_string_pretty(&dump).map_err(|e| StoreError::InvalidDump(e.to_string()))
    }

    /// Create the node at `path` and its ancestors; returns the normalized path
    fn ensure_node(&mut self, path: &str) -> Result<String, StoreError> {
        let path = checked_path(path)?;
        if self.nodes.contains_key(&path) {
            return Ok(path);
        }
        let parent = match path.rfind('/') {
            Some(0) => "/".to_string(),
            Some(idx) => path[..idx].to_string(),
            None => return Err(StoreError::NodeNotFound(path)),
        };
        let parent = self.ensure_node(&parent)?;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(name_of(&path).to_string());
        }
        self.nodes.insert(path.clone(), NodeData::empty());
        Ok(path)
    }

    fn node(&self, path: &str) -> Result<&NodeData, StoreError> {
        self.nodes
            .get(&normalize_path_string(path))
            .ok_or_else(|| StoreError::NodeNotFound(path.to_string()))
    }
}

fn checked_path(path: &str) -> Result<String, StoreError> {
    if !path.starts_with('/') {
        return Err(StoreError::InvalidDump(format!(
            "content paths must be absolute: {:?}",
            path
        )));
    }
    Ok(normalize_path_string(path))
}

impl ContentRead for MemoryStore {
    fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(&normalize_path_string(path))
    }

    fn children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let node = self.node(path)?;
        let base = normalize_path_string(path);
        Ok(node
            .children
            .iter()
            .map(|name| append_paths(&base, name))
            .collect())
    }

    fn properties(&self, path: &str) -> Result<Vec<(String, PropertyValue)>, StoreError> {
        Ok(self
            .node(path)?
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }

    fn property(&self, path: &str, name: &str) -> Result<Option<PropertyValue>, StoreError> {
        Ok(self.node(path)?.properties.get(name).cloned())
    }

    fn versioning(&self, path: &str) -> Result<Versioning, StoreError> {
        Ok(self.node(path)?.versioning.clone())
    }
}

impl ContentWrite for MemoryStore {
    fn set_property(
        &mut self,
        path: &str,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        let key = normalize_path_string(path);
        value.validate().map_err(|reason| StoreError::InvalidValue {
            path: key.clone(),
            name: name.to_string(),
            reason,
        })?;
        let node = self
            .nodes
            .get_mut(&key)
            .ok_or_else(|| StoreError::NodeNotFound(key.clone()))?;
        node.properties.insert(name.to_string(), value);
        self.pending_writes += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        debug!(writes = self.pending_writes, "Committing staged writes");
        self.pending_writes = 0;
        self.commits += 1;
        Ok(())
    }
}

/// JSON content dump of a subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDump {
    /// Absolute path of the dumped node
    pub root: String,
    #[serde(flatten)]
    pub node: NodeDump,
}

/// One node of a content dump
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDump {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub versionable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildDump>,
}

/// A named child in a content dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDump {
    pub name: String,
    #[serde(flatten)]
    pub node: NodeDump,
}
