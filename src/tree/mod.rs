//! Content tree access
//!
//! The replication core never owns a content store. It reads and writes
//! through the traits below; [`memory::MemoryStore`] is the in-process
//! implementation used for staging copies, content dumps and tests.

pub mod hasher;
pub mod memory;
pub mod path;
pub mod value;

pub use memory::{ChildDump, MemoryStore, NodeDump, TreeDump};
pub use value::{BinaryValue, Decimal, PropertyType, PropertyValue};

use crate::error::StoreError;

/// Version tracking state of a node
///
/// `Tracked(None)` marks a node that is version-tracked but carries no
/// replicated version token yet; it is distinct from `Untracked`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Versioning {
    Untracked,
    Tracked(Option<String>),
}

impl Versioning {
    pub fn is_tracked(&self) -> bool {
        matches!(self, Versioning::Tracked(_))
    }

    /// Version token, if tracked and present
    pub fn token(&self) -> Option<&str> {
        match self {
            Versioning::Tracked(Some(token)) => Some(token),
            _ => None,
        }
    }
}

/// Read access to a content tree addressed by absolute paths
pub trait ContentRead {
    /// Whether a node exists at `path`
    fn contains(&self, path: &str) -> bool;

    /// Absolute paths of the children of `path`, in store order
    fn children(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// All properties of the node at `path`
    fn properties(&self, path: &str) -> Result<Vec<(String, PropertyValue)>, StoreError>;

    /// A single property of the node at `path`
    fn property(&self, path: &str, name: &str) -> Result<Option<PropertyValue>, StoreError> {
        Ok(self
            .properties(path)?
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v))
    }

    /// Version tracking state of the node at `path`
    fn versioning(&self, path: &str) -> Result<Versioning, StoreError>;
}

/// Write access to a content tree
///
/// Writes become durable with [`ContentWrite::commit`]; transaction
/// management beyond that belongs to the store.
pub trait ContentWrite: ContentRead {
    /// Write or replace a property value
    fn set_property(&mut self, path: &str, name: &str, value: PropertyValue)
        -> Result<(), StoreError>;

    /// Commit pending writes as one batch
    fn commit(&mut self) -> Result<(), StoreError>;
}
