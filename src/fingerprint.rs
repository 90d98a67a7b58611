//! Compact, type-aware fingerprints of a node's properties
//!
//! A fingerprint maps each property name to a short type-tagged form:
//! short strings are kept literally, long strings, binaries and arrays are
//! replaced by a BLAKE3 digest. Two nodes with equal fingerprints are treated
//! as identical. Digest collisions are possible in principle; at 256 bits the
//! risk is accepted and no second comparison is made.
//!
//! Type codes unify types that may legitimately differ between two stores
//! after a correct transfer: `long` and `double` share the number code `n`.

use crate::error::{PathError, ReplicationError, StoreError};
use crate::tree::hasher::{digest_reader, digest_sequence, digest_str, DIGEST_HEX_LEN};
use crate::tree::path::relativize;
use crate::tree::{ContentRead, PropertyType, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io;

/// Which properties take part in a fingerprint and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintOptions {
    /// Properties that may differ between stores without mattering
    pub ignored_properties: Vec<String>,
    /// Multi-valued properties whose element order is irrelevant
    pub unordered_properties: Vec<String>,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            ignored_properties: vec![
                "cpl:changeNumber".to_string(),
                "cpl:lastReplicationDate".to_string(),
            ],
            unordered_properties: vec!["jcr:mixinTypes".to_string()],
        }
    }
}

impl FingerprintOptions {
    fn is_ignored(&self, name: &str) -> bool {
        self.ignored_properties.iter().any(|p| p == name)
    }

    fn is_unordered(&self, name: &str) -> bool {
        self.unordered_properties.iter().any(|p| p == name)
    }
}

/// Property fingerprint of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFingerprint {
    pub path: String,
    pub property_hashes: BTreeMap<String, String>,
}

impl PropertyFingerprint {
    /// Fingerprint of a node from its path and properties
    ///
    /// With `strip_prefix`, the node must lie at or below the prefix and the
    /// recorded path becomes `/` plus the remainder.
    pub fn compute<'a, I>(
        path: &str,
        properties: I,
        strip_prefix: Option<&str>,
        options: &FingerprintOptions,
    ) -> Result<Self, ReplicationError>
    where
        I: IntoIterator<Item = (&'a str, &'a PropertyValue)>,
    {
        let path = relativize(strip_prefix, path).ok_or_else(|| PathError::OutOfScope {
            path: path.to_string(),
            root: strip_prefix.unwrap_or_default().to_string(),
        })?;

        let mut property_hashes = BTreeMap::new();
        for (name, value) in properties {
            if options.is_ignored(name) {
                continue;
            }
            let encoded = encode_property(value, options.is_unordered(name))
                .map_err(StoreError::from)?;
            property_hashes.insert(name.to_string(), encoded);
        }
        Ok(Self {
            path,
            property_hashes,
        })
    }

    /// Fingerprint of the node at `path` in a content store
    pub fn of<S: ContentRead + ?Sized>(
        store: &S,
        path: &str,
        strip_prefix: Option<&str>,
        options: &FingerprintOptions,
    ) -> Result<Self, ReplicationError> {
        let properties = store.properties(path)?;
        Self::compute(
            path,
            properties.iter().map(|(name, value)| (name.as_str(), value)),
            strip_prefix,
            options,
        )
    }

    /// Human-readable description of what differs, empty when equal
    ///
    /// Each differing property is listed as `name=mine|theirs`, with `-` for
    /// a missing side.
    pub fn difference(&self, other: &PropertyFingerprint) -> String {
        let mut buf = String::new();
        if self.path != other.path {
            let _ = write!(buf, "paths differ ({} | {}). ", self.path, other.path);
        }
        let names: BTreeSet<&String> = self
            .property_hashes
            .keys()
            .chain(other.property_hashes.keys())
            .collect();
        for name in names {
            let mine = self.property_hashes.get(name);
            let theirs = other.property_hashes.get(name);
            if mine != theirs {
                let _ = write!(
                    buf,
                    "{}={}|{} ",
                    name,
                    mine.map_or("-", String::as_str),
                    theirs.map_or("-", String::as_str)
                );
            }
        }
        buf.trim_end().to_string()
    }
}

/// Type code shared by all values of a property type
fn type_code(property_type: PropertyType) -> &'static str {
    match property_type {
        PropertyType::String => "S",
        PropertyType::Long | PropertyType::Double => "n",
        PropertyType::Decimal => "D",
        PropertyType::Boolean => "b",
        PropertyType::Date => "C",
        PropertyType::Binary => "B",
        PropertyType::Other => "X",
    }
}

/// Encoded form of one property value: type code, `:`, then literal or digest
pub fn encode_property(value: &PropertyValue, unordered: bool) -> io::Result<String> {
    let code = type_code(value.property_type());
    let rep = match value {
        PropertyValue::Multi { values, .. } => {
            let mut forms = values.iter().map(value_form).collect::<io::Result<Vec<_>>>()?;
            if unordered {
                forms.sort();
            }
            digest_sequence(forms.iter().map(String::as_str))
        }
        PropertyValue::Other { .. } => digest_str(&value_form(value)?),
        single => {
            let form = value_form(single)?;
            if form.len() > DIGEST_HEX_LEN {
                digest_str(&form)
            } else {
                form
            }
        }
    };
    Ok(format!("{}:{}", code, rep))
}

/// Canonical text of a single value
fn value_form(value: &PropertyValue) -> io::Result<String> {
    Ok(match value {
        PropertyValue::String(s) => s.clone(),
        PropertyValue::Long(n) => n.to_string(),
        PropertyValue::Double(d) => d.to_string(),
        PropertyValue::Decimal(d) => d.to_string(),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Date(date) => date.timestamp_millis().to_string(),
        PropertyValue::Binary(binary) => digest_reader(binary.open()?)?,
        PropertyValue::Other { type_name, value } => format!("{}:{}", type_name, value),
        PropertyValue::Multi { .. } => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "nested multi-valued property",
            ))
        }
    })
}
