//! Path translation between the source and target namespace of a replication
//!
//! A [`NamespaceMapping`] describes where a release lives on the source side
//! (`source_root`, optionally narrowed to `source_scope`) and where it is put
//! on the target side (`target_root`). Translation is pure string work: no
//! store is consulted and nothing is cached.

use crate::error::{PathError, RewriteError};
use crate::rewrite::ReferenceRewriter;
use crate::tree::path::{
    append_paths, escapes_base, is_same_or_descendant, normalize_path_string, relative_path,
    relativize, trim_trailing_slashes,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed mapping between a source and a target namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMapping {
    source_root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_prefix: Option<String>,
}

impl NamespaceMapping {
    /// Create a mapping
    ///
    /// Blank `source_scope` / `target_root` count as absent. The scope must be
    /// the source root or lie below it.
    pub fn new(
        source_root: &str,
        source_scope: Option<&str>,
        target_root: Option<&str>,
    ) -> Result<Self, PathError> {
        let source_root = absolute(source_root)?;
        let source_scope = source_scope
            .filter(|s| !s.trim().is_empty())
            .map(absolute)
            .transpose()?;
        let target_root = target_root
            .filter(|s| !s.trim().is_empty())
            .map(absolute)
            .transpose()?;

        if let Some(scope) = &source_scope {
            if !is_same_or_descendant(&source_root, scope) {
                return Err(PathError::ScopeOutsideRoot {
                    scope: scope.clone(),
                    root: source_root,
                });
            }
        }

        Ok(Self {
            source_root,
            source_scope,
            target_root,
            external_prefix: None,
        })
    }

    /// Set the staging location the target namespace is mounted under
    pub fn with_external_prefix(mut self, prefix: Option<&str>) -> Self {
        self.external_prefix = prefix
            .map(trim_trailing_slashes)
            .filter(|p| !p.is_empty() && *p != "/")
            .map(str::to_string);
        self
    }

    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    pub fn source_scope(&self) -> Option<&str> {
        self.source_scope.as_deref()
    }

    pub fn target_root(&self) -> Option<&str> {
        self.target_root.as_deref()
    }

    pub fn external_prefix(&self) -> Option<&str> {
        self.external_prefix.as_deref()
    }

    /// The subtree being translated: the scope if set, else the source root
    pub fn origin(&self) -> &str {
        self.source_scope.as_deref().unwrap_or(&self.source_root)
    }

    /// Where content lands: the target root if set, else the source root
    pub fn destination(&self) -> &str {
        self.target_root.as_deref().unwrap_or(&self.source_root)
    }

    /// Whether translation relocates content
    pub fn is_move(&self) -> bool {
        self.target_root
            .as_deref()
            .map_or(false, |target| target != self.origin())
    }

    /// Intersection of `path` with the origin
    ///
    /// A path inside the origin is returned unchanged; a path containing the
    /// origin yields the origin; anything else yields `None`.
    pub fn trim_to_origin(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        let origin = self.origin();
        if is_same_or_descendant(origin, path) {
            Some(path.to_string())
        } else if is_same_or_descendant(path, origin) {
            Some(origin.to_string())
        } else {
            None
        }
    }

    /// Translate a source-side path into the target namespace
    pub fn translate(&self, path: &str) -> Result<String, PathError> {
        rebase(path, self.origin(), self.target_root.as_deref().unwrap_or(self.origin()))
    }

    /// Translate a target-side path back into the source namespace
    pub fn inverse_translate(&self, path: &str) -> Result<String, PathError> {
        rebase(path, self.target_root.as_deref().unwrap_or(self.origin()), self.origin())
    }

    /// `translate` followed by prepending `prefix` (blank prefix: none)
    pub fn translate_mapping<'a>(
        &'a self,
        prefix: &str,
    ) -> impl Fn(&str) -> Result<String, PathError> + 'a {
        let prefix = trim_trailing_slashes(prefix.trim()).to_string();
        move |path| {
            let translated = self.translate(path)?;
            Ok(if prefix.is_empty() {
                translated
            } else {
                append_paths(&prefix, &translated)
            })
        }
    }

    /// Strip `prefix` from the input, then `inverse_translate`
    ///
    /// An input that does not lie below `prefix` is out of scope.
    pub fn inverse_translate_mapping<'a>(
        &'a self,
        prefix: &str,
    ) -> impl Fn(&str) -> Result<String, PathError> + 'a {
        let prefix = trim_trailing_slashes(prefix.trim()).to_string();
        move |path| {
            let stripped = if prefix.is_empty() {
                path.to_string()
            } else {
                relativize(Some(&prefix), path).ok_or_else(|| PathError::OutOfScope {
                    path: path.to_string(),
                    root: prefix.clone(),
                })?
            };
            self.inverse_translate(&stripped)
        }
    }

    /// Location of a translated path below this mapping's staging prefix
    pub fn staging_path(&self, path: &str) -> Result<String, PathError> {
        self.translate_mapping(self.external_prefix.as_deref().unwrap_or(""))(path)
    }

    /// Rewriter repairing references after moving the origin to the target root
    pub fn rewriter(&self) -> Result<ReferenceRewriter, RewriteError> {
        match &self.target_root {
            Some(target) if self.is_move() => ReferenceRewriter::new(self.origin(), target),
            _ => Ok(ReferenceRewriter::noop()),
        }
    }
}

impl fmt::Display for NamespaceMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_root)?;
        if let Some(scope) = &self.source_scope {
            write!(f, " [{}]", scope)?;
        }
        if let Some(target) = &self.target_root {
            write!(f, " -> {}", target)?;
        }
        if let Some(prefix) = &self.external_prefix {
            write!(f, " (staged under {})", prefix)?;
        }
        Ok(())
    }
}

fn absolute(path: &str) -> Result<String, PathError> {
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(PathError::NotAbsolute(path.to_string()));
    }
    Ok(normalize_path_string(path))
}

/// Move `path` from below `from` to below `to`
fn rebase(path: &str, from: &str, to: &str) -> Result<String, PathError> {
    let out_of_scope = || PathError::OutOfScope {
        path: path.to_string(),
        root: from.to_string(),
    };
    let rest = relative_path(from, path).ok_or_else(out_of_scope)?;
    let rest = normalize_path_string(rest);
    if escapes_base(&rest) {
        return Err(out_of_scope());
    }
    Ok(append_paths(to, &rest))
}
