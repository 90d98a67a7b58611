//! Reference repair after relocating a subtree
//!
//! When a release is replicated from `/content/site` to `/public/site`, string
//! properties still point at the old location. [`ReferenceRewriter`] walks the
//! relocated subtree and rewrites plain path values as well as anchor and image
//! references embedded in rich text (`<a href="...">`, `&lt;img src=&quot;...&quot;`).
//! Other markup is left alone.

use crate::error::{ReplicationError, RewriteError};
use crate::tree::path::{append_paths, relative_path, trim_trailing_slashes};
use crate::tree::{ContentWrite, PropertyType, PropertyValue};
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Per-rewriter state: the move and its compiled reference pattern
#[derive(Debug, Clone)]
pub struct MoveContext {
    source: String,
    dest: String,
    link_pattern: Regex,
}

/// Quote styles of an embedded reference: capture group of the quote and of the reference
const QUOTES: [(&str, &str); 3] = [("dq", "dq_ref"), ("sq", "sq_ref"), ("eq", "eq_ref")];

impl MoveContext {
    fn new(source: &str, dest: &str) -> Result<Self, RewriteError> {
        let source = trim_trailing_slashes(source).to_string();
        let dest = trim_trailing_slashes(dest).to_string();
        // below the root every absolute reference is in scope
        let (src, dq_tail, sq_tail, eq_tail) = if source == "/" {
            (String::new(), r#"/[^"\r\n]*"#, r#"/[^'\r\n]*"#, "/.*?")
        } else {
            (
                regex::escape(&source),
                r#"(?:/[^"\r\n]+)?"#,
                r#"(?:/[^'\r\n]+)?"#,
                "(?:/.+?)?",
            )
        };
        let pattern = format!(
            concat!(
                r#"(?P<before>(?:<|&lt;)(?:a|img)[^>]*?\s(?:href|src)=)"#,
                r#"(?:(?P<dq>")(?P<dq_ref>{src}{dq_tail})""#,
                r#"|(?P<sq>')(?P<sq_ref>{src}{sq_tail})'"#,
                r#"|(?P<eq>&quot;)(?P<eq_ref>{src}{eq_tail})&quot;)"#,
            ),
            src = src,
            dq_tail = dq_tail,
            sq_tail = sq_tail,
            eq_tail = eq_tail,
        );
        Ok(Self {
            link_pattern: Regex::new(&pattern)?,
            source,
            dest,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dest(&self) -> &str {
        &self.dest
    }

    /// Rewritten form of a single string value, `None` if it stays as is
    pub fn rewrite_value(&self, value: &str) -> Option<String> {
        if value.starts_with('/') {
            // an absolute path elsewhere stays
            self.relocate(value)
        } else {
            self.transform_text(value)
        }
    }

    /// Move an absolute path at or below the source under the destination
    fn relocate(&self, path: &str) -> Option<String> {
        let rest = relative_path(&self.source, path)?;
        Some(if rest.is_empty() {
            self.dest.clone()
        } else if self.dest == "/" {
            format!("/{}", rest)
        } else {
            format!("{}/{}", self.dest, rest)
        })
    }

    /// Replace embedded references in rich text
    fn transform_text(&self, value: &str) -> Option<String> {
        if !self.link_pattern.is_match(value) {
            return None;
        }
        let replaced = self.link_pattern.replace_all(value, |caps: &Captures| {
            let target = QUOTES.iter().find_map(|(q, r)| {
                let quote = caps.name(q)?.as_str();
                let reference = caps.name(r)?.as_str();
                let moved = self.relocate(reference)?;
                Some(format!("{}{}{}{}", &caps["before"], quote, moved, quote))
            });
            target.unwrap_or_else(|| caps[0].to_string())
        });
        Some(replaced.into_owned())
    }

    /// Whether a value still mentions the move source outside of the destination
    fn still_references_source(&self, value: &str) -> bool {
        if self.source == "/" {
            false
        } else if self.dest.contains(&self.source) {
            value.replace(&self.dest, "").contains(&self.source)
        } else {
            value.contains(&self.source)
        }
    }
}

/// Outcome of a rewrite pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteReport {
    pub nodes_visited: usize,
    pub properties_rewritten: usize,
    /// Property paths whose value still contains the move source afterwards
    pub suspicious: Vec<String>,
}

/// Rewrites references from a move source to its destination
#[derive(Debug, Clone)]
pub struct ReferenceRewriter {
    context: Option<MoveContext>,
}

impl ReferenceRewriter {
    /// Create a rewriter for moving `source_path` to `dest_path`
    ///
    /// Blank or identical paths yield a rewriter that changes nothing.
    pub fn new(source_path: &str, dest_path: &str) -> Result<Self, RewriteError> {
        let source = trim_trailing_slashes(source_path.trim());
        let dest = trim_trailing_slashes(dest_path.trim());
        if source.is_empty() || dest.is_empty() || source == dest {
            return Ok(Self::noop());
        }
        if !source.starts_with('/') || !dest.starts_with('/') {
            return Err(RewriteError::RelativeMove {
                source_path: source_path.to_string(),
                dest_path: dest_path.to_string(),
            });
        }
        Ok(Self {
            context: Some(MoveContext::new(source, dest)?),
        })
    }

    pub fn noop() -> Self {
        Self { context: None }
    }

    pub fn is_noop(&self) -> bool {
        self.context.is_none()
    }

    pub fn context(&self) -> Option<&MoveContext> {
        self.context.as_ref()
    }

    /// Rewritten form of a single string value, `None` if unchanged
    pub fn rewrite_value(&self, value: &str) -> Option<String> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.rewrite_value(value))
            .filter(|new| new != value)
    }

    /// Rewrite every string property of the subtree at `root`, depth-first
    ///
    /// Writes go through `store`; committing them is left to the caller.
    #[instrument(skip(self, store))]
    pub fn rewrite<S>(&self, store: &mut S, root: &str) -> Result<RewriteReport, ReplicationError>
    where
        S: ContentWrite + ?Sized,
    {
        let mut report = RewriteReport::default();
        let Some(ctx) = &self.context else {
            debug!("No move configured, skipping reference rewrite");
            return Ok(report);
        };

        let mut stack = vec![root.to_string()];
        while let Some(path) = stack.pop() {
            report.nodes_visited += 1;
            for (name, value) in store.properties(&path)? {
                let (rewritten, current) = match &value {
                    PropertyValue::String(s) => match self.rewrite_value(s) {
                        Some(new) => (Some(PropertyValue::String(new.clone())), vec![new]),
                        None => (None, vec![s.clone()]),
                    },
                    PropertyValue::Multi {
                        element_type: PropertyType::String,
                        values,
                    } => rewrite_elements(self, values),
                    _ => continue,
                };

                if let Some(new_value) = rewritten {
                    debug!(path = %path, property = %name, "Rewriting reference");
                    store.set_property(&path, &name, new_value)?;
                    report.properties_rewritten += 1;
                }
                if current.iter().any(|v| ctx.still_references_source(v)) {
                    let property_path = append_paths(&path, &name);
                    warn!(
                        property = %property_path,
                        source = %ctx.source,
                        "Value still contains the move source after rewrite"
                    );
                    report.suspicious.push(property_path);
                }
            }

            let mut children = store.children(&path)?;
            children.reverse();
            stack.extend(children);
        }

        info!(
            source = %ctx.source,
            dest = %ctx.dest,
            nodes = report.nodes_visited,
            rewritten = report.properties_rewritten,
            "Reference rewrite complete"
        );
        Ok(report)
    }
}

/// Element-wise rewrite of a multi-valued string property
fn rewrite_elements(
    rewriter: &ReferenceRewriter,
    values: &[PropertyValue],
) -> (Option<PropertyValue>, Vec<String>) {
    let mut changed = false;
    let current: Vec<String> = values
        .iter()
        .filter_map(PropertyValue::as_str)
        .map(|s| match rewriter.rewrite_value(s) {
            Some(new) => {
                changed = true;
                new
            }
            None => s.to_string(),
        })
        .collect();
    let rewritten = changed.then(|| PropertyValue::strings(current.iter().cloned()));
    (rewritten, current)
}
