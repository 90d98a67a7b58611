//! Content path normalization and prefix utilities
//!
//! Content paths are `/`-separated strings that never touch the filesystem.
//! Every helper here is pure string manipulation so that the same path maps
//! to the same result on every system taking part in a replication.

/// Normalize a path string
///
/// This function:
/// 1. Drops empty and `.` segments (collapses `//` and `/./`)
/// 2. Cancels a segment followed by `..`
/// 3. Removes trailing slashes (except root)
///
/// Leading `..` segments of a relative path are kept, so callers can detect
/// paths that climb above their base. For absolute paths `..` stops at root.
pub fn normalize_path_string(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Remove trailing slashes, keeping a lone `/`
pub fn trim_trailing_slashes(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// Whether a normalized relative path climbs above its base
pub fn escapes_base(relative: &str) -> bool {
    relative == ".." || relative.starts_with("../")
}

/// The part of `path` below `parent`, without a leading slash
///
/// Returns `Some("")` when both are equal and `None` when `path` is neither
/// `parent` nor one of its descendants. A sibling sharing a name prefix
/// (`/a/bc` against `/a/b`) is not a descendant.
pub fn relative_path<'a>(parent: &str, path: &'a str) -> Option<&'a str> {
    if path == parent {
        return Some("");
    }
    if parent == "/" {
        return path.strip_prefix('/');
    }
    path.strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix('/'))
}

/// Whether `path` equals `parent` or lies below it
pub fn is_same_or_descendant(parent: &str, path: &str) -> bool {
    relative_path(parent, path).is_some()
}

/// Join a relative path onto a base path
pub fn append_paths(base: &str, relative: &str) -> String {
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
        return base.to_string();
    }
    if base.ends_with('/') {
        format!("{}{}", base, relative)
    } else {
        format!("{}/{}", base, relative)
    }
}

/// Strip `prefix` from `path`, keeping the result rooted at `/`
///
/// `/local/content/site` relativized against `/local` becomes
/// `/content/site`. A missing or root prefix leaves the path unchanged.
pub fn relativize(prefix: Option<&str>, path: &str) -> Option<String> {
    match prefix.map(trim_trailing_slashes) {
        None | Some("") | Some("/") => Some(path.to_string()),
        Some(prefix) => relative_path(prefix, path).map(|rel| format!("/{}", rel)),
    }
}

/// Last segment of a path (empty for root)
pub fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}
