//! Shared test utilities for integration tests
//!
//! Isolates HOME for config loading and builds small content trees.

use std::sync::Mutex;
use tempfile::TempDir;
use treesync::tree::MemoryStore;

/// Serializes HOME access across tests running in parallel
static HOME_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with HOME pointing into `test_dir`, restoring it afterwards
pub fn with_home_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = HOME_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::var_os("HOME");
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    match original {
        Some(value) => std::env::set_var("HOME", value),
        None => std::env::remove_var("HOME"),
    }
    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// A release below `/content/site` with a moved-content candidate page
///
/// ```text
/// /content/site            (tracked, v1)
/// /content/site/a          (tracked, av1)
/// /content/site/b          (untracked)
/// /content/site/b/c        (tracked, cv1)
/// ```
pub fn sample_site() -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .add_node(
            "/content/site",
            [("jcr:title", "Site"), ("link", "/content/site/a")],
        )
        .unwrap();
    store
        .add_node(
            "/content/site/a",
            [(
                "text",
                r#"<p><a href="/content/site/b/c">c</a> and <img src="/content/site/a/img.png"></p>"#,
            )],
        )
        .unwrap();
    store
        .add_node("/content/site/b", Vec::<(&str, &str)>::new())
        .unwrap();
    store
        .add_node("/content/site/b/c", [("ref", "/content/site")])
        .unwrap();
    store.set_versioned("/content/site", Some("v1")).unwrap();
    store.set_versioned("/content/site/a", Some("av1")).unwrap();
    store.set_versioned("/content/site/b/c", Some("cv1")).unwrap();
    store
}
