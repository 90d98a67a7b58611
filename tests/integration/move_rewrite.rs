//! Integration tests for reference rewriting on staging copies

use super::test_utils::sample_site;
use treesync::namespace::NamespaceMapping;
use treesync::rewrite::ReferenceRewriter;
use treesync::tree::{ContentRead, ContentWrite, MemoryStore, PropertyValue};

const RICH_TEXT: &str = r#"<a href="/the/src/bla">x</a>...<a href="/the/src">y</a>"#;

fn moved_content() -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .add_node(
            "/the/src",
            [
                ("exact", PropertyValue::from("/the/src")),
                ("below", PropertyValue::from("/the/src/something")),
                ("text", PropertyValue::from(RICH_TEXT)),
                ("unrelated", PropertyValue::from("/something/else")),
                ("number", PropertyValue::from(12i64)),
                (
                    "links",
                    PropertyValue::strings(["/the/src/x", "/elsewhere"]),
                ),
            ],
        )
        .unwrap();
    store
        .add_node(
            "/the/src/child",
            [(
                "escaped",
                "&lt;img src=&quot;/the/src/i.png&quot;&gt; &lt;a href=&quot;/the/src&quot;&gt;",
            )],
        )
        .unwrap();
    store
}

fn string(store: &MemoryStore, path: &str, name: &str) -> String {
    store
        .get(path, name)
        .and_then(PropertyValue::as_str)
        .unwrap()
        .to_string()
}

#[test]
fn test_rewrite_scenario() {
    let source = moved_content();
    let mut staging = MemoryStore::staging_copy(&source, "/the/src").unwrap();
    let rewriter = ReferenceRewriter::new("/the/src", "/our/dst").unwrap();

    let report = rewriter.rewrite(&mut staging, "/the/src").unwrap();

    assert_eq!(string(&staging, "/the/src", "exact"), "/our/dst");
    assert_eq!(string(&staging, "/the/src", "below"), "/our/dst/something");
    assert_eq!(
        string(&staging, "/the/src", "text"),
        r#"<a href="/our/dst/bla">x</a>...<a href="/our/dst">y</a>"#
    );
    assert_eq!(string(&staging, "/the/src", "unrelated"), "/something/else");
    assert_eq!(staging.get("/the/src", "number"), Some(&PropertyValue::from(12i64)));
    assert_eq!(
        staging.get("/the/src", "links"),
        Some(&PropertyValue::strings(["/our/dst/x", "/elsewhere"]))
    );
    assert_eq!(
        string(&staging, "/the/src/child", "escaped"),
        "&lt;img src=&quot;/our/dst/i.png&quot;&gt; &lt;a href=&quot;/our/dst&quot;&gt;"
    );

    assert_eq!(report.nodes_visited, 2);
    assert_eq!(report.properties_rewritten, 5);
    assert!(report.suspicious.is_empty());
}

#[test]
fn test_rewrite_never_touches_the_original() {
    let source = moved_content();
    let mut staging = MemoryStore::staging_copy(&source, "/the/src").unwrap();
    ReferenceRewriter::new("/the/src", "/our/dst")
        .unwrap()
        .rewrite(&mut staging, "/the/src")
        .unwrap();

    assert_eq!(string(&source, "/the/src", "exact"), "/the/src");
    assert_eq!(source.pending_writes(), 0);
    assert!(staging.pending_writes() > 0);
}

#[test]
fn test_rewrite_is_idempotent() {
    let source = moved_content();
    let mut staging = MemoryStore::staging_copy(&source, "/the/src").unwrap();
    let rewriter = ReferenceRewriter::new("/the/src", "/our/dst").unwrap();

    rewriter.rewrite(&mut staging, "/the/src").unwrap();
    staging.commit().unwrap();
    let once = staging.to_dump("/the/src").unwrap();

    let second = rewriter.rewrite(&mut staging, "/the/src").unwrap();
    assert_eq!(second.properties_rewritten, 0);
    assert_eq!(staging.pending_writes(), 0);
    assert_eq!(staging.to_dump("/the/src").unwrap(), once);

    for (name, value) in staging.properties("/the/src").unwrap() {
        if let Some(s) = value.as_str() {
            assert!(!s.contains("/the/src"), "{} still references the source", name);
        }
    }
}

#[test]
fn test_unhandled_reference_shapes_are_flagged_not_fatal() {
    let mut store = MemoryStore::new();
    store
        .add_node(
            "/the/src",
            [("style", r#"<div style="background: url(/the/src/bg.png)">"#)],
        )
        .unwrap();

    let report = ReferenceRewriter::new("/the/src", "/our/dst")
        .unwrap()
        .rewrite(&mut store, "/the/src")
        .unwrap();

    assert_eq!(report.properties_rewritten, 0);
    assert_eq!(report.suspicious, vec!["/the/src/style".to_string()]);
}

#[test]
fn test_mapping_rewriter_moves_site_references() {
    let store = sample_site();
    let mapping =
        NamespaceMapping::new("/content", Some("/content/site"), Some("/public/site")).unwrap();
    let mut staging = MemoryStore::staging_copy(&store, "/content/site").unwrap();

    let report = mapping
        .rewriter()
        .unwrap()
        .rewrite(&mut staging, "/content/site")
        .unwrap();
    staging.commit().unwrap();

    assert_eq!(report.nodes_visited, 4);
    assert_eq!(string(&staging, "/content/site", "link"), "/public/site/a");
    assert_eq!(string(&staging, "/content/site/b/c", "ref"), "/public/site");
    assert_eq!(
        string(&staging, "/content/site/a", "text"),
        r#"<p><a href="/public/site/b/c">c</a> and <img src="/public/site/a/img.png"></p>"#
    );
    assert_eq!(staging.commits(), 1);
}

#[test]
fn test_relative_move_is_rejected() {
    assert!(ReferenceRewriter::new("the/src", "/our/dst").is_err());
    assert!(ReferenceRewriter::new("/same", "/same/").unwrap().is_noop());
}
