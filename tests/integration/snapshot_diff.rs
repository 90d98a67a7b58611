//! Integration tests for snapshot collection, wire format and diffing

use super::test_utils::sample_site;
use treesync::snapshot::{diff, Snapshot, SnapshotCollector, VersionedEntry};

fn snapshot(entries: &[(&str, &str)]) -> Snapshot {
    entries
        .iter()
        .map(|(path, version)| VersionedEntry::new(*path, *version))
        .collect()
}

#[test]
fn test_diff_reports_changed_and_deleted() {
    let local = snapshot(&[("/a", "a"), ("/b", "b"), ("/b/c1", "bc1"), ("/b/c2", "bc2")]);
    let foreign = snapshot(&[("/a", "ax"), ("/b", "b"), ("/b/c1", "bc1x")]);

    let result = diff(&foreign, None, &local, None, None);

    assert_eq!(
        result.changed,
        vec![VersionedEntry::new("/a", "ax"), VersionedEntry::new("/b/c1", "bc1x")]
    );
    assert_eq!(result.deleted, vec![VersionedEntry::new("/b/c2", "bc2")]);
    assert!(!result.changed_paths().contains(&"/b"));
    assert!(!result.deleted_paths().contains(&"/b"));
}

#[test]
fn test_diff_strips_each_side_prefix() {
    let local = snapshot(&[("/local/x", "1"), ("/local/y", "1")]);
    let foreign = snapshot(&[("/remote/x", "1"), ("/remote/z", "1")]);

    let result = diff(&foreign, Some("/remote"), &local, Some("/local"), None);

    assert_eq!(result.changed_paths(), vec!["/z"]);
    assert_eq!(result.deleted_paths(), vec!["/y"]);
}

#[test]
fn test_diff_scope_restricts_both_sides() {
    let local = snapshot(&[("/a", "a"), ("/b/c2", "bc2")]);
    let foreign = snapshot(&[("/a", "ax"), ("/b/c1", "bc1")]);

    let result = diff(&foreign, None, &local, None, Some("/b"));

    assert_eq!(result.changed_paths(), vec!["/b/c1"]);
    assert_eq!(result.deleted_paths(), vec!["/b/c2"]);
}

#[test]
fn test_wire_format_skips_malformed_entries() {
    let json = r#"[
        {"path": "/a", "version": "1"},
        {"path": "/b"},
        {"version": "2"},
        "junk",
        {"path": "/c", "version": "3"}
    ]"#;
    let parsed = Snapshot::from_json(json).unwrap();

    let paths: Vec<&str> = parsed.snapshot.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/a", "/c"]);
    let rejected: Vec<usize> = parsed.rejected.iter().map(|r| r.index).collect();
    assert_eq!(rejected, vec![1, 2, 3]);

    assert!(Snapshot::from_json(r#"{"path": "/a"}"#).is_err());
}

#[test]
fn test_collected_snapshot_round_trips_through_json() {
    let store = sample_site();
    let collected = SnapshotCollector::new(["/content/site"])
        .relative_to(Some("/content"))
        .collect(&store)
        .unwrap();

    let paths: Vec<&str> = collected.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/site", "/site/a", "/site/b/c"]);

    let json = collected.to_json().unwrap();
    let parsed = Snapshot::from_json(&json).unwrap();
    assert!(parsed.rejected.is_empty());
    assert_eq!(parsed.snapshot, collected);
}

#[test]
fn test_stop_at_versioned_treats_tracked_nodes_as_atomic() {
    let store = sample_site();
    let collected = SnapshotCollector::new(["/content/site"])
        .stop_at_versioned(true)
        .collect(&store)
        .unwrap();
    assert_eq!(collected.len(), 1);
    assert_eq!(collected.entries()[0].path, "/content/site");
}

#[test]
fn test_collect_then_diff_against_modified_copy() {
    let local_store = sample_site();
    let mut foreign_store = sample_site();
    foreign_store
        .set_versioned("/content/site/a", Some("av2"))
        .unwrap();
    foreign_store
        .add_node("/content/site/new", Vec::<(&str, &str)>::new())
        .unwrap();
    foreign_store
        .set_versioned("/content/site/new", Some("n1"))
        .unwrap();
    foreign_store
        .set_versioned("/content/site/b/c", None)
        .unwrap();

    let collector = SnapshotCollector::new(["/content/site"]);
    let foreign = collector.collect(&foreign_store).unwrap();
    let local = collector.collect(&local_store).unwrap();

    let result = diff(&foreign, Some("/content"), &local, Some("/content"), None);
    assert_eq!(result.changed_paths(), vec!["/site/a", "/site/new"]);
    assert_eq!(result.deleted_paths(), vec!["/site/b/c"]);
}
