//! Integration tests for property fingerprints

use std::io::Write;
use tempfile::NamedTempFile;
use treesync::fingerprint::{FingerprintOptions, PropertyFingerprint};
use treesync::tree::hasher::{digest_str, DIGEST_HEX_LEN};
use treesync::tree::{BinaryValue, ContentWrite, MemoryStore, PropertyValue};

fn page(store: &mut MemoryStore, path: &str) {
    store
        .add_node(
            path,
            [
                ("jcr:title", PropertyValue::from("Welcome")),
                ("count", PropertyValue::from(42i64)),
                ("ratio", PropertyValue::from(0.5f64)),
                ("tags", PropertyValue::strings(["a", "b"])),
                ("cpl:changeNumber", PropertyValue::from(7i64)),
            ],
        )
        .unwrap();
}

#[test]
fn test_fingerprint_is_deterministic_and_ignores_configured_properties() {
    let mut store = MemoryStore::new();
    page(&mut store, "/content/page");
    let options = FingerprintOptions::default();

    let first = PropertyFingerprint::of(&store, "/content/page", None, &options).unwrap();
    let second = PropertyFingerprint::of(&store, "/content/page", None, &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.property_hashes["jcr:title"], "S:Welcome");
    assert_eq!(first.property_hashes["count"], "n:42");
    assert!(!first.property_hashes.contains_key("cpl:changeNumber"));
}

#[test]
fn test_single_property_change_changes_single_entry() {
    let mut store = MemoryStore::new();
    page(&mut store, "/content/page");
    let options = FingerprintOptions::default();
    let before = PropertyFingerprint::of(&store, "/content/page", None, &options).unwrap();

    store
        .set_property("/content/page", "count", PropertyValue::from(43i64))
        .unwrap();
    let after = PropertyFingerprint::of(&store, "/content/page", None, &options).unwrap();

    let changed: Vec<&String> = before
        .property_hashes
        .keys()
        .filter(|name| before.property_hashes[*name] != after.property_hashes[*name])
        .collect();
    assert_eq!(changed, vec!["count"]);
    assert_eq!(before.difference(&after), "count=n:42|n:43");
}

#[test]
fn test_fingerprint_is_prefix_independent() {
    let mut mounted = MemoryStore::new();
    page(&mut mounted, "/prefix/some/node");
    let mut plain = MemoryStore::new();
    page(&mut plain, "/some/node");
    let options = FingerprintOptions::default();

    let stripped =
        PropertyFingerprint::of(&mounted, "/prefix/some/node", Some("/prefix"), &options).unwrap();
    let direct = PropertyFingerprint::of(&plain, "/some/node", None, &options).unwrap();

    assert_eq!(stripped, direct);
    assert_eq!(stripped.path, "/some/node");
    assert!(stripped.difference(&direct).is_empty());
}

#[test]
fn test_long_text_and_binary_are_hashed() {
    let long = "x".repeat(DIGEST_HEX_LEN + 1);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"binary payload").unwrap();

    let mut store = MemoryStore::new();
    store
        .add_node(
            "/n",
            [
                ("long", PropertyValue::from(long.as_str())),
                (
                    "inline",
                    PropertyValue::from(BinaryValue::Inline(b"binary payload".to_vec())),
                ),
                (
                    "file",
                    PropertyValue::from(BinaryValue::File(file.path().to_path_buf())),
                ),
            ],
        )
        .unwrap();

    let fp = PropertyFingerprint::of(&store, "/n", None, &FingerprintOptions::default()).unwrap();
    assert_eq!(fp.property_hashes["long"], format!("S:{}", digest_str(&long)));
    assert_eq!(fp.property_hashes["inline"], fp.property_hashes["file"]);
    assert!(fp.property_hashes["inline"].starts_with("B:"));
    assert_eq!(fp.property_hashes["inline"].len(), 2 + DIGEST_HEX_LEN);
}

#[test]
fn test_wire_format_uses_sorted_camel_case_keys() {
    let mut store = MemoryStore::new();
    page(&mut store, "/p");
    let fp = PropertyFingerprint::of(&store, "/p", None, &FingerprintOptions::default()).unwrap();

    let json = serde_json::to_string(&fp).unwrap();
    assert!(json.starts_with(r#"{"path":"/p","propertyHashes":{"count""#));
    let back: PropertyFingerprint = serde_json::from_str(&json).unwrap();
    assert_eq!(back, fp);
}

#[test]
fn test_node_outside_strip_prefix_is_an_error() {
    let mut store = MemoryStore::new();
    page(&mut store, "/other/node");
    let result =
        PropertyFingerprint::of(&store, "/other/node", Some("/prefix"), &FingerprintOptions::default());
    assert!(result.is_err());
}
