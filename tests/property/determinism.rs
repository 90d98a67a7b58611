//! Property-based tests for determinism guarantees

use proptest::prelude::*;
use treesync::fingerprint::{FingerprintOptions, PropertyFingerprint};
use treesync::namespace::NamespaceMapping;
use treesync::rewrite::ReferenceRewriter;
use treesync::tree::{MemoryStore, PropertyValue};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,8}"
}

fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 0..5).prop_map(|segments| segments.join("/"))
}

fn join(base: &str, rel: &str) -> String {
    if rel.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, rel)
    }
}

fn moved() -> NamespaceMapping {
    NamespaceMapping::new("/the", Some("/the/src"), Some("/our/dst")).unwrap()
}

proptest! {
    /// inverse_translate(translate(p)) == p below the scope
    #[test]
    fn prop_translate_round_trip_from_source(rel in relative_path()) {
        let mapping = moved();
        let path = join("/the/src", &rel);
        let there = mapping.translate(&path).unwrap();
        prop_assert_eq!(mapping.inverse_translate(&there).unwrap(), path);
    }

    /// translate(inverse_translate(q)) == q below the target root
    #[test]
    fn prop_translate_round_trip_from_target(rel in relative_path()) {
        let mapping = moved();
        let path = join("/our/dst", &rel);
        let back = mapping.inverse_translate(&path).unwrap();
        prop_assert_eq!(mapping.translate(&back).unwrap(), path);
    }

    /// Staged translation is plain translation under the prefix
    #[test]
    fn prop_translate_mapping_prefixes(rel in relative_path(), prefix in segment()) {
        let mapping = moved();
        let path = join("/the/src", &rel);
        let prefix = format!("/{}", prefix);
        let staged = mapping.translate_mapping(&prefix)(&path).unwrap();
        prop_assert_eq!(staged, format!("{}{}", prefix, mapping.translate(&path).unwrap()));
    }

    /// Same properties give the same fingerprint, regardless of insertion order
    #[test]
    fn prop_fingerprint_deterministic(
        props in prop::collection::btree_map("[a-z]{1,6}", ".{0,100}", 0..8)
    ) {
        let mut forward = MemoryStore::new();
        forward.add_node("/n", props.iter().map(|(k, v)| (k.clone(), v.clone()))).unwrap();
        let mut backward = MemoryStore::new();
        backward.add_node("/n", props.iter().rev().map(|(k, v)| (k.clone(), v.clone()))).unwrap();

        let options = FingerprintOptions::default();
        let a = PropertyFingerprint::of(&forward, "/n", None, &options).unwrap();
        let b = PropertyFingerprint::of(&backward, "/n", None, &options).unwrap();
        prop_assert_eq!(a.property_hashes.len(), props.len());
        prop_assert_eq!(a, b);
    }

    /// Changing one property changes exactly that entry
    #[test]
    fn prop_fingerprint_isolates_changes(
        props in prop::collection::btree_map("[a-z]{1,6}", -1000i64..1000, 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let options = FingerprintOptions::default();
        let name = pick.get(&props.keys().cloned().collect::<Vec<_>>()).clone();

        let mut store = MemoryStore::new();
        store.add_node("/n", props.iter().map(|(k, v)| (k.clone(), *v))).unwrap();
        let before = PropertyFingerprint::of(&store, "/n", None, &options).unwrap();
        store.add_node("/n", [(name.clone(), PropertyValue::from(props[&name] + 5000))]).unwrap();
        let after = PropertyFingerprint::of(&store, "/n", None, &options).unwrap();

        for (key, hash) in &before.property_hashes {
            if *key == name {
                prop_assert_ne!(hash, &after.property_hashes[key]);
            } else {
                prop_assert_eq!(hash, &after.property_hashes[key]);
            }
        }
    }

    /// A second rewrite pass changes nothing
    #[test]
    fn prop_rewrite_idempotent(
        rel in relative_path(),
        quote in prop::sample::select(vec!["\"", "'", "&quot;"]),
    ) {
        let reference = join("/the/src", &rel);
        let text = format!("<p><a href={q}{r}{q}>x</a></p>", q = quote, r = reference);
        let rewriter = ReferenceRewriter::new("/the/src", "/our/dst").unwrap();

        let once = rewriter.rewrite_value(&text).unwrap();
        prop_assert_eq!(
            &once,
            &format!("<p><a href={q}{r}{q}>x</a></p>", q = quote, r = join("/our/dst", &rel))
        );
        prop_assert_eq!(rewriter.rewrite_value(&once), None);
        prop_assert_eq!(rewriter.rewrite_value(&reference).unwrap(), join("/our/dst", &rel));
    }
}
