//! Property-based tests for depsync
//!
//! These tests verify invariants that must hold for all inputs:
//! - Storage-key derivation never panics and is deterministic
//! - Percent-encoding a path segment round-trips through key derivation
//! - The staleness filter only excludes exact hash matches
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;

// ============================================================================
// STORAGE KEY TESTS
// ============================================================================

mod storage_key_tests {
    use super::*;
    use depsync::storage_key;
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

    proptest! {
        /// Invariant: storage_key never panics on any string input
        #[test]
        fn never_panics(s in ".*") {
            let _ = storage_key(&s);
        }

        /// Invariant: identical URIs always resolve to the same key
        #[test]
        fn deterministic(path in "[a-zA-Z0-9%+._/-]{1,60}") {
            let uri = format!("https://host/{}", path);
            prop_assert_eq!(storage_key(&uri).ok(), storage_key(&uri).ok());
        }

        /// Invariant: an encoded segment decodes back to the original text
        #[test]
        fn decodes_encoded_segment(name in "\\PC{1,40}") {
            // "." and ".." are dot segments even when percent-encoded
            prop_assume!(name != "." && name != "..");
            let encoded = utf8_percent_encode(&name, NON_ALPHANUMERIC).to_string();
            let uri = format!("https://example.com/{}", encoded);
            prop_assert_eq!(storage_key(&uri).unwrap(), name);
        }

        /// Invariant: the query string never leaks into the key
        #[test]
        fn query_ignored(segment in "[a-z0-9]{1,20}", query in "[a-z0-9=&]{0,20}") {
            let uri = format!("https://host/{}?{}", segment, query);
            prop_assert_eq!(storage_key(&uri).unwrap(), segment);
        }

        /// Invariant: nested paths keep their inner separators
        #[test]
        fn nested_paths(dirs in prop::collection::vec("[a-z0-9]{1,8}", 1..5)) {
            let joined = dirs.join("/");
            let uri = format!("https://host/{}", joined);
            prop_assert_eq!(storage_key(&uri).unwrap(), joined);
        }
    }
}

// ============================================================================
// STALENESS TESTS
// ============================================================================

mod staleness_tests {
    use super::*;
    use depsync::storage::MemoryStore;
    use depsync::sync::check_dependency;
    use depsync::{Dependency, SHA256_METADATA_KEY};
    use std::collections::HashMap;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        /// Invariant: a dependency is fresh exactly when the stored hash matches
        #[test]
        fn fresh_iff_hash_matches(manifest_hash in "[0-9a-f]{1,64}", stored_hash in "[0-9a-fA-F]{0,64}") {
            let store = MemoryStore::new();
            let metadata = HashMap::from([(SHA256_METADATA_KEY.to_string(), stored_hash.clone())]);
            store.insert("b", "a.tgz", &b"x"[..], metadata);

            let dependency = Dependency::new("a", manifest_hash.clone(), "https://host/a.tgz", "").unwrap();
            let staleness = block_on(check_dependency(&store, "b", &dependency)).unwrap();
            prop_assert_eq!(staleness.is_none(), stored_hash == manifest_hash);
        }
    }
}
