//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use vlpset::binary::encode_pset;
use vlpset::{LookupCache, MemoryStore, PrefixStringMap};

// Re-export canonical test utilities from vlpset::testing
pub use vlpset::testing::{completion, make_map, numbered_map};

/// Table name used by most tests.
pub const TABLE: &str = "test-malware-proto";

/// The four-entry list used throughout: one prefix per interesting length.
///
/// | fragment        | stored length |
/// |-----------------|---------------|
/// | `bravo.com/`    | 32 (full)     |
/// | `browsing.com/` | 8             |
/// | `gound.com/`    | 5             |
/// | `small.com/`    | 4             |
pub fn sample_map() -> PrefixStringMap {
    make_map(&[
        ("bravo.com/", 32),
        ("browsing.com/", 8),
        ("gound.com/", 5),
        ("small.com/", 4),
    ])
}

/// A cache over a fresh memory store, returned with the store.
pub fn memory_cache() -> (LookupCache, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let cache = LookupCache::new(TABLE, store.clone());
    (cache, store)
}

/// A cache built from `sample_map()`.
pub fn sample_cache() -> (LookupCache, Arc<MemoryStore>) {
    let (cache, store) = memory_cache();
    cache.build(&mut sample_map());
    (cache, store)
}

/// Legacy pset bytes holding the 4-byte prefixes of `fragments`.
pub fn legacy_file(fragments: &[&str]) -> Vec<u8> {
    let entries: Vec<(&str, usize)> = fragments.iter().map(|f| (*f, 4)).collect();
    let map = make_map(&entries);
    let mut bytes = Vec::new();
    encode_pset(4, map.get(4).unwrap_or_default(), &mut bytes).expect("sorted legacy prefixes");
    bytes
}

/// Assert the `(has, match_length, confirmed)` triple for one fragment.
#[track_caller]
pub fn assert_lookup(cache: &LookupCache, fragment: &str, has: bool, len: usize, confirmed: bool) {
    let result = cache.has(&completion(fragment));
    assert_eq!(
        (result.has, result.match_length, result.confirmed),
        (has, len, confirmed),
        "lookup of {}",
        fragment
    );
}
