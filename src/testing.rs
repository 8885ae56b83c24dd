//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical implementations of test helpers to avoid duplication.

#![doc(hidden)]

use crate::hash::Completion;
use crate::prefix_map::PrefixStringMap;

/// SHA-256 completion of a fragment.
pub fn completion(fragment: &str) -> Completion {
    Completion::from_plaintext(fragment)
}

/// Build a map from `(fragment, prefix_len)` pairs.
///
/// Each fragment is hashed and truncated to the given length. This is the
/// canonical way tests describe a list: `("bravo.com/", 32)` means "the full
/// hash of bravo.com/".
///
/// # Panics
///
/// Panics if a length is outside `4..=32`.
pub fn make_map(entries: &[(&str, usize)]) -> PrefixStringMap {
    let prefixes: Vec<Vec<u8>> = entries
        .iter()
        .map(|&(fragment, len)| completion(fragment).prefix_bytes(len).to_vec())
        .collect();
    PrefixStringMap::from_prefixes(prefixes).expect("test prefixes have valid lengths")
}

/// Map with `count` distinct prefixes of one length, derived from numbered fragments.
pub fn numbered_map(count: usize, len: usize) -> PrefixStringMap {
    let fragments: Vec<String> = (0..count).map(|i| format!("host{}.example/", i)).collect();
    let entries: Vec<(&str, usize)> = fragments.iter().map(|f| (f.as_str(), len)).collect();
    make_map(&entries)
}
