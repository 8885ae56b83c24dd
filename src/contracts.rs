// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Runtime contracts for the prefix-set invariants.
//!
//! Debug-mode assertions, zero-cost in release builds. They check the things
//! every lookup silently relies on:
//!
//! | Contract                   | Invariant                                        |
//! |----------------------------|--------------------------------------------------|
//! | `check_prefix_len`         | `4 <= len <= 32`                                 |
//! | `check_bucket_well_formed` | `bytes.len() % len == 0`, entries strictly sorted|
//! | `check_bucket_index`       | first-byte offsets are monotone and complete     |
//! | `check_match_result`       | a reported match really is a prefix of the hash  |
//!
//! # Usage
//!
//! ```ignore
//! use vlpset::contracts::*;
//!
//! // In debug builds, this panics if invariant is violated
//! check_bucket_well_formed(4, &bytes);
//!
//! // In release builds, this is a no-op
//! ```

use crate::hash::{is_valid_prefix_len, Completion};

// ============================================================================
// COMPILE-TIME ASSERTIONS
// ============================================================================

const _: () = {
    // Every supported length fits the one-byte length field on disk.
    assert!(crate::hash::MAX_PREFIX_SIZE <= u8::MAX as usize);
    assert!(crate::hash::MIN_PREFIX_SIZE >= 1);
};

// ============================================================================
// BUCKET CONTRACTS
// ============================================================================

/// Check that a prefix length is in the supported range.
#[inline]
pub fn check_prefix_len(len: usize) {
    debug_assert!(
        is_valid_prefix_len(len),
        "Contract violation: prefix length {} outside supported range",
        len
    );
}

/// Check that a packed bucket is aligned, sorted and free of duplicates.
#[inline]
pub fn check_bucket_well_formed(len: usize, bytes: &[u8]) {
    check_prefix_len(len);
    debug_assert!(
        bytes.len() % len == 0,
        "Contract violation: bucket of {}-byte prefixes has {} bytes",
        len,
        bytes.len()
    );

    #[cfg(debug_assertions)]
    {
        let mut entries = bytes.chunks_exact(len);
        if let Some(mut prev) = entries.next() {
            for (i, entry) in entries.enumerate() {
                debug_assert!(
                    prev < entry,
                    "Contract violation: bucket of {}-byte prefixes unsorted at entry {}",
                    len,
                    i + 1
                );
                prev = entry;
            }
        }
    }
}

/// Check that a first-byte index partitions `count` entries.
///
/// `index[b]..index[b + 1]` must be the range of entries whose first byte is `b`.
#[inline]
pub fn check_bucket_index(index: &[u32], count: usize) {
    debug_assert_eq!(index.len(), 257, "Contract violation: index must have 257 slots");
    debug_assert_eq!(index[0], 0, "Contract violation: index must start at 0");
    debug_assert_eq!(
        index[256] as usize, count,
        "Contract violation: index must end at entry count"
    );
    debug_assert!(
        index.windows(2).all(|w| w[0] <= w[1]),
        "Contract violation: index offsets must be monotone"
    );
}

// ============================================================================
// LOOKUP CONTRACTS
// ============================================================================

/// Check that a reported match is a real prefix of the completion.
#[inline]
pub fn check_match_result(completion: &Completion, len: usize, matched_entry: &[u8]) {
    debug_assert_eq!(
        matched_entry,
        &completion.as_bytes()[..len],
        "Contract violation: matched entry is not a prefix of the completion"
    );
}
