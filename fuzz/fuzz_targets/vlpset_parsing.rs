// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! vlpset parsing under adversarial input.
//!
//! Table files sit in a profile directory that anything on the machine can
//! scribble over. The worst a crafted file may do is fail to load: no panic,
//! no huge allocation, and never a set that answers lookups from unsorted
//! buckets.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vlpset::binary::{decode_vlpset, encode_vlpset, validate_bucket};

fuzz_target!(|data: &[u8]| {
    let Ok(map) = decode_vlpset(data) else {
        return;
    };

    // INVARIANT 1: every accepted bucket is aligned, sorted and unique
    for (len, bytes) in map.iter() {
        assert!(
            validate_bucket(len, bytes).is_ok(),
            "decoder accepted a malformed {}-byte bucket",
            len
        );
    }

    // INVARIANT 2: re-encoding an accepted file loses nothing
    let mut reencoded = Vec::new();
    encode_vlpset(&map, &mut reencoded);
    let again = decode_vlpset(&reencoded).expect("re-encoded file must decode");
    assert_eq!(again, map);
});
