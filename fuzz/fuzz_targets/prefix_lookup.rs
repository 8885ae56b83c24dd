// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Lookups against arbitrary prefix sets, checked against a linear scan.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vlpset::{Completion, PrefixStringMap, VariableLengthPrefixSet};

#[derive(Arbitrary, Debug)]
struct Input {
    prefixes: Vec<(u8, [u8; 32])>,
    completion: [u8; 32],
}

fuzz_target!(|input: Input| {
    let prefixes: Vec<Vec<u8>> = input
        .prefixes
        .iter()
        .map(|(len, bytes)| bytes[..4 + (*len as usize % 29)].to_vec())
        .collect();
    let Ok(map) = PrefixStringMap::from_prefixes(&prefixes) else {
        return;
    };

    let completion = Completion::from_bytes(input.completion);
    let expected = prefixes
        .iter()
        .filter(|p| completion.as_bytes().starts_with(p))
        .map(Vec::len)
        .max();

    let set = VariableLengthPrefixSet::from_map(map);
    assert_eq!(set.matches(&completion), expected);
});
