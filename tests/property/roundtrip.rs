//! File format property tests.
//!
//! - vlpset encoding is reversible for any prefix list
//! - the prefix set writes back exactly what it was built from
//! - legacy pset files decode to the same map as a vlpset of the same list
//! - any single-byte corruption of a vlpset file is rejected

use proptest::prelude::*;
use vlpset::binary::{decode_file, decode_vlpset, encode_pset, encode_vlpset};
use vlpset::{FileFormat, PrefixStringMap, VariableLengthPrefixSet};

use super::{map_of, prefix_list_strategy, single_length_strategy};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: decode(encode(map)) == map.
    #[test]
    fn prop_vlpset_roundtrip(prefixes in prefix_list_strategy()) {
        let map = map_of(&prefixes);
        let mut buf = Vec::new();
        encode_vlpset(&map, &mut buf);
        prop_assert_eq!(decode_vlpset(&buf).unwrap(), map);
    }

    /// Property: every input prefix survives construction, duplicates collapse.
    #[test]
    fn prop_map_holds_each_distinct_prefix_once(prefixes in prefix_list_strategy()) {
        let map = map_of(&prefixes);
        let mut distinct = prefixes.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(map.prefix_count(), distinct.len());

        for prefix in &distinct {
            let bucket = map.get(prefix.len()).unwrap();
            prop_assert!(bucket.chunks_exact(prefix.len()).any(|e| e == prefix.as_slice()));
        }
    }

    /// Property: write_prefixes / load_prefixes gives back the build input.
    #[test]
    fn prop_prefix_set_write_load(prefixes in prefix_list_strategy()) {
        let map = map_of(&prefixes);
        let set = VariableLengthPrefixSet::from_map(map.clone());
        prop_assert_eq!(set.get_prefixes_sorted(), map.clone());

        let mut buf = Vec::new();
        set.write_prefixes(&mut buf).unwrap();
        prop_assert_eq!(VariableLengthPrefixSet::load_prefixes(buf.as_slice()).unwrap(), map);
    }

    /// Property: the set writes the same bytes as encoding its map directly.
    #[test]
    fn prop_prefix_set_bytes_match_map_encoding(prefixes in prefix_list_strategy()) {
        let map = map_of(&prefixes);
        let mut from_map = Vec::new();
        encode_vlpset(&map, &mut from_map);

        let mut from_set = Vec::new();
        VariableLengthPrefixSet::from_map(map).write_prefixes(&mut from_set).unwrap();
        prop_assert_eq!(from_set, from_map);
    }

    /// Property: a legacy file and a vlpset file of the same list load identically.
    #[test]
    fn prop_legacy_matches_current((len, prefixes) in single_length_strategy()) {
        let map = map_of(&prefixes);
        let mut legacy = Vec::new();
        encode_pset(len, map.get(len).unwrap_or_default(), &mut legacy).unwrap();
        let mut current = Vec::new();
        encode_vlpset(&map, &mut current);

        let from_legacy = decode_file(&legacy).unwrap();
        let from_current = decode_file(&current).unwrap();
        prop_assert_eq!(from_legacy.format(), FileFormat::Legacy);
        prop_assert_eq!(from_current.format(), FileFormat::Current);
        prop_assert_eq!(from_legacy.into_map(), from_current.into_map());
    }

    /// Property: flipping any bit of a vlpset file makes it undecodable.
    #[test]
    fn prop_single_bit_corruption_is_rejected(
        prefixes in prefix_list_strategy(),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut buf = Vec::new();
        encode_vlpset(&map_of(&prefixes), &mut buf);

        let i = position.index(buf.len());
        buf[i] ^= 1 << bit;
        prop_assert!(decode_vlpset(&buf).is_err(), "flip at byte {} accepted", i);
    }
}

#[test]
fn empty_map_encodes_to_header_and_footer() {
    let mut buf = Vec::new();
    encode_vlpset(&PrefixStringMap::new(), &mut buf);
    assert_eq!(buf.len(), 16);
    assert!(decode_vlpset(&buf).unwrap().is_empty());
}
