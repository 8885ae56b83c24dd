//! Lookup semantics: longest match, confirmation, full replacement on build.

use crate::common::{assert_lookup, completion, make_map, memory_cache, sample_cache, sample_map};
use vlpset::{lookup_fragments, LookupResult};

#[test]
fn full_hash_is_confirmed() {
    let (cache, _) = sample_cache();
    assert_lookup(&cache, "bravo.com/", true, 32, true);
}

#[test]
fn shorter_matches_are_not_confirmed() {
    let (cache, _) = sample_cache();
    assert_lookup(&cache, "browsing.com/", true, 8, false);
    assert_lookup(&cache, "gound.com/", true, 5, false);
    assert_lookup(&cache, "small.com/", true, 4, false);
}

#[test]
fn unknown_fragment_misses() {
    let (cache, _) = sample_cache();
    let result = cache.has(&completion("nomatch.com/"));
    assert_eq!(result, LookupResult::default());
    assert_eq!(result.match_length, 0);
}

#[test]
fn longest_of_several_lengths_wins() {
    let (cache, _) = memory_cache();
    cache.build(&mut make_map(&[
        ("example.com/", 4),
        ("example.com/", 5),
        ("example.com/", 32),
    ]));
    assert_lookup(&cache, "example.com/", true, 32, true);
}

#[test]
fn second_build_replaces_the_first() {
    let (cache, _) = memory_cache();

    cache.build(&mut make_map(&[("alph", 4)]));
    assert_lookup(&cache, "alph", true, 4, false);

    cache.build(&mut make_map(&[("beta", 4)]));
    assert_lookup(&cache, "beta", true, 4, false);
    assert_lookup(&cache, "alph", false, 0, false);
    assert_eq!(cache.prefix_count(), 1);
}

#[test]
fn rebuilding_with_the_same_input_is_idempotent() {
    let queries = ["bravo.com/", "browsing.com/", "gound.com/", "small.com/", "nomatch.com/"];
    let (cache, _) = sample_cache();
    let first: Vec<LookupResult> = queries.iter().map(|p| cache.has(&completion(p))).collect();

    cache.build(&mut sample_map());
    let second: Vec<LookupResult> = queries.iter().map(|p| cache.has(&completion(p))).collect();

    assert_eq!(first, second);
}

#[test]
fn build_takes_ownership_of_the_map() {
    let (cache, _) = memory_cache();
    let mut map = sample_map();
    cache.build(&mut map);
    assert!(map.is_empty());
    assert_eq!(map.prefix_count(), 0);
    assert_eq!(cache.get_prefixes(), sample_map());
}

#[test]
fn clear_all_empties_until_next_build() {
    let (cache, _) = sample_cache();
    cache.clear_all();
    assert!(cache.is_empty());
    assert_lookup(&cache, "bravo.com/", false, 0, false);

    cache.build(&mut sample_map());
    assert_lookup(&cache, "bravo.com/", true, 32, true);
}

#[test]
fn url_spec_matches_through_host_suffix() {
    let (cache, _) = sample_cache();
    let hits: Vec<String> = lookup_fragments("www.bravo.com/some/page.html")
        .into_iter()
        .filter(|fragment| cache.has(&completion(fragment)).confirmed)
        .collect();
    assert_eq!(hits, vec!["bravo.com/"]);
}

#[test]
fn introspection_reflects_content() {
    let (cache, _) = sample_cache();
    assert!(cache.is_primed());
    assert_eq!(cache.prefix_count(), 4);
    assert!(cache.size_of_prefix_set() >= 32 + 8 + 5 + 4);
    assert_eq!(cache.snapshot().lengths().collect::<Vec<_>>(), vec![32, 8, 5, 4]);
}
