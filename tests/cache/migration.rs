//! Upgrading a legacy `.pset` file to `.vlpset`.

use crate::common::{assert_lookup, legacy_file, make_map, memory_cache, TABLE};
use vlpset::{LoadOutcome, LookupCache, PrefixStore};

fn legacy_name() -> String {
    format!("{}.pset", TABLE)
}

#[test]
fn legacy_file_loads_and_answers_lookups() {
    let (cache, store) = memory_cache();
    store.insert(&legacy_name(), legacy_file(&["alph/", "beta/"]));

    assert_eq!(cache.load_file().unwrap(), LoadOutcome::Migrated);
    assert!(cache.is_primed());
    assert_eq!(cache.prefix_count(), 2);
    assert_lookup(&cache, "alph/", true, 4, false);
    assert_lookup(&cache, "beta/", true, 4, false);
    assert_lookup(&cache, "gamma/", false, 0, false);
}

#[test]
fn write_after_migration_replaces_the_legacy_file() {
    let (cache, store) = memory_cache();
    store.insert(&legacy_name(), legacy_file(&["alph/", "beta/"]));
    cache.load_file().unwrap();

    cache.write_file().unwrap();
    assert_eq!(store.names(), vec![cache.file_name()]);
    assert!(!store.exists(&legacy_name()).unwrap());

    let reloaded = LookupCache::new(TABLE, store.clone());
    assert_eq!(reloaded.load_file().unwrap(), LoadOutcome::Current);
    assert_eq!(reloaded.get_prefixes(), cache.get_prefixes());
}

#[test]
fn migrated_cache_matches_a_freshly_built_one() {
    let fragments = ["alph/", "beta/", "small.com/", "gound.com/"];
    let queries = ["alph/", "beta/", "small.com/", "gound.com/", "nomatch.com/"];

    let (migrated, store) = memory_cache();
    store.insert(&legacy_name(), legacy_file(&fragments));
    migrated.load_file().unwrap();

    let (built, _) = memory_cache();
    let entries: Vec<(&str, usize)> = fragments.iter().map(|f| (*f, 4)).collect();
    built.build(&mut make_map(&entries));

    for query in queries {
        let completion = crate::common::completion(query);
        assert_eq!(migrated.has(&completion), built.has(&completion), "{}", query);
    }
}

#[test]
fn current_file_wins_over_legacy() {
    let (cache, store) = memory_cache();
    cache.build(&mut make_map(&[("bravo.com/", 32)]));
    cache.write_file().unwrap();
    store.insert(&legacy_name(), legacy_file(&["alph/"]));

    let reloaded = LookupCache::new(TABLE, store.clone());
    assert_eq!(reloaded.load_file().unwrap(), LoadOutcome::Current);
    assert_lookup(&reloaded, "bravo.com/", true, 32, true);
    assert_lookup(&reloaded, "alph/", false, 0, false);
}

#[test]
fn failed_upgrade_keeps_the_legacy_file() {
    let (cache, store) = memory_cache();
    store.insert(&legacy_name(), legacy_file(&["alph/"]));
    cache.load_file().unwrap();

    store.set_read_only(true);
    assert!(cache.write_file().is_err());
    assert!(store.exists(&legacy_name()).unwrap());
    assert!(!store.exists(&cache.file_name()).unwrap());
    assert_lookup(&cache, "alph/", true, 4, false);
}

#[test]
fn corrupt_legacy_file_is_a_format_error() {
    let (cache, store) = memory_cache();
    let mut bytes = legacy_file(&["alph/", "beta/"]);
    bytes.truncate(bytes.len() - 1);
    store.insert(&legacy_name(), bytes);

    let err = cache.load_file().unwrap_err();
    assert!(err.is_corrupt());
    assert!(cache.is_empty());
}
