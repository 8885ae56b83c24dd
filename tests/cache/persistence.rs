//! write_file / load_file through a store.

use std::sync::Arc;

use crate::common::{assert_lookup, completion, memory_cache, sample_cache, sample_map, TABLE};
use vlpset::{LoadOutcome, LookupCache, PrefixStore};

#[test]
fn write_then_load_restores_lookups() {
    let (cache, store) = sample_cache();
    cache.write_file().unwrap();
    assert_eq!(store.names(), vec![format!("{}.vlpset", TABLE)]);

    let reloaded = LookupCache::new(TABLE, store.clone());
    assert_eq!(reloaded.load_file().unwrap(), LoadOutcome::Current);
    assert!(reloaded.is_primed());
    assert_eq!(reloaded.get_prefixes(), sample_map());

    assert_lookup(&reloaded, "bravo.com/", true, 32, true);
    assert_lookup(&reloaded, "browsing.com/", true, 8, false);
    assert_lookup(&reloaded, "gound.com/", true, 5, false);
    assert_lookup(&reloaded, "small.com/", true, 4, false);
    assert_lookup(&reloaded, "nomatch.com/", false, 0, false);
}

#[test]
fn load_replaces_whatever_was_in_memory() {
    let (writer, store) = sample_cache();
    writer.write_file().unwrap();

    let reader = LookupCache::new(TABLE, store.clone());
    reader.build(&mut crate::common::make_map(&[("alph", 4)]));
    reader.load_file().unwrap();

    assert_lookup(&reader, "alph", false, 0, false);
    assert_lookup(&reader, "bravo.com/", true, 32, true);
}

#[test]
fn empty_set_round_trips() {
    let (cache, store) = memory_cache();
    cache.write_file().unwrap();
    assert!(store.exists(&cache.file_name()).unwrap());

    let reloaded = LookupCache::new(TABLE, store.clone());
    assert_eq!(reloaded.load_file().unwrap(), LoadOutcome::Current);
    assert!(reloaded.is_empty());
}

#[test]
fn missing_file_leaves_cache_empty() {
    let (cache, _) = sample_cache();
    assert_eq!(cache.load_file().unwrap(), LoadOutcome::Missing);
    assert!(cache.is_empty());
    assert!(!cache.is_primed());
}

#[test]
fn failed_write_keeps_memory_and_store() {
    let (cache, store) = sample_cache();
    cache.write_file().unwrap();
    let before = store.read(&cache.file_name()).unwrap();

    cache.build(&mut crate::common::make_map(&[("alph", 4)]));
    store.set_read_only(true);
    let err = cache.write_file().unwrap_err();

    assert!(!err.is_corrupt());
    assert_eq!(err.table(), TABLE);
    assert_lookup(&cache, "alph", true, 4, false);
    assert_eq!(store.read(&cache.file_name()).unwrap(), before);
}

#[test]
fn corrupt_file_is_reported_and_kept() {
    let (cache, store) = sample_cache();
    cache.write_file().unwrap();

    let name = cache.file_name();
    let mut bytes = store.read(&name).unwrap().unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xff;
    store.insert(&name, bytes);

    let err = cache.load_file().unwrap_err();
    assert!(err.is_corrupt());
    assert!(err.to_string().contains(TABLE));
    assert!(cache.is_empty());
    assert!(store.exists(&name).unwrap());
}

#[test]
fn gethash_cache_is_not_persisted() {
    let (cache, store) = sample_cache();
    cache.add_completions_to_cache(&mut vec![completion("browsing.com/")]);
    cache.write_file().unwrap();
    assert_eq!(cache.cached_completion_count(), 1);

    let other = LookupCache::new(TABLE, store as Arc<dyn PrefixStore>);
    other.load_file().unwrap();
    assert_eq!(other.cached_completion_count(), 0);
    assert!(!other.has(&completion("browsing.com/")).from_cache);
}
