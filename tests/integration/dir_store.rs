//! Caches persisting through a real table directory.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use vlpset::{DirStore, LoadOutcome, LookupCache, PrefixStore};

use crate::common::{assert_lookup, legacy_file, sample_map, TABLE};

fn open(dir: &TempDir) -> (LookupCache, Arc<DirStore>) {
    let store = Arc::new(DirStore::open(dir.path()).unwrap());
    (LookupCache::new(TABLE, store.clone()), store)
}

fn dir_entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn open_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("profile").join("safebrowsing");
    let store = DirStore::open(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(store.root(), nested.as_path());
    assert_eq!(store.read("absent.vlpset").unwrap(), None);
    assert!(!store.remove("absent.vlpset").unwrap());
}

#[test]
fn write_leaves_exactly_one_file() {
    let dir = TempDir::new().unwrap();
    let (cache, _) = open(&dir);
    cache.build(&mut sample_map());
    cache.write_file().unwrap();

    assert_eq!(dir_entries(&dir), vec![format!("{}.vlpset", TABLE)]);
}

#[test]
fn reopened_directory_answers_like_the_original() {
    let dir = TempDir::new().unwrap();
    {
        let (cache, _) = open(&dir);
        cache.build(&mut sample_map());
        cache.write_file().unwrap();
    }

    let (cache, _) = open(&dir);
    assert_eq!(cache.load_file().unwrap(), LoadOutcome::Current);
    assert_lookup(&cache, "bravo.com/", true, 32, true);
    assert_lookup(&cache, "browsing.com/", true, 8, false);
    assert_lookup(&cache, "nomatch.com/", false, 0, false);
}

#[test]
fn rewrite_replaces_file_contents() {
    let dir = TempDir::new().unwrap();
    let (cache, _) = open(&dir);
    cache.build(&mut sample_map());
    cache.write_file().unwrap();

    cache.build(&mut crate::common::make_map(&[("alph", 4)]));
    cache.write_file().unwrap();

    let (reloaded, _) = open(&dir);
    reloaded.load_file().unwrap();
    assert_eq!(reloaded.prefix_count(), 1);
    assert_lookup(&reloaded, "alph", true, 4, false);
    assert_lookup(&reloaded, "bravo.com/", false, 0, false);
}

#[test]
fn legacy_file_on_disk_is_migrated() {
    let dir = TempDir::new().unwrap();
    let legacy = dir.path().join(format!("{}.pset", TABLE));
    fs::write(&legacy, legacy_file(&["alph/", "beta/"])).unwrap();

    let (cache, _) = open(&dir);
    assert_eq!(cache.load_file().unwrap(), LoadOutcome::Migrated);
    assert_lookup(&cache, "alph/", true, 4, false);

    cache.write_file().unwrap();
    assert!(!legacy.exists());
    assert_eq!(dir_entries(&dir), vec![format!("{}.vlpset", TABLE)]);

    let (reloaded, _) = open(&dir);
    assert_eq!(reloaded.load_file().unwrap(), LoadOutcome::Current);
    assert_eq!(reloaded.get_prefixes(), cache.get_prefixes());
}

#[test]
fn corrupt_file_on_disk_is_reported_and_kept() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(format!("{}.vlpset", TABLE));
    fs::write(&path, b"VLPS\x01\x01\x00\x00garbage").unwrap();

    let (cache, store) = open(&dir);
    let err = cache.load_file().unwrap_err();
    assert!(err.is_corrupt());
    assert!(err.to_string().contains(TABLE));
    assert!(cache.is_empty());
    assert!(store.exists(&cache.file_name()).unwrap());
}

#[test]
fn update_store_moves_persistence_to_new_directory() {
    let old_dir = TempDir::new().unwrap();
    let new_dir = TempDir::new().unwrap();
    let (cache, _) = open(&old_dir);
    cache.build(&mut sample_map());

    cache.update_store(Arc::new(DirStore::open(new_dir.path()).unwrap()));
    cache.write_file().unwrap();

    assert!(dir_entries(&old_dir).is_empty());
    assert_eq!(dir_entries(&new_dir), vec![format!("{}.vlpset", TABLE)]);
}

#[test]
fn location_names_the_file_path() {
    let dir = TempDir::new().unwrap();
    let (_, store) = open(&dir);
    let location = store.location("t.vlpset");
    assert!(location.ends_with("t.vlpset"));
    assert!(location.starts_with(&dir.path().display().to_string()));
}
