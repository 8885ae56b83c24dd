// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! `LookupCache`: one safe-browsing table, ready for lookups.
//!
//! # Lifecycle
//!
//! ```text
//!          build / load_file               clear_all
//!   Empty ───────────────────▶ Loaded ─────────────────▶ Empty
//!                              │    ▲
//!                              └────┘
//!                           has, write_file
//! ```
//!
//! # Concurrency
//!
//! The live prefix set sits behind `RwLock<Arc<_>>`. A lookup takes the read
//! lock only long enough to clone the `Arc`, then searches its own snapshot
//! without holding anything. An update builds the new set with no lock held
//! and takes the write lock only to swap the pointer. A lookup therefore sees
//! either the old set or the new one, never a mix, and an update never waits
//! for a search to finish.
//!
//! # Persistence
//!
//! A table is stored as `<table>.vlpset`. Older releases wrote
//! `<table>.pset`; `load_file` reads that when no vlpset exists, and the next
//! successful `write_file` deletes it, so only one file per table survives.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::Serialize;

use crate::binary::{self, FileFormat, FileLimits, LoadedFile};
use crate::error::CacheError;
use crate::hash::{Completion, COMPLETE_SIZE};
use crate::prefix_map::PrefixStringMap;
use crate::prefix_set::VariableLengthPrefixSet;
use crate::storage::PrefixStore;

/// Answer to a single `has` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LookupResult {
    /// Some stored prefix matches the completion.
    pub has: bool,
    /// Length in bytes of the longest matching prefix, 0 without a match.
    pub match_length: usize,
    /// The match covers the whole 32-byte completion.
    pub confirmed: bool,
    /// The completion was also returned by an earlier full-hash request.
    pub from_cache: bool,
}

impl LookupResult {
    fn from_match(match_length: Option<usize>, from_cache: bool) -> Self {
        match match_length {
            Some(len) => Self {
                has: true,
                match_length: len,
                confirmed: len == COMPLETE_SIZE,
                from_cache,
            },
            None => Self {
                from_cache,
                ..Self::default()
            },
        }
    }
}

/// What `load_file` found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOutcome {
    /// Loaded a current-format file.
    Current,
    /// Loaded a legacy pset file; the next `write_file` upgrades it.
    Migrated,
    /// No file for this table. The cache is empty.
    Missing,
}

/// Prefix cache for one table.
pub struct LookupCache {
    table: String,
    store: RwLock<Arc<dyn PrefixStore>>,
    prefixes: RwLock<Arc<VariableLengthPrefixSet>>,
    /// Full hashes from completion requests, sorted. Replaced, never mutated.
    gethash_cache: RwLock<Arc<Vec<Completion>>>,
    primed: AtomicBool,
}

impl LookupCache {
    /// Empty cache for `table`, persisting through `store`.
    pub fn new(table: impl Into<String>, store: Arc<dyn PrefixStore>) -> Self {
        Self {
            table: table.into(),
            store: RwLock::new(store),
            prefixes: RwLock::new(Arc::new(VariableLengthPrefixSet::new())),
            gethash_cache: RwLock::new(Arc::new(Vec::new())),
            primed: AtomicBool::new(false),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Name of the file `write_file` produces.
    pub fn file_name(&self) -> String {
        FileFormat::Current.file_name(&self.table)
    }

    /// The prefix set lookups currently see.
    pub fn snapshot(&self) -> Arc<VariableLengthPrefixSet> {
        Arc::clone(&self.prefixes.read())
    }

    fn store(&self) -> Arc<dyn PrefixStore> {
        Arc::clone(&self.store.read())
    }

    fn publish(&self, set: VariableLengthPrefixSet, primed: bool) {
        let set = Arc::new(set);
        let old = mem::replace(&mut *self.prefixes.write(), set);
        self.primed.store(primed, Ordering::Release);
        // Freed after the lock is released.
        drop(old);
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    /// Look up one completion.
    ///
    /// `confirmed` is set only for a full 32-byte match; a shorter match means
    /// the caller has to ask for the full hash before acting on it.
    pub fn has(&self, completion: &Completion) -> LookupResult {
        let set = self.snapshot();
        let from_cache = self
            .gethash_cache
            .read()
            .binary_search(completion)
            .is_ok();
        LookupResult::from_match(set.matches(completion), from_cache)
    }

    /// True once a build or a load has produced content.
    pub fn is_primed(&self) -> bool {
        self.primed.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn prefix_count(&self) -> usize {
        self.snapshot().prefix_count()
    }

    /// Approximate heap bytes used by the prefix set.
    pub fn size_of_prefix_set(&self) -> usize {
        self.snapshot().size_of()
    }

    /// Copy of the current content.
    pub fn get_prefixes(&self) -> PrefixStringMap {
        self.snapshot().get_prefixes_sorted()
    }

    // ========================================================================
    // UPDATE
    // ========================================================================

    /// Replace the whole set with the content of `map`.
    ///
    /// The map is drained: on return it is empty and its buffers belong to
    /// the cache.
    pub fn build(&self, map: &mut PrefixStringMap) {
        let set = VariableLengthPrefixSet::from_map(map.take());
        log::debug!(
            "{}: built {} prefixes in {} buckets",
            self.table,
            set.prefix_count(),
            set.bucket_count()
        );
        self.publish(set, true);
    }

    /// Drop all content. Lookups miss until the next build or load.
    pub fn clear_all(&self) {
        self.clear_cache();
        self.publish(VariableLengthPrefixSet::new(), false);
        log::debug!("{}: cleared", self.table);
    }

    /// Remember full hashes returned by a completion request.
    ///
    /// Drains `completions`. They are kept until `clear_cache` or `clear_all`.
    ///
    /// The merged list is sorted while lookups keep reading the old one; the
    /// write lock is held only to swap it in.
    pub fn add_completions_to_cache(&self, completions: &mut Vec<Completion>) {
        // Upgradable: excludes other updates, not readers.
        let current = self.gethash_cache.upgradable_read();
        let mut merged = Vec::with_capacity(current.len() + completions.len());
        merged.extend_from_slice(&current);
        merged.append(completions);
        merged.sort_unstable();
        merged.dedup();

        let old = mem::replace(
            &mut *RwLockUpgradableReadGuard::upgrade(current),
            Arc::new(merged),
        );
        drop(old);
    }

    pub fn clear_cache(&self) {
        let old = mem::replace(&mut *self.gethash_cache.write(), Arc::new(Vec::new()));
        drop(old);
    }

    /// Number of full hashes remembered from completion requests.
    pub fn cached_completion_count(&self) -> usize {
        self.gethash_cache.read().len()
    }

    /// Point the cache at a different store, e.g. after the table directory moved.
    pub fn update_store(&self, store: Arc<dyn PrefixStore>) {
        *self.store.write() = store;
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Persist the current content as `<table>.vlpset`.
    ///
    /// A legacy `<table>.pset` is deleted, but only after the new file has
    /// been written. On failure the in-memory set is untouched.
    ///
    /// A set too large to load back is refused before the store is touched,
    /// so the existing files stay as they were.
    pub fn write_file(&self) -> Result<(), CacheError> {
        self.write_file_with(&FileLimits::DEFAULT)
    }

    fn write_file_with(&self, limits: &FileLimits) -> Result<(), CacheError> {
        let store = self.store();
        let set = self.snapshot();
        let name = self.file_name();

        let mut bytes = Vec::new();
        set.write_prefixes_with(&mut bytes, limits)
            .and_then(|()| store.write(&name, &bytes))
            .map_err(|source| {
                log::warn!("{}: failed to write {}: {}", self.table, store.location(&name), source);
                CacheError::Io {
                    table: self.table.clone(),
                    file: name.clone(),
                    source,
                }
            })?;
        log::debug!(
            "{}: wrote {} bytes to {}",
            self.table,
            bytes.len(),
            store.location(&name)
        );

        let legacy = FileFormat::Legacy.file_name(&self.table);
        match store.remove(&legacy) {
            Ok(true) => {
                log::info!("{}: removed legacy file {}", self.table, store.location(&legacy));
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(source) => Err(CacheError::Io {
                table: self.table.clone(),
                file: legacy,
                source,
            }),
        }
    }

    /// Load the table from its store.
    ///
    /// Prefers `<table>.vlpset` and falls back to a legacy `<table>.pset`.
    /// With neither present the cache is left empty and `Missing` returned.
    /// A file that fails to decode also leaves the cache empty; the file
    /// itself is not touched.
    pub fn load_file(&self) -> Result<LoadOutcome, CacheError> {
        let store = self.store();

        let Some((name, bytes)) = self.read_table_file(store.as_ref())? else {
            log::debug!("{}: no file found", self.table);
            self.publish(VariableLengthPrefixSet::new(), false);
            return Ok(LoadOutcome::Missing);
        };

        let loaded = match binary::decode_file(&bytes) {
            Ok(loaded) => loaded,
            Err(source) => {
                log::warn!("{}: discarding {}: {}", self.table, store.location(&name), source);
                self.publish(VariableLengthPrefixSet::new(), false);
                return Err(CacheError::Format {
                    table: self.table.clone(),
                    file: name,
                    source,
                });
            }
        };

        let outcome = match loaded {
            LoadedFile::Current(_) => LoadOutcome::Current,
            LoadedFile::Legacy(_) => {
                log::info!("{}: loaded legacy file {}", self.table, store.location(&name));
                LoadOutcome::Migrated
            }
        };

        let set = VariableLengthPrefixSet::from_map(loaded.into_map());
        log::debug!(
            "{}: loaded {} prefixes from {}",
            self.table,
            set.prefix_count(),
            store.location(&name)
        );
        self.publish(set, true);
        Ok(outcome)
    }

    fn read_table_file(
        &self,
        store: &dyn PrefixStore,
    ) -> Result<Option<(String, Vec<u8>)>, CacheError> {
        for format in [FileFormat::Current, FileFormat::Legacy] {
            let name = format.file_name(&self.table);
            match store.read(&name) {
                Ok(Some(bytes)) => return Ok(Some((name, bytes))),
                Ok(None) => {}
                Err(source) => {
                    return Err(CacheError::Io {
                        table: self.table.clone(),
                        file: name,
                        source,
                    })
                }
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupCache")
            .field("table", &self.table)
            .field("store", &self.store.read())
            .field("prefixes", &self.prefix_count())
            .field("primed", &self.is_primed())
            .finish()
    }
}
