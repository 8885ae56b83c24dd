// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! `PrefixStringMap`: prefix length -> one packed, sorted byte buffer.
//!
//! A list with a million 4-byte prefixes is 4 MB of bytes. Storing it as a
//! `Vec<Vec<u8>>` would add 24 bytes of header per entry and scatter them over
//! the heap. Instead every length gets a single flat buffer where entry `i`
//! lives at `bytes[i * len..(i + 1) * len]`. Sorted, so lookups are a binary
//! search; flat, so serialization is a `write_all`.
//!
//! # Invariants
//!
//! - keys are valid prefix lengths (`4..=32`)
//! - `bytes.len() % len == 0`
//! - entries are sorted ascending and unique (guaranteed by `from_prefixes`,
//!   assumed by `insert_bucket`, repaired by the prefix set if violated)

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::FormatError;
use crate::hash::is_valid_prefix_len;

/// Buckets at least this many entries long are sorted on the rayon pool.
#[cfg(feature = "parallel")]
const PARALLEL_SORT_THRESHOLD: usize = 64 * 1024;

/// Mapping from prefix length to a packed buffer of prefixes of that length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixStringMap {
    buckets: BTreeMap<u8, Vec<u8>>,
}

impl PrefixStringMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from unsorted prefixes of any supported length.
    ///
    /// Groups by length, sorts each group and drops duplicates, so the result
    /// satisfies every invariant regardless of input order.
    pub fn from_prefixes<I, P>(prefixes: I) -> Result<Self, FormatError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut grouped: BTreeMap<u8, Vec<Vec<u8>>> = BTreeMap::new();
        for prefix in prefixes {
            let bytes = prefix.as_ref();
            if !is_valid_prefix_len(bytes.len()) {
                return Err(FormatError::InvalidPrefixLength(bytes.len()));
            }
            grouped
                .entry(bytes.len() as u8)
                .or_default()
                .push(bytes.to_vec());
        }

        let mut map = Self::new();
        for (len, mut entries) in grouped {
            sort_entries(&mut entries);
            entries.dedup();
            map.buckets.insert(len, entries.concat());
        }
        Ok(map)
    }

    /// Insert one packed bucket, replacing any bucket of the same length.
    ///
    /// The buffer must already be sorted and deduplicated. Only length and
    /// alignment are validated here. An empty buffer removes the bucket.
    pub fn insert_bucket(
        &mut self,
        len: usize,
        bytes: Vec<u8>,
    ) -> Result<Option<Vec<u8>>, FormatError> {
        if !is_valid_prefix_len(len) {
            return Err(FormatError::InvalidPrefixLength(len));
        }
        if bytes.len() % len != 0 {
            return Err(FormatError::MisalignedBucket {
                len,
                size: bytes.len(),
            });
        }
        if bytes.is_empty() {
            return Ok(self.buckets.remove(&(len as u8)));
        }
        Ok(self.buckets.insert(len as u8, bytes))
    }

    /// Packed buffer for one length.
    pub fn get(&self, len: usize) -> Option<&[u8]> {
        u8::try_from(len)
            .ok()
            .and_then(|key| self.buckets.get(&key))
            .map(Vec::as_slice)
    }

    /// Buckets in ascending length order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &[u8])> + '_ {
        self.buckets
            .iter()
            .map(|(&len, bytes)| (len as usize, bytes.as_slice()))
    }

    /// Prefix lengths present, ascending.
    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.keys().map(|&len| len as usize)
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of prefixes over all lengths.
    pub fn prefix_count(&self) -> usize {
        self.buckets
            .iter()
            .map(|(&len, bytes)| bytes.len() / len as usize)
            .sum()
    }

    /// Total payload bytes over all lengths.
    pub fn byte_size(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Move the contents out, leaving this map empty.
    ///
    /// Used by `LookupCache::build` so a multi-megabyte update never exists
    /// twice in memory.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub(crate) fn into_buckets(self) -> impl Iterator<Item = (usize, Vec<u8>)> {
        self.buckets
            .into_iter()
            .map(|(len, bytes)| (len as usize, bytes))
    }
}

impl FromIterator<(usize, Vec<u8>)> for PrefixStringMap {
    /// Collect already-packed buckets. Invalid buckets are skipped.
    fn from_iter<T: IntoIterator<Item = (usize, Vec<u8>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (len, bytes) in iter {
            if is_valid_prefix_len(len) && bytes.len() % len == 0 && !bytes.is_empty() {
                map.buckets.insert(len as u8, bytes);
            }
        }
        map
    }
}

/// Sort, dedup and repack a buffer of fixed-size entries.
pub(crate) fn sort_packed(len: usize, bytes: &[u8]) -> Vec<u8> {
    let mut entries: Vec<&[u8]> = bytes.chunks_exact(len).collect();
    #[cfg(feature = "parallel")]
    {
        if entries.len() >= PARALLEL_SORT_THRESHOLD {
            entries.par_sort_unstable();
        } else {
            entries.sort_unstable();
        }
    }
    #[cfg(not(feature = "parallel"))]
    entries.sort_unstable();
    entries.dedup();
    entries.concat()
}

fn sort_entries(entries: &mut [Vec<u8>]) {
    #[cfg(feature = "parallel")]
    {
        if entries.len() >= PARALLEL_SORT_THRESHOLD {
            entries.par_sort_unstable();
            return;
        }
    }
    entries.sort_unstable();
}
