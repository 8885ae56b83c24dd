// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! `VariableLengthPrefixSet`: the in-memory, lookup-ready prefix set.
//!
//! One bucket per prefix length, each a packed sorted buffer plus a 257-slot
//! first-byte index. A lookup walks the buckets from the longest length to
//! the shortest; the first hit is the longest match and ends the walk.
//!
//! ```text
//! bucket (len = 4)
//!   index[0x00]..index[0x01]   entries starting with 0x00
//!   index[0x01]..index[0x02]   entries starting with 0x01
//!   ...
//!   index[0xff]..index[0x100]  entries starting with 0xff
//! ```
//!
//! The index narrows every binary search to roughly 1/256th of the bucket,
//! which saves about 8 comparisons per length and, more importantly, keeps
//! the searches within a few cache lines.
//!
//! The set is immutable once built. `LookupCache` replaces it wholesale and
//! never mutates one that readers can see.

use std::cmp::Ordering;
use std::io::{self, Read, Write};
use std::mem;

use crate::binary::{self, FileLimits, MAX_FILE_SIZE};
use crate::contracts::{check_bucket_index, check_bucket_well_formed, check_match_result};
use crate::error::FormatError;
use crate::hash::Completion;
use crate::prefix_map::{sort_packed, PrefixStringMap};

/// Number of slots in a first-byte index: one per byte value plus the end.
const INDEX_SLOTS: usize = 257;

/// One length's worth of prefixes.
#[derive(Debug, Clone)]
struct PrefixBucket {
    len: usize,
    bytes: Vec<u8>,
    /// `index[b]..index[b + 1]` is the entry range whose first byte is `b`.
    index: Box<[u32; INDEX_SLOTS]>,
}

impl PrefixBucket {
    fn new(len: usize, bytes: Vec<u8>) -> Self {
        let mut index = Box::new([0u32; INDEX_SLOTS]);
        for entry in bytes.chunks_exact(len) {
            index[entry[0] as usize + 1] += 1;
        }
        for slot in 1..INDEX_SLOTS {
            index[slot] += index[slot - 1];
        }
        check_bucket_index(&index[..], bytes.len() / len);

        Self { len, bytes, index }
    }

    #[inline]
    fn count(&self) -> usize {
        self.bytes.len() / self.len
    }

    #[inline]
    fn entry(&self, i: usize) -> &[u8] {
        &self.bytes[i * self.len..(i + 1) * self.len]
    }

    /// Binary search within the first-byte range of `target`.
    fn find(&self, target: &[u8]) -> Option<usize> {
        let first = target[0] as usize;
        let mut lo = self.index[first] as usize;
        let mut hi = self.index[first + 1] as usize;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.entry(mid).cmp(target) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    fn heap_size(&self) -> usize {
        self.bytes.capacity() + mem::size_of::<[u32; INDEX_SLOTS]>()
    }
}

/// Prefixes of several lengths, searchable by completion.
#[derive(Debug, Clone, Default)]
pub struct VariableLengthPrefixSet {
    /// Longest length first.
    buckets: Vec<PrefixBucket>,
}

impl VariableLengthPrefixSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a map, consuming it.
    pub fn from_map(map: PrefixStringMap) -> Self {
        let mut set = Self::new();
        set.set_prefixes(map);
        set
    }

    /// Replace the entire content of the set.
    ///
    /// Buckets are expected to be sorted and duplicate-free. A bucket that is
    /// not gets re-sorted (and a warning logged) rather than left to answer
    /// lookups wrongly.
    pub fn set_prefixes(&mut self, map: PrefixStringMap) {
        let mut buckets = Vec::with_capacity(map.bucket_count());

        for (len, bytes) in map.into_buckets() {
            let bytes = match binary::validate_bucket(len, &bytes) {
                Ok(()) => bytes,
                Err(err) => {
                    log::warn!("repairing {}-byte prefix bucket: {}", len, err);
                    sort_packed(len, &bytes)
                }
            };
            check_bucket_well_formed(len, &bytes);
            if !bytes.is_empty() {
                buckets.push(PrefixBucket::new(len, bytes));
            }
        }

        buckets.reverse();
        self.buckets = buckets;
    }

    /// Copy the content back out as a map.
    pub fn get_prefixes_sorted(&self) -> PrefixStringMap {
        self.buckets
            .iter()
            .map(|bucket| (bucket.len, bucket.bytes.clone()))
            .collect()
    }

    /// Packed buffer of one length, if present.
    pub fn prefixes(&self, len: usize) -> Option<&[u8]> {
        self.buckets
            .iter()
            .find(|bucket| bucket.len == len)
            .map(|bucket| bucket.bytes.as_slice())
    }

    /// Longest stored prefix of `completion`, as its length in bytes.
    pub fn matches(&self, completion: &Completion) -> Option<usize> {
        for bucket in &self.buckets {
            let target = completion.prefix_bytes(bucket.len);
            if let Some(i) = bucket.find(target) {
                check_match_result(completion, bucket.len, bucket.entry(i));
                return Some(bucket.len);
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of prefixes over all lengths.
    pub fn prefix_count(&self) -> usize {
        self.buckets.iter().map(PrefixBucket::count).sum()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Lengths present, longest first.
    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().map(|bucket| bucket.len)
    }

    /// Approximate heap usage in bytes.
    pub fn size_of(&self) -> usize {
        self.buckets.capacity() * mem::size_of::<PrefixBucket>()
            + self.buckets.iter().map(PrefixBucket::heap_size).sum::<usize>()
    }

    /// Serialize as a vlpset file.
    ///
    /// Fails with `InvalidData`, before anything reaches `w`, if the file
    /// would exceed the limits `load_prefixes` enforces.
    pub fn write_prefixes<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.write_prefixes_with(w, &FileLimits::DEFAULT)
    }

    pub(crate) fn write_prefixes_with<W: Write>(
        &self,
        w: &mut W,
        limits: &FileLimits,
    ) -> io::Result<()> {
        binary::check_limits(self.ascending(), limits)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let mut buf = Vec::new();
        binary::encode_buckets(self.ascending(), &mut buf);
        w.write_all(&buf)
    }

    fn ascending(&self) -> impl Iterator<Item = (usize, &[u8])> + '_ {
        self.buckets
            .iter()
            .rev()
            .map(|bucket| (bucket.len, bucket.bytes.as_slice()))
    }

    /// Read a vlpset file written by [`write_prefixes`](Self::write_prefixes).
    pub fn load_prefixes<R: Read>(reader: R) -> Result<PrefixStringMap, FormatError> {
        let mut bytes = Vec::new();
        reader
            .take(MAX_FILE_SIZE as u64 + 1)
            .read_to_end(&mut bytes)?;
        binary::decode_vlpset(&bytes)
    }
}
