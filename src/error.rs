// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error types for prefix-set files and lookup caches.
//!
//! Two layers. `FormatError` is what the binary decoders return: the bytes on
//! disk are not a file we are willing to trust. `CacheError` wraps either a
//! format error or a storage failure together with the table name, so the
//! owner of many caches can decide per table what to do (usually: throw the
//! local copy away and download the list again).
//!
//! Nothing here is ever raised as a panic. Precondition violations inside the
//! crate are caught by `contracts` in debug builds instead.

use std::io;

use thiserror::Error;

use crate::hash::{MAX_PREFIX_SIZE, MIN_PREFIX_SIZE};

/// A prefix-set file (or byte stream) could not be decoded.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The leading magic bytes do not identify a known format.
    #[error("invalid magic: expected {expected:?}, got {found:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },

    /// The file was written by a format version we cannot read.
    #[error("unsupported format version {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    /// A section claims more bytes than the input holds.
    #[error("truncated {section}: need {needed} bytes, have {available}")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    /// Footer CRC32 does not match the content it protects.
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// Prefix length outside the supported range.
    #[error(
        "invalid prefix length {0} (supported {min}..={max})",
        min = MIN_PREFIX_SIZE,
        max = MAX_PREFIX_SIZE
    )]
    InvalidPrefixLength(usize),

    /// Bucket byte size is not a whole number of prefixes.
    #[error("bucket of {len}-byte prefixes has {size} bytes, not a multiple of {len}")]
    MisalignedBucket { len: usize, size: usize },

    /// The same prefix length appears twice (or out of order) in one file.
    #[error("duplicate or out-of-order bucket for {0}-byte prefixes")]
    DuplicateBucket(u8),

    /// A bucket header announces zero prefixes.
    #[error("empty bucket for {0}-byte prefixes")]
    EmptyBucket(u8),

    /// Entries of a bucket are not strictly ascending.
    #[error("bucket of {len}-byte prefixes is not sorted and unique at entry {position}")]
    UnsortedBucket { len: usize, position: usize },

    /// Bytes left over between the last bucket and the footer.
    #[error("{0} trailing bytes after last bucket")]
    TrailingBytes(usize),

    /// Input exceeds a resource limit.
    #[error("{what} too large: {size} (max {max})")]
    TooLarge {
        what: &'static str,
        size: usize,
        max: usize,
    },

    /// A textual prefix or completion is not valid hex.
    #[error("invalid hex string {0:?}")]
    InvalidHex(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A lookup cache operation failed for one table.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The on-disk file exists but is corrupt, truncated or from an unknown version.
    #[error("table {table}: unusable prefix file {file}: {source}")]
    Format {
        table: String,
        file: String,
        #[source]
        source: FormatError,
    },

    /// The storage collaborator failed (disk full, permission denied, ...).
    #[error("table {table}: I/O error on {file}: {source}")]
    Io {
        table: String,
        file: String,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    /// Name of the table the error belongs to.
    pub fn table(&self) -> &str {
        match self {
            CacheError::Format { table, .. } | CacheError::Io { table, .. } => table,
        }
    }

    /// True when the local data is unusable and should be re-downloaded.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CacheError::Format { .. })
    }
}
