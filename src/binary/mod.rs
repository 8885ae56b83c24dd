// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! On-disk formats for prefix sets.
//!
//! Two formats exist. The legacy pset format holds one fixed prefix length
//! and nothing else. The current vlpset format holds any number of lengths,
//! each as its own bucket, and ends with a checksum footer so that a torn
//! write is caught at load time instead of producing wrong answers.
//!
//! Loading never guesses from the file name. The first four bytes decide
//! which decoder runs; both decoders produce the same `PrefixStringMap`.
//!
//! # Security Considerations
//!
//! Files are read back from a profile directory that other software can
//! touch, so the decoders treat them as untrusted:
//! - All size fields are validated against MAX_* constants
//! - Bounds checking prevents buffer overreads
//! - CRC32 footer detects corruption/truncation (vlpset only)
//! - Bucket contents must be strictly sorted; lookups binary-search them
//!
//! # Format Overview (vlpset v1)
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ HEADER (8 bytes)                                           │
//! │   magic: [u8; 4] = "VLPS"                                  │
//! │   version: u8 = 1                                          │
//! │   bucket_count: u8                                         │
//! │   reserved: [u8; 2]                                        │
//! ├────────────────────────────────────────────────────────────┤
//! │ BUCKET (repeated bucket_count times, ascending prefix_len) │
//! │   prefix_len: u8 (4..=32)                                  │
//! │   count: u32                                               │
//! │   prefixes: [u8; count * prefix_len] (sorted, unique)      │
//! ├────────────────────────────────────────────────────────────┤
//! │ FOOTER (8 bytes): crc32 + magic "SPLV"                     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Legacy Format (pset v1)
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ HEADER (12 bytes)                                          │
//! │   magic: [u8; 4] = "PSET"                                  │
//! │   version: u8 = 1                                          │
//! │   prefix_len: u8                                           │
//! │   reserved: [u8; 2]                                        │
//! │   count: u32                                               │
//! ├────────────────────────────────────────────────────────────┤
//! │ prefixes: [u8; count * prefix_len] (sorted, unique)        │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod encoding;
mod header;

pub(crate) use encoding::encode_buckets;
pub use encoding::{
    check_limits, decode_pset, decode_vlpset, encode_pset, encode_vlpset, validate_bucket,
};
pub use header::{
    BucketHeader, FileLimits, PsetHeader, VlpsetFooter, VlpsetHeader, FOOTER_MAGIC, LEGACY_MAGIC,
    LEGACY_VERSION, MAGIC, MAX_BUCKET_COUNT, MAX_FILE_SIZE, MAX_PREFIX_COUNT, VERSION,
};

use crate::error::FormatError;
use crate::prefix_map::PrefixStringMap;

/// Which on-disk format a file is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Variable-length prefix set with checksum footer.
    Current,
    /// Single-length prefix set from older releases.
    Legacy,
}

impl FileFormat {
    /// File extension used for a table stored in this format.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Current => "vlpset",
            FileFormat::Legacy => "pset",
        }
    }

    /// `<table>.<extension>`
    pub fn file_name(self, table: &str) -> String {
        format!("{}.{}", table, self.extension())
    }
}

/// A decoded file, tagged with the format it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedFile {
    Current(PrefixStringMap),
    Legacy(PrefixStringMap),
}

impl LoadedFile {
    pub fn format(&self) -> FileFormat {
        match self {
            LoadedFile::Current(_) => FileFormat::Current,
            LoadedFile::Legacy(_) => FileFormat::Legacy,
        }
    }

    pub fn map(&self) -> &PrefixStringMap {
        match self {
            LoadedFile::Current(map) | LoadedFile::Legacy(map) => map,
        }
    }

    pub fn into_map(self) -> PrefixStringMap {
        match self {
            LoadedFile::Current(map) | LoadedFile::Legacy(map) => map,
        }
    }
}

/// Identify the format from the leading magic bytes.
///
/// Returns `None` for anything that is neither format, including inputs
/// shorter than the magic.
pub fn detect_format(bytes: &[u8]) -> Option<FileFormat> {
    match bytes.get(..4)? {
        magic if magic == MAGIC => Some(FileFormat::Current),
        magic if magic == LEGACY_MAGIC => Some(FileFormat::Legacy),
        _ => None,
    }
}

/// Detect the format and decode with the matching decoder.
pub fn decode_file(bytes: &[u8]) -> Result<LoadedFile, FormatError> {
    match detect_format(bytes) {
        Some(FileFormat::Current) => decode_vlpset(bytes).map(LoadedFile::Current),
        Some(FileFormat::Legacy) => decode_pset(bytes).map(LoadedFile::Legacy),
        None => {
            let mut found = [0u8; 4];
            let n = bytes.len().min(4);
            found[..n].copy_from_slice(&bytes[..n]);
            Err(FormatError::BadMagic {
                expected: MAGIC,
                found,
            })
        }
    }
}
