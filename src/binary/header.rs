// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fixed-size headers and footers for the vlpset and pset formats.
//!
//! The vlpset header is 8 bytes: magic, version, bucket count, two reserved
//! bytes. Every bucket then carries its own 5-byte header (length + count),
//! so the file can be walked front to back without an offset table.
//!
//! The footer is 8 bytes: a CRC32 checksum over everything before it, plus a
//! magic number ("SPLV", the header magic reversed). If the footer is wrong,
//! something got corrupted or truncated. Don't trust the data.
//!
//! The legacy pset header is 12 bytes and describes a single bucket. It has
//! no footer; those files predate the checksum.

use std::io::{self, Write};

use crc32fast::Hasher as Crc32Hasher;

use crate::error::FormatError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Magic bytes: "VLPS" in ASCII (header)
pub const MAGIC: [u8; 4] = *b"VLPS";

/// Footer magic: "SPLV" (reversed, marks valid file end)
pub const FOOTER_MAGIC: [u8; 4] = *b"SPLV";

/// Current vlpset format version
pub const VERSION: u8 = 1;

/// Magic bytes of the legacy single-length format: "PSET"
pub const LEGACY_MAGIC: [u8; 4] = *b"PSET";

/// Only legacy version ever written
pub const LEGACY_VERSION: u8 = 1;

// ============================================================================
// SECURITY LIMITS (prevent resource exhaustion from malicious input)
// ============================================================================

/// Maximum file size: 256 MB
pub const MAX_FILE_SIZE: usize = 256 * 1024 * 1024;

/// One bucket per supported length (4..=32)
pub const MAX_BUCKET_COUNT: usize = 29;

/// Maximum prefixes in a single bucket
pub const MAX_PREFIX_COUNT: u32 = 64 * 1024 * 1024;

/// Size limits a file must satisfy to be loadable.
///
/// The decoder enforces `DEFAULT`; writers check the same numbers up front
/// so they never persist a file that would be refused on the next load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLimits {
    pub max_file_size: usize,
    pub max_prefix_count: u32,
}

impl FileLimits {
    pub const DEFAULT: Self = Self {
        max_file_size: MAX_FILE_SIZE,
        max_prefix_count: MAX_PREFIX_COUNT,
    };
}

// ============================================================================
// BYTE READER
// ============================================================================

/// Bounds-checked cursor over a byte slice.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize, section: &'static str) -> Result<&'a [u8], FormatError> {
        if n > self.remaining() {
            return Err(FormatError::Truncated {
                section,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self, section: &'static str) -> Result<u8, FormatError> {
        Ok(self.take(1, section)?[0])
    }

    pub(crate) fn u32(&mut self, section: &'static str) -> Result<u32, FormatError> {
        let b = self.take(4, section)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn magic(&mut self, section: &'static str) -> Result<[u8; 4], FormatError> {
        let b = self.take(4, section)?;
        Ok([b[0], b[1], b[2], b[3]])
    }
}

// ============================================================================
// VLPSET HEADER
// ============================================================================

/// vlpset file header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlpsetHeader {
    pub version: u8,
    pub bucket_count: u8,
}

impl VlpsetHeader {
    // 4 (magic) + 1 (version) + 1 (bucket_count) + 2 (reserved) = 8
    pub const SIZE: usize = 8;

    pub fn new(bucket_count: u8) -> Self {
        Self {
            version: VERSION,
            bucket_count,
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_all(&[self.version, self.bucket_count])?;
        w.write_all(&[0u8; 2])?; // reserved
        Ok(())
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let magic = r.magic("header")?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic {
                expected: MAGIC,
                found: magic,
            });
        }

        let version = r.u8("header")?;
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                expected: VERSION,
            });
        }

        let bucket_count = r.u8("header")?;
        if bucket_count as usize > MAX_BUCKET_COUNT {
            return Err(FormatError::TooLarge {
                what: "bucket count",
                size: bucket_count as usize,
                max: MAX_BUCKET_COUNT,
            });
        }
        r.take(2, "header")?; // reserved

        Ok(Self {
            version,
            bucket_count,
        })
    }
}

// ============================================================================
// BUCKET HEADER
// ============================================================================

/// Per-bucket header (5 bytes): prefix length and entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketHeader {
    pub prefix_len: u8,
    pub count: u32,
}

impl BucketHeader {
    pub const SIZE: usize = 5;

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[self.prefix_len])?;
        w.write_all(&self.count.to_le_bytes())?;
        Ok(())
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let prefix_len = r.u8("bucket header")?;
        let count = r.u32("bucket header")?;
        Ok(Self { prefix_len, count })
    }

    /// Payload size in bytes, checked against overflow.
    pub fn payload_len(&self) -> Result<usize, FormatError> {
        (self.count as usize)
            .checked_mul(self.prefix_len as usize)
            .ok_or(FormatError::TooLarge {
                what: "bucket",
                size: usize::MAX,
                max: MAX_FILE_SIZE,
            })
    }
}

// ============================================================================
// FOOTER (8 bytes)
// ============================================================================

/// Footer with CRC32 checksum and magic number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlpsetFooter {
    /// CRC32 checksum of header + all buckets (everything before footer)
    pub crc32: u32,
}

impl VlpsetFooter {
    pub const SIZE: usize = 8; // 4 bytes CRC32 + 4 bytes magic

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.crc32.to_le_bytes())?;
        w.write_all(&FOOTER_MAGIC)?;
        Ok(())
    }

    /// Read the footer from the last 8 bytes of a file.
    pub fn read(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < Self::SIZE {
            return Err(FormatError::Truncated {
                section: "footer",
                needed: Self::SIZE,
                available: bytes.len(),
            });
        }

        let footer_start = bytes.len() - Self::SIZE;
        let magic = &bytes[footer_start + 4..];
        if magic != FOOTER_MAGIC {
            return Err(FormatError::BadMagic {
                expected: FOOTER_MAGIC,
                found: [magic[0], magic[1], magic[2], magic[3]],
            });
        }

        let crc32 = u32::from_le_bytes([
            bytes[footer_start],
            bytes[footer_start + 1],
            bytes[footer_start + 2],
            bytes[footer_start + 3],
        ]);

        Ok(Self { crc32 })
    }

    /// Compute CRC32 over the given bytes
    pub fn compute_crc32(data: &[u8]) -> u32 {
        let mut hasher = Crc32Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }
}

// ============================================================================
// LEGACY PSET HEADER
// ============================================================================

/// Legacy pset header (12 bytes), one fixed prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsetHeader {
    pub version: u8,
    pub prefix_len: u8,
    pub count: u32,
}

impl PsetHeader {
    // 4 (magic) + 1 (version) + 1 (prefix_len) + 2 (reserved) + 4 (count) = 12
    pub const SIZE: usize = 12;

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&LEGACY_MAGIC)?;
        w.write_all(&[self.version, self.prefix_len])?;
        w.write_all(&[0u8; 2])?;
        w.write_all(&self.count.to_le_bytes())?;
        Ok(())
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let magic = r.magic("legacy header")?;
        if magic != LEGACY_MAGIC {
            return Err(FormatError::BadMagic {
                expected: LEGACY_MAGIC,
                found: magic,
            });
        }

        let version = r.u8("legacy header")?;
        if version != LEGACY_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                expected: LEGACY_VERSION,
            });
        }
        let prefix_len = r.u8("legacy header")?;
        r.take(2, "legacy header")?;
        let count = r.u32("legacy header")?;

        Ok(Self {
            version,
            prefix_len,
            count,
        })
    }
}
