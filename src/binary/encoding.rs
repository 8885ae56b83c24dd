// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Encoders and decoders for whole vlpset and pset files.
//!
//! Nothing clever: prefixes are already sorted fixed-width bytes, which is
//! about as compact as uncompressed random data gets. The work here is in the
//! decoder refusing everything that is not exactly what the encoder writes.
//! A corrupt file that decodes "mostly" would answer lookups wrongly forever,
//! so every check below fails loudly instead.

use super::header::{
    BucketHeader, ByteReader, FileLimits, PsetHeader, VlpsetFooter, VlpsetHeader, LEGACY_VERSION,
    MAX_FILE_SIZE, MAX_PREFIX_COUNT,
};
use crate::error::FormatError;
use crate::hash::is_valid_prefix_len;
use crate::prefix_map::PrefixStringMap;

// ============================================================================
// BUCKET VALIDATION
// ============================================================================

/// Check that a packed bucket is aligned, sorted and duplicate-free.
pub fn validate_bucket(len: usize, bytes: &[u8]) -> Result<(), FormatError> {
    if !is_valid_prefix_len(len) {
        return Err(FormatError::InvalidPrefixLength(len));
    }
    if bytes.len() % len != 0 {
        return Err(FormatError::MisalignedBucket {
            len,
            size: bytes.len(),
        });
    }

    let mut entries = bytes.chunks_exact(len);
    if let Some(mut prev) = entries.next() {
        for (i, entry) in entries.enumerate() {
            if prev >= entry {
                return Err(FormatError::UnsortedBucket {
                    len,
                    position: i + 1,
                });
            }
            prev = entry;
        }
    }
    Ok(())
}

fn check_file_size(size: usize) -> Result<(), FormatError> {
    if size > MAX_FILE_SIZE {
        return Err(FormatError::TooLarge {
            what: "file",
            size,
            max: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

fn check_prefix_count(count: u32) -> Result<(), FormatError> {
    if count > MAX_PREFIX_COUNT {
        return Err(FormatError::TooLarge {
            what: "prefix count",
            size: count as usize,
            max: MAX_PREFIX_COUNT as usize,
        });
    }
    Ok(())
}

// ============================================================================
// VLPSET (current format)
// ============================================================================

/// Encode a prefix map as a complete vlpset file.
///
/// Buckets are written in ascending length order; empty buckets are skipped.
///
/// Format:
/// - header: `"VLPS" | version | bucket_count | reserved[2]`
/// - per bucket: `prefix_len: u8 | count: u32 | count * prefix_len bytes`
/// - footer: `crc32 | "SPLV"`
pub fn encode_vlpset(map: &PrefixStringMap, buf: &mut Vec<u8>) {
    encode_buckets(map.iter(), buf);
}

/// Check that buckets encode to a file the decoder will accept under `limits`.
///
/// Run before writing anything to disk: a file over the limits would be
/// refused by the next load.
pub fn check_limits<'a, I>(buckets: I, limits: &FileLimits) -> Result<(), FormatError>
where
    I: IntoIterator<Item = (usize, &'a [u8])>,
{
    let mut size = VlpsetHeader::SIZE + VlpsetFooter::SIZE;
    for (len, bytes) in buckets {
        if bytes.is_empty() {
            continue;
        }
        let count = bytes.len() / len;
        if count > limits.max_prefix_count as usize {
            return Err(FormatError::TooLarge {
                what: "prefix count",
                size: count,
                max: limits.max_prefix_count as usize,
            });
        }
        size = size.saturating_add(BucketHeader::SIZE + bytes.len());
    }
    if size > limits.max_file_size {
        return Err(FormatError::TooLarge {
            what: "file",
            size,
            max: limits.max_file_size,
        });
    }
    Ok(())
}

/// Encode packed buckets, given in ascending length order, as a vlpset file.
///
/// Lets the prefix set serialize its own buffers without first copying them
/// back into a map. Does not enforce [`FileLimits`]; callers persisting the
/// result run [`check_limits`] first.
pub(crate) fn encode_buckets<'a, I>(buckets: I, buf: &mut Vec<u8>)
where
    I: IntoIterator<Item = (usize, &'a [u8])>,
{
    let start = buf.len();
    let buckets: Vec<(usize, &[u8])> = buckets
        .into_iter()
        .filter(|(_, bytes)| !bytes.is_empty())
        .collect();
    let payload: usize = buckets.iter().map(|(_, bytes)| bytes.len()).sum();

    buf.reserve(
        VlpsetHeader::SIZE + buckets.len() * BucketHeader::SIZE + payload + VlpsetFooter::SIZE,
    );

    // Writing into a Vec cannot fail.
    let _ = VlpsetHeader::new(buckets.len() as u8).write(buf);
    for (len, bytes) in buckets {
        let _ = BucketHeader {
            prefix_len: len as u8,
            count: (bytes.len() / len) as u32,
        }
        .write(buf);
        buf.extend_from_slice(bytes);
    }

    let crc32 = VlpsetFooter::compute_crc32(&buf[start..]);
    let _ = VlpsetFooter { crc32 }.write(buf);
}

/// Decode a complete vlpset file.
///
/// Rejects bad magic or version, checksum mismatches, truncation, duplicate
/// or out-of-order lengths, empty or unsorted buckets and trailing bytes.
pub fn decode_vlpset(bytes: &[u8]) -> Result<PrefixStringMap, FormatError> {
    check_file_size(bytes.len())?;

    // Header first, so a file of the wrong kind reports its magic, not its footer.
    let header = VlpsetHeader::read(&mut ByteReader::new(bytes))?;

    if bytes.len() < VlpsetHeader::SIZE + VlpsetFooter::SIZE {
        return Err(FormatError::Truncated {
            section: "footer",
            needed: VlpsetHeader::SIZE + VlpsetFooter::SIZE,
            available: bytes.len(),
        });
    }

    let footer = VlpsetFooter::read(bytes)?;
    let content = &bytes[..bytes.len() - VlpsetFooter::SIZE];
    let computed = VlpsetFooter::compute_crc32(content);
    if computed != footer.crc32 {
        return Err(FormatError::ChecksumMismatch {
            stored: footer.crc32,
            computed,
        });
    }

    let mut reader = ByteReader::new(&content[VlpsetHeader::SIZE..]);
    let mut map = PrefixStringMap::new();
    let mut prev_len = 0u8;

    for _ in 0..header.bucket_count {
        let bucket = BucketHeader::read(&mut reader)?;
        let len = bucket.prefix_len as usize;
        if !is_valid_prefix_len(len) {
            return Err(FormatError::InvalidPrefixLength(len));
        }
        if bucket.prefix_len <= prev_len {
            return Err(FormatError::DuplicateBucket(bucket.prefix_len));
        }
        prev_len = bucket.prefix_len;
        if bucket.count == 0 {
            return Err(FormatError::EmptyBucket(bucket.prefix_len));
        }
        check_prefix_count(bucket.count)?;

        let payload = reader.take(bucket.payload_len()?, "bucket")?;
        validate_bucket(len, payload)?;
        map.insert_bucket(len, payload.to_vec())?;
    }

    if reader.remaining() != 0 {
        return Err(FormatError::TrailingBytes(reader.remaining()));
    }

    Ok(map)
}

// ============================================================================
// PSET (legacy format)
// ============================================================================

/// Encode a legacy single-length pset file.
///
/// Only used to produce fixtures and by tooling; caches never write pset.
pub fn encode_pset(
    prefix_len: usize,
    prefixes: &[u8],
    buf: &mut Vec<u8>,
) -> Result<(), FormatError> {
    validate_bucket(prefix_len, prefixes)?;
    let count = prefixes.len() / prefix_len;
    if count > MAX_PREFIX_COUNT as usize {
        return Err(FormatError::TooLarge {
            what: "prefix count",
            size: count,
            max: MAX_PREFIX_COUNT as usize,
        });
    }

    PsetHeader {
        version: LEGACY_VERSION,
        prefix_len: prefix_len as u8,
        count: count as u32,
    }
    .write(buf)?;
    buf.extend_from_slice(prefixes);
    Ok(())
}

/// Decode a legacy pset file into a single-bucket prefix map.
pub fn decode_pset(bytes: &[u8]) -> Result<PrefixStringMap, FormatError> {
    check_file_size(bytes.len())?;

    let mut reader = ByteReader::new(bytes);
    let header = PsetHeader::read(&mut reader)?;
    let len = header.prefix_len as usize;
    if !is_valid_prefix_len(len) {
        return Err(FormatError::InvalidPrefixLength(len));
    }
    check_prefix_count(header.count)?;

    let payload_len = (header.count as usize)
        .checked_mul(len)
        .ok_or(FormatError::TooLarge {
            what: "bucket",
            size: usize::MAX,
            max: MAX_FILE_SIZE,
        })?;
    let payload = reader.take(payload_len, "legacy prefixes")?;
    if reader.remaining() != 0 {
        return Err(FormatError::TrailingBytes(reader.remaining()));
    }
    validate_bucket(len, payload)?;

    let mut map = PrefixStringMap::new();
    map.insert_bucket(len, payload.to_vec())?;
    Ok(map)
}
