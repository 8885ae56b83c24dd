// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Completions and prefixes: the two shapes a URL hash takes.
//!
//! A `Completion` is the full 32-byte digest of a canonicalized URL fragment
//! such as `"example.com/login/"`. A `Prefix` is the first 4 to 32 bytes of
//! one. Lists are shipped as prefixes because 4 bytes are enough to rule out
//! almost every URL; only the rare hit needs the full hash to be sure.
//!
//! The digest itself is pluggable. `Sha256Hasher` is what safe-browsing
//! lists use, but anything implementing `FragmentHasher` works, which keeps
//! tests free to use a trivial hasher when they want hand-picked bytes.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::FormatError;

/// Size of a full hash (a completion).
pub const COMPLETE_SIZE: usize = 32;

/// Shortest prefix length a list may contain.
pub const MIN_PREFIX_SIZE: usize = 4;

/// Longest prefix length. A prefix this long is a complete hash.
pub const MAX_PREFIX_SIZE: usize = COMPLETE_SIZE;

/// Check a prefix length against the supported range.
#[inline]
pub fn is_valid_prefix_len(len: usize) -> bool {
    (MIN_PREFIX_SIZE..=MAX_PREFIX_SIZE).contains(&len)
}

// ============================================================================
// HASHERS
// ============================================================================

/// Turns a fragment string into a 32-byte digest.
pub trait FragmentHasher: Send + Sync {
    fn digest(&self, fragment: &[u8]) -> [u8; COMPLETE_SIZE];
}

/// SHA-256, the digest safe-browsing lists are built with.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl FragmentHasher for Sha256Hasher {
    fn digest(&self, fragment: &[u8]) -> [u8; COMPLETE_SIZE] {
        let mut hasher = Sha256::new();
        hasher.update(fragment);
        hasher.finalize().into()
    }
}

// ============================================================================
// COMPLETION
// ============================================================================

/// Full 32-byte hash of a URL fragment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Completion([u8; COMPLETE_SIZE]);

impl Completion {
    /// Hash a fragment with SHA-256.
    pub fn from_plaintext(fragment: &str) -> Self {
        Self::from_plaintext_with(&Sha256Hasher, fragment)
    }

    /// Hash a fragment with a caller-chosen digest.
    pub fn from_plaintext_with<H: FragmentHasher + ?Sized>(hasher: &H, fragment: &str) -> Self {
        Self(hasher.digest(fragment.as_bytes()))
    }

    pub const fn from_bytes(bytes: [u8; COMPLETE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, FormatError> {
        let bytes = decode_hex(hex)?;
        let array: [u8; COMPLETE_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FormatError::InvalidPrefixLength(bytes.len()))?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; COMPLETE_SIZE] {
        &self.0
    }

    /// First `len` bytes of the hash.
    ///
    /// # Panics
    ///
    /// Panics if `len` is outside `4..=32`. Asking for such a prefix is a bug
    /// in the caller, not a runtime condition.
    #[inline]
    pub fn prefix_bytes(&self, len: usize) -> &[u8] {
        assert!(
            is_valid_prefix_len(len),
            "prefix length {} outside {}..={}",
            len,
            MIN_PREFIX_SIZE,
            MAX_PREFIX_SIZE
        );
        &self.0[..len]
    }

    /// First `len` bytes of the hash as an owned `Prefix`.
    ///
    /// # Panics
    ///
    /// Same contract as [`Completion::prefix_bytes`].
    pub fn prefix(&self, len: usize) -> Prefix {
        let mut buf = [0u8; MAX_PREFIX_SIZE];
        buf[..len].copy_from_slice(self.prefix_bytes(len));
        Prefix {
            buf,
            len: len as u8,
        }
    }

    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Completion({})", self.to_hex())
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; COMPLETE_SIZE]> for Completion {
    fn from(bytes: [u8; COMPLETE_SIZE]) -> Self {
        Self(bytes)
    }
}

// ============================================================================
// PREFIX
// ============================================================================

/// A 4 to 32 byte hash prefix. Ordering is lexicographic on the raw bytes.
#[derive(Clone, Copy)]
pub struct Prefix {
    buf: [u8; MAX_PREFIX_SIZE],
    len: u8,
}

impl Prefix {
    /// Validate and copy a prefix.
    pub fn new(bytes: &[u8]) -> Result<Self, FormatError> {
        if !is_valid_prefix_len(bytes.len()) {
            return Err(FormatError::InvalidPrefixLength(bytes.len()));
        }
        let mut buf = [0u8; MAX_PREFIX_SIZE];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            buf,
            len: bytes.len() as u8,
        })
    }

    pub fn from_hex(hex: &str) -> Result<Self, FormatError> {
        Self::new(&decode_hex(hex)?)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; prefixes have at least `MIN_PREFIX_SIZE` bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A 32-byte prefix is a whole completion.
    pub fn is_complete(&self) -> bool {
        self.len() == COMPLETE_SIZE
    }

    /// True if `completion` starts with this prefix.
    pub fn matches(&self, completion: &Completion) -> bool {
        completion.as_bytes().starts_with(self.as_bytes())
    }

    pub fn to_hex(&self) -> String {
        encode_hex(self.as_bytes())
    }
}

impl PartialEq for Prefix {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Prefix {}

impl std::hash::Hash for Prefix {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl PartialOrd for Prefix {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Prefix {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl AsRef<[u8]> for Prefix {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prefix({})", self.to_hex())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ============================================================================
// HEX
// ============================================================================

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

pub(crate) fn decode_hex(hex: &str) -> Result<Vec<u8>, FormatError> {
    let invalid = || FormatError::InvalidHex(hex.to_string());

    if hex.len() % 2 != 0 {
        return Err(invalid());
    }

    hex.as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(invalid)
        })
        .collect()
}
