//! Variable-length hash-prefix sets for safe-browsing style URL lookups.
//!
//! A URL is turned into a handful of fragments (`host/path` combinations),
//! each fragment into a 32-byte SHA-256 completion, and each completion is
//! checked against a list of 4 to 32 byte prefixes. A short-prefix hit only
//! means "possibly listed"; a 32-byte hit is a confirmed match.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────────┐
//! │ fragments.rs │────▶│   hash.rs    │────▶│      cache.rs        │
//! │ (host/path   │     │ (Completion, │     │ (LookupCache: has,   │
//! │  expansion)  │     │   Prefix)    │     │  build, load, write) │
//! └──────────────┘     └──────────────┘     └──────────────────────┘
//!                                                │            │
//!                                                ▼            ▼
//!                            ┌──────────────────────┐   ┌────────────┐
//!                            │    prefix_set.rs     │   │ storage.rs │
//!                            │ (VariableLength-     │   │ (DirStore, │
//!                            │  PrefixSet)          │   │ MemoryStore│
//!                            └──────────────────────┘   └────────────┘
//!                                       │
//!                                       ▼
//!                  ┌───────────────────────────────────────────┐
//!                  │ prefix_map.rs  +  binary/ (vlpset, pset)  │
//!                  └───────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use vlpset::{lookup_fragments, Completion, DirStore, LookupCache, PrefixStringMap};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(DirStore::open("/var/lib/safebrowsing")?);
//! let cache = LookupCache::new("goog-phish-proto", store);
//!
//! let mut update = PrefixStringMap::from_prefixes([
//!     Completion::from_plaintext("evil.example/").prefix_bytes(4).to_vec(),
//! ])?;
//! cache.build(&mut update);
//! cache.write_file()?;
//!
//! for fragment in lookup_fragments("www.evil.example/login") {
//!     let result = cache.has(&Completion::from_plaintext(&fragment));
//!     if result.has {
//!         println!("{} matched {} bytes", fragment, result.match_length);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod cache;
pub mod contracts;
pub mod error;
pub mod fragments;
pub mod hash;
pub mod prefix_map;
pub mod prefix_set;
pub mod storage;

#[doc(hidden)]
pub mod testing;

// Re-exports for public API
pub use binary::{detect_format, FileFormat, LoadedFile};
pub use cache::{LoadOutcome, LookupCache, LookupResult};
pub use error::{CacheError, FormatError};
pub use fragments::{host_keys, is_canonicalized_ip, lookup_fragments};
pub use hash::{
    Completion, FragmentHasher, Prefix, Sha256Hasher, COMPLETE_SIZE, MAX_PREFIX_SIZE,
    MIN_PREFIX_SIZE,
};
pub use prefix_map::PrefixStringMap;
pub use prefix_set::VariableLengthPrefixSet;
pub use storage::{DirStore, MemoryStore, PrefixStore};
