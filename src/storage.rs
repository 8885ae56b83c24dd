// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Where table files live.
//!
//! The cache never touches paths itself. It asks a `PrefixStore` for named
//! blobs (`goog-phish-proto.vlpset`, `goog-phish-proto.pset`) and leaves
//! durability to the store. `DirStore` is the real one; `MemoryStore` is for
//! tests and for callers that persist somewhere other than a directory.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Named-blob storage for table files.
///
/// `write` must be atomic: after it returns `Ok`, a reader sees the new
/// content in full; after a crash, it sees either the old or the new content.
pub trait PrefixStore: Send + Sync + fmt::Debug {
    /// Read a whole blob. `Ok(None)` if it does not exist.
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Replace a blob atomically.
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Remove a blob. Returns whether it existed.
    fn remove(&self, name: &str) -> io::Result<bool>;

    fn exists(&self, name: &str) -> io::Result<bool>;

    /// Human-readable location of a blob, for logs and error messages.
    fn location(&self, name: &str) -> String;
}

// ============================================================================
// DIRECTORY STORE
// ============================================================================

/// Files in one directory. Writes go through a temp file, `fsync`, rename.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Use `root` as the table directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.root.join(format!(".{}.{}.tmp", name, std::process::id()))
    }
}

impl PrefixStore for DirStore {
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let temp = self.temp_path(name);
        let result: io::Result<()> = (|| {
            let mut file = File::create(&temp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            drop(file);
            fs::rename(&temp, self.path(name))
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result
    }

    fn remove(&self, name: &str) -> io::Result<bool> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn exists(&self, name: &str) -> io::Result<bool> {
        self.path(name).try_exists()
    }

    fn location(&self, name: &str) -> String {
        self.path(name).display().to_string()
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory store. Can be switched read-only to simulate a failing disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    read_only: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, `write` and `remove` fail with `PermissionDenied`.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock() = read_only;
    }

    /// Names of all stored blobs, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.blobs.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Store a blob directly, bypassing the read-only switch.
    pub fn insert(&self, name: &str, bytes: Vec<u8>) {
        self.blobs.lock().insert(name.to_string(), bytes);
    }

    fn check_writable(&self) -> io::Result<()> {
        if *self.read_only.lock() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "store is read-only",
            ));
        }
        Ok(())
    }
}

impl PrefixStore for MemoryStore {
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.blobs.lock().get(name).cloned())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.check_writable()?;
        self.blobs.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, name: &str) -> io::Result<bool> {
        self.check_writable()?;
        Ok(self.blobs.lock().remove(name).is_some())
    }

    fn exists(&self, name: &str) -> io::Result<bool> {
        Ok(self.blobs.lock().contains_key(name))
    }

    fn location(&self, name: &str) -> String {
        format!("memory:{}", name)
    }
}
