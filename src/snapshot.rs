//! Persisted engine state.
//!
//! A [`Snapshot`] is everything a feed needs to pick up where the previous
//! run left off: its metadata, the cache tokens and the entry registry.  It
//! is always read and written as one blob, named by the source's
//! persistence key.
//!
//! ## For contributors
//!
//! [`SnapshotStore`] is the only thing in the crate allowed to touch durable
//! state.  A store must replace a snapshot atomically: a half-written blob
//! would break every later run for that source.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache_token::CacheToken;
use crate::error::{FeedError, Result};
use crate::registry::EntryRegistry;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Channel-level data for the published document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMetadata {
    pub title: String,
    pub description: String,
    /// Channel link; the source address.
    pub link: String,
    /// Where the published document is written.
    pub output_file: PathBuf,
    /// Build time of the last run that derived entries.
    pub last_build_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub metadata: FeedMetadata,
    pub token: CacheToken,
    pub registry: EntryRegistry,
}

impl Snapshot {
    pub fn key(&self) -> &str {
        &self.token.persistence_key
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|source| FeedError::CorruptSnapshot {
            key: self.key().to_string(),
            source,
        })
    }

    fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_slice(bytes).map_err(|source| FeedError::CorruptSnapshot {
                key: key.to_string(),
                source,
            })?;
        snapshot
            .registry
            .verify()
            .map_err(|reason| FeedError::InconsistentSnapshot {
                key: key.to_string(),
                reason,
            })?;
        Ok(snapshot)
    }
}

/// Durable storage for snapshots.
pub trait SnapshotStore: Send {
    /// Load the snapshot stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot for `snapshot.key()`.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Stores each snapshot as `<dir>/<key>.json`.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, key: &str) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(self.path_for(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FeedError::Persistence {
                    key: key.to_string(),
                    source,
                })
            }
        };
        Snapshot::from_bytes(key, &bytes).map(Some)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = snapshot.to_bytes()?;
        fs::create_dir_all(&self.dir)
            .and_then(|()| write_atomically(&self.path_for(snapshot.key()), &bytes))
            .map_err(|source| FeedError::Persistence {
                key: snapshot.key().to_string(),
                source,
            })
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keeps serialized snapshots in memory.
///
/// Clones share the same storage, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw serialized snapshot stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &str) -> Result<Option<Snapshot>> {
        self.raw(key)
            .map(|bytes| Snapshot::from_bytes(key, &bytes))
            .transpose()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = snapshot.to_bytes()?;
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(snapshot.key().to_string(), bytes);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
