//! File-backed device registry.
//!
//! One JSON document holds the resolved device list (written by discovery)
//! and the last-known state per device id (written by the control fallback).
//! Every access is a whole-file read, and every update a whole-file
//! read-modify-write.
//!
//! Writes go to a sibling temp file and are renamed into place, so readers
//! never see a torn document. Updates inside one process are serialized by a
//! global lock; separate processes sharing the file are NOT coordinated and
//! the last writer wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wemo::types::{DeviceRecord, StateValue};

/// Global mutex to serialize all cache read-modify-write cycles.
static CACHE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn cache_lock() -> &'static Mutex<()> {
    CACHE_LOCK.get_or_init(|| Mutex::new(()))
}

/// Errors from reading or writing the cache file.
///
/// These never escape the public cache operations; they are logged and the
/// operation degrades (empty store on read, skipped write).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The persisted document.
///
/// The two halves are not kept consistent with each other: state entries for
/// devices that disappeared from `device` are left in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStore {
    #[serde(default)]
    pub device: Vec<DeviceRecord>,
    #[serde(default)]
    pub state: BTreeMap<String, StateValue>,
}

/// Handle to a cache file.
#[derive(Debug, Clone)]
pub struct DeviceCache {
    path: PathBuf,
}

impl DeviceCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.as_os_str().to_owned();
        temp.push(".tmp");
        PathBuf::from(temp)
    }

    /// Reads the whole store, failing on I/O or parse errors.
    ///
    /// A missing or empty file is an empty store, not an error.
    pub fn try_load(&self) -> Result<CacheStore, CacheError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CacheStore::default())
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(CacheStore::default());
        }

        serde_json::from_str(&contents).map_err(|source| CacheError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads the whole store.
    ///
    /// Returns an empty store if the file is missing, empty or invalid.
    pub fn load(&self) -> CacheStore {
        self.try_load().unwrap_or_else(|e| {
            log::warn!("[Cache] {}; treating as empty", e);
            CacheStore::default()
        })
    }

    /// Writes the whole store (temp file + rename).
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self, store: &CacheStore) -> Result<(), CacheError> {
        let io_err = |source: std::io::Error| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(store).map_err(|source| CacheError::Json {
            path: self.path.clone(),
            source,
        })?;

        let temp_path = self.temp_path();
        std::fs::write(&temp_path, contents).map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)
    }

    /// Applies `f` to the current store and saves the result under the lock.
    fn update(&self, f: impl FnOnce(&mut CacheStore)) {
        let _guard = cache_lock().lock();
        let mut store = self.load();
        f(&mut store);
        if let Err(e) = self.save(&store) {
            log::warn!("[Cache] Write skipped: {}", e);
        }
    }

    /// Returns the cached device list (empty if none).
    pub fn read_devices(&self) -> Vec<DeviceRecord> {
        let _guard = cache_lock().lock();
        self.load().device
    }

    /// Replaces the device list, keeping every state entry.
    pub fn write_devices(&self, devices: &[DeviceRecord]) {
        log::debug!("[Cache] Writing {} device(s) to {}", devices.len(), self.path.display());
        self.update(|store| store.device = devices.to_vec());
    }

    /// Returns the last-known state of `id`, or off if none was recorded.
    pub fn read_state(&self, id: &str) -> StateValue {
        let _guard = cache_lock().lock();
        self.load().state.get(id).cloned().unwrap_or_default()
    }

    /// Records the state of `id`, keeping the device list.
    pub fn write_state(&self, id: &str, value: StateValue) {
        log::debug!("[Cache] Recording state {} for {}", value, id);
        self.update(|store| {
            store.state.insert(id.to_string(), value);
        });
    }
}
