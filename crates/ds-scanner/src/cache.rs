//! On-disk scan caches.
//!
//! Two JSON files live in the runtime cache directory:
//!
//! - `scan.cache` - a [`ScanCacheEntry`]: the scan timestamp, the
//!   serialized state of every active collector, and the files that could
//!   not be read
//! - `classes.cache` - the sorted class identities seen by the last full
//!   discovery pass
//!
//! Both are replaced wholesale. Writes go to a sibling temporary file that
//! is then renamed over the target, so readers never observe a torn file.
//! A file that exists but cannot be decoded reads as absent.

use std::collections::BTreeSet;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use ds_core::{ClassIdentity, ScanConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collector::CollectorSnapshot;
use crate::error::ScanError;

/// Contents of `scan.cache`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCacheEntry {
    /// Start of the scan that wrote this entry, in seconds since the Unix
    /// epoch. Files modified at or after it are stale.
    pub timestamp: u64,

    /// Serialized collector states keyed by collector id.
    pub collectors: CollectorSnapshot,

    /// Source files the scan could not read. Their classes are collected
    /// again by the next scan whatever their modification time.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unreadable: BTreeSet<Utf8PathBuf>,
}

/// Reader and writer of the two scan cache files.
///
/// # Examples
///
/// ```
/// use ds_scanner::{ScanCache, ScanCacheEntry};
/// use camino::Utf8Path;
///
/// let dir = tempfile::tempdir()?;
/// let cache = ScanCache::in_dir(Utf8Path::from_path(dir.path()).unwrap());
///
/// assert!(cache.read_entry().is_none());
/// cache.write_entry(&ScanCacheEntry { timestamp: 42, ..Default::default() })?;
/// assert_eq!(cache.read_entry().map(|e| e.timestamp), Some(42));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCache {
    scan_path: Utf8PathBuf,
    classes_path: Utf8PathBuf,
}

impl ScanCache {
    /// Uses the cache file locations of `config`.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            scan_path: config.scan_cache_path(),
            classes_path: config.classes_cache_path(),
        }
    }

    /// Uses the default cache file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Utf8Path) -> Self {
        Self::from_config(&ScanConfig::default().with_cache_dir(dir))
    }

    /// Location of `scan.cache`.
    #[must_use]
    pub fn scan_path(&self) -> &Utf8Path {
        &self.scan_path
    }

    /// Location of `classes.cache`.
    #[must_use]
    pub fn classes_path(&self) -> &Utf8Path {
        &self.classes_path
    }

    /// Reads the previous scan entry, if any usable one exists.
    pub fn read_entry(&self) -> Option<ScanCacheEntry> {
        read_json(&self.scan_path)
    }

    /// Replaces the scan entry.
    pub fn write_entry(&self, entry: &ScanCacheEntry) -> Result<(), ScanError> {
        write_json(&self.scan_path, entry)?;
        debug!(
            path = %self.scan_path,
            timestamp = entry.timestamp,
            collectors = entry.collectors.len(),
            "Wrote scan cache"
        );
        Ok(())
    }

    /// Reads the previous class index, if any usable one exists.
    pub fn read_class_index(&self) -> Option<BTreeSet<ClassIdentity>> {
        read_json(&self.classes_path)
    }

    /// Replaces the class index.
    pub fn write_class_index(&self, classes: &BTreeSet<ClassIdentity>) -> Result<(), ScanError> {
        write_json(&self.classes_path, classes)?;
        debug!(path = %self.classes_path, count = classes.len(), "Wrote class index");
        Ok(())
    }

    /// Deletes both cache files. Missing files are not an error.
    pub fn clear(&self) -> Result<(), ScanError> {
        for path in [&self.scan_path, &self.classes_path] {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path, "Removed cache file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(ScanError::cache_write(path.as_path(), e)),
            }
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            let err = ScanError::cache_read(path, e);
            warn!(error = %err, "Ignoring unreadable cache");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            let err = ScanError::cache_read(path, e);
            warn!(error = %err, "Ignoring corrupt cache");
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Utf8Path, value: &T) -> Result<(), ScanError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| ScanError::cache_write(path, e))?;
    }

    let bytes = serde_json::to_vec(value).map_err(|e| ScanError::cache_write(path, e))?;

    let temp = path.with_extension("tmp");
    fs::write(&temp, &bytes).map_err(|e| ScanError::cache_write(path, e))?;
    fs::rename(&temp, path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        ScanError::cache_write(path, e)
    })
}
