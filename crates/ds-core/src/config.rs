//! Configuration structures for the di-scan metadata scanner.
//!
//! - [`ScanConfig`] - Scanner settings (paths, collectors, cache policy)
//! - [`Config`] - Root configuration, adding the decorator-to-collector
//!   recording table used by the command-line driver
//!
//! Both types implement [`Default`] and deserialize with `#[serde(default)]`,
//! so a configuration file only needs the fields it changes.

use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::FxHashMap;

/// File name of the collector snapshot cache inside [`ScanConfig::cache_dir`].
pub const SCAN_CACHE_FILE: &str = "scan.cache";

/// File name of the class index cache inside [`ScanConfig::cache_dir`].
pub const CLASSES_CACHE_FILE: &str = "classes.cache";

/// Configuration for a metadata scan.
///
/// Created once at process configuration time and read-only afterwards.
///
/// # Examples
///
/// ```
/// use ds_core::ScanConfig;
/// use camino::Utf8Path;
///
/// let config = ScanConfig::new(&[Utf8Path::new("src")])
///     .with_collectors(&["routes"])
///     .with_cacheable(true);
///
/// assert_eq!(config.paths.len(), 1);
/// assert!(config.cacheable);
/// assert_eq!(config.scan_cache_path().as_str(), "runtime/container/scan.cache");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directories to scan, in order.
    pub paths: Vec<Utf8PathBuf>,

    /// Identifiers of the collectors that take part in the scan.
    pub collectors: Vec<String>,

    /// Trust an existing cache without re-validating file timestamps.
    pub cacheable: bool,

    /// Class identity to authoritative source file.
    ///
    /// A class discovered anywhere else is treated as shadowed and
    /// contributes no metadata.
    pub class_map: FxHashMap<String, Utf8PathBuf>,

    /// Decorator names that are never handed to a handler.
    pub ignore_annotations: Vec<String>,

    /// Directory holding `scan.cache` and `classes.cache`.
    pub cache_dir: Utf8PathBuf,

    /// Additional directory names to skip while walking.
    pub skip_dirs: Vec<String>,

    /// Whether to follow symbolic links while walking.
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            collectors: Vec::new(),
            cacheable: false,
            class_map: FxHashMap::default(),
            ignore_annotations: Vec::new(),
            cache_dir: Utf8PathBuf::from("runtime/container"),
            skip_dirs: Vec::new(),
            follow_links: false,
        }
    }
}

impl ScanConfig {
    /// Creates a configuration scanning the given directories.
    #[must_use]
    pub fn new(paths: &[&Utf8Path]) -> Self {
        Self {
            paths: paths.iter().map(|p| (*p).to_owned()).collect(),
            ..Self::default()
        }
    }

    /// Sets the participating collector identifiers.
    #[must_use]
    pub fn with_collectors(mut self, ids: &[&str]) -> Self {
        self.collectors = ids.iter().map(ToString::to_string).collect();
        self
    }

    /// Sets the cacheable flag.
    #[must_use]
    pub const fn with_cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Sets the runtime cache directory.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: &Utf8Path) -> Self {
        self.cache_dir = dir.to_owned();
        self
    }

    /// Pins a class identity to its authoritative source file.
    #[must_use]
    pub fn with_class_map_entry(mut self, class: &str, path: &Utf8Path) -> Self {
        self.class_map.insert(class.to_owned(), path.to_owned());
        self
    }

    /// Adds decorator names to ignore.
    #[must_use]
    pub fn with_ignore_annotations(mut self, names: &[&str]) -> Self {
        self.ignore_annotations
            .extend(names.iter().map(ToString::to_string));
        self
    }

    /// Adds directories to skip during walking.
    #[must_use]
    pub fn with_skip_dirs(mut self, dirs: &[&str]) -> Self {
        self.skip_dirs.extend(dirs.iter().map(ToString::to_string));
        self
    }

    /// Path of the collector snapshot cache.
    #[must_use]
    pub fn scan_cache_path(&self) -> Utf8PathBuf {
        self.cache_dir.join(SCAN_CACHE_FILE)
    }

    /// Path of the class index cache.
    #[must_use]
    pub fn classes_cache_path(&self) -> Utf8PathBuf {
        self.cache_dir.join(CLASSES_CACHE_FILE)
    }

    /// Returns the authoritative source path for a class, if pinned.
    #[must_use]
    pub fn authoritative_path(&self, class: &str) -> Option<&Utf8Path> {
        self.class_map.get(class).map(Utf8PathBuf::as_path)
    }

    /// Returns `true` if decorators with this name must be ignored.
    #[must_use]
    pub fn is_ignored_annotation(&self, name: &str) -> bool {
        self.ignore_annotations.iter().any(|n| n == name)
    }

    /// Returns `true` if the collector takes part in the scan.
    #[must_use]
    pub fn has_collector(&self, id: &str) -> bool {
        self.collectors.iter().any(|c| c == id)
    }
}

/// Root configuration file for the `di-scan` driver.
///
/// # Examples
///
/// ```
/// use ds_core::Config;
///
/// let config = Config::from_json_str(r#"{
///     "scan": { "paths": ["src"], "collectors": ["routes"] },
///     "record": { "Route": "routes" }
/// }"#)?;
///
/// assert_eq!(config.record.get("Route").map(String::as_str), Some("routes"));
/// # Ok::<(), ds_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner configuration.
    pub scan: ScanConfig,

    /// Decorator name to the collector that records it.
    pub record: BTreeMap<String, String>,
}

impl Config {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Checks cross-field consistency.
    ///
    /// Every recording target must be a configured collector, and collector
    /// identifiers must be unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, id) in self.scan.collectors.iter().enumerate() {
            if self.scan.collectors[..index].contains(id) {
                return Err(ConfigError::invalid_option(
                    "scan.collectors",
                    format!("duplicate collector '{id}'"),
                ));
            }
        }

        for (annotation, collector) in &self.record {
            if !self.scan.has_collector(collector) {
                return Err(ConfigError::invalid_option(
                    format!("record.{annotation}"),
                    format!("unknown collector '{collector}'"),
                ));
            }
        }

        Ok(())
    }
}
