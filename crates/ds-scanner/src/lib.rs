//! Incremental class-metadata scanner for a dependency-injection container.
//!
//! This crate discovers TypeScript classes, hands their decorators to
//! registered handlers that fill named collectors, and persists the
//! collected state so later runs only re-read files that changed.
//!
//! # Overview
//!
//! The main entry point is [`Scanner`], which combines:
//!
//! - [`normalize_paths`]: Drops configured directories that do not exist
//! - [`ClassDiscoverer`]: Parallel parsing of every source file
//! - [`AnnotationReader`]: Dispatch of decorators to [`AnnotationHandler`]s
//! - [`CollectorRegistry`]: The [`MetadataCollector`]s being filled
//! - [`ScanCache`]: The `scan.cache` and `classes.cache` files
//!
//! # Example
//!
//! ```
//! use camino::Utf8PathBuf;
//! use ds_core::ScanConfig;
//! use ds_scanner::{
//!     AnnotationCollector, CollectorRegistry, NullScanHandler, RecordAnnotation, ScanSource,
//!     Scanner,
//! };
//!
//! let dir = tempfile::tempdir()?;
//! let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
//! std::fs::create_dir(root.join("src"))?;
//! std::fs::write(root.join("src/users.ts"), "@Controller('/users') export class Users {}")?;
//!
//! let config = ScanConfig::new(&[&root.join("src")])
//!     .with_collectors(&["routes"])
//!     .with_cache_dir(&root.join("runtime"));
//!
//! let mut registry = CollectorRegistry::new();
//! registry.register(AnnotationCollector::new("routes"));
//!
//! let mut scanner = Scanner::new(config, NullScanHandler)
//!     .with_annotation("Controller", RecordAnnotation::new("routes"));
//! let result = scanner.scan(&mut registry)?;
//!
//! assert_eq!(result.source, ScanSource::Full);
//! let routes = registry.get::<AnnotationCollector>("routes").unwrap();
//! assert!(routes.class_annotation("Users", "Controller").is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Cache Protocol
//!
//! ```text
//! Init ── no paths ──────────────────────────────► Skipped
//!  │
//!  ▼
//! DecideCacheValidity ── timestamp > 0 && cacheable ─► UseCache
//!  │
//!  ├── ScanHandler reports scanned ────────────────► UseCache
//!  ▼
//! FullScan: restore, normalize, discover, purge removed,
//!           re-collect stale, write entry, write class index
//! ```
//!
//! A class is stale when its file's modification time is at or after the
//! cached timestamp, or when its file could not be read by the previous
//! scan. While any file is unreadable, classes missing from the sources
//! are kept rather than purged. Stale classes are cleared from every active collector
//! and collected again; all others keep the state restored from the cache.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod annotations;
mod cache;
mod collector;
mod discover;
mod error;
mod handler;
mod reader;
mod stats;
mod walker;

pub use annotations::{AnnotationCollector, AnnotationValues, ClassMetadata, MethodAnnotation};
pub use cache::{ScanCache, ScanCacheEntry};
pub use collector::{CollectorRegistry, CollectorSnapshot, MetadataCollector};
pub use discover::{ClassDiscoverer, ClassIndex, Discovery};
pub use error::{CollectorError, ScanError};
pub use handler::{NullScanHandler, ScanHandler, Scanned};
pub use reader::{AnnotationHandler, AnnotationReader, CollectOutcome, RecordAnnotation};
pub use stats::{ScanStats, StatsSnapshot};
pub use walker::{FileWalker, normalize_paths};

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use ds_core::{ClassIdentity, ScanConfig};
use tracing::{debug, info};

/// Where the snapshot of a [`ScanResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    /// No paths are configured; nothing was read or written.
    Skipped,
    /// Collectors were restored from `scan.cache` without scanning.
    Cache,
    /// Sources were scanned and the caches rewritten.
    Full,
}

/// Result of [`Scanner::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// How the result was produced.
    pub source: ScanSource,

    /// Serialized collector states.
    ///
    /// For [`ScanSource::Cache`] this is the cached entry as stored; for
    /// [`ScanSource::Full`] it holds every active collector.
    pub snapshot: CollectorSnapshot,

    /// Counters of the scan; all zero unless a full scan ran.
    pub stats: StatsSnapshot,
}

impl ScanResult {
    fn skipped() -> Self {
        Self {
            source: ScanSource::Skipped,
            snapshot: CollectorSnapshot::new(),
            stats: StatsSnapshot::default(),
        }
    }
}

/// Orchestrates one metadata scan.
///
/// The scanner owns the configuration, the [`ScanHandler`] consulted before
/// a full scan, and the [`AnnotationReader`] with its handlers. Collectors
/// are borrowed per scan, so two scans can never fill the same registry at
/// once.
#[derive(Debug)]
pub struct Scanner<H = NullScanHandler> {
    config: ScanConfig,
    handler: H,
    reader: AnnotationReader,
    cache: ScanCache,
    stats: ScanStats,
}

impl<H: ScanHandler> Scanner<H> {
    /// Creates a scanner.
    pub fn new(config: ScanConfig, handler: H) -> Self {
        let cache = ScanCache::from_config(&config);
        Self {
            config,
            handler,
            reader: AnnotationReader::new(),
            cache,
            stats: ScanStats::new(),
        }
    }

    /// Registers a handler for decorators named `name`.
    #[must_use]
    pub fn with_annotation(
        mut self,
        name: impl Into<String>,
        handler: impl AnnotationHandler + 'static,
    ) -> Self {
        self.reader.register(name, handler);
        self
    }

    /// Replaces the annotation reader.
    #[must_use]
    pub fn with_reader(mut self, reader: AnnotationReader) -> Self {
        self.reader = reader;
        self
    }

    /// The scan configuration.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The cache files this scanner reads and writes.
    #[must_use]
    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    /// Runs one scan, filling `registry`.
    ///
    /// # Errors
    ///
    /// - [`ScanError::UnknownCollector`] if a configured collector is not
    ///   registered
    /// - [`ScanError::DirectoryNotExist`] if no configured path exists;
    ///   no cache file has been touched at that point
    /// - [`ScanError::Walk`] if a directory cannot be traversed
    /// - [`ScanError::CacheWrite`] or [`ScanError::Collector`] if the new
    ///   state cannot be persisted
    pub fn scan(&mut self, registry: &mut CollectorRegistry) -> Result<ScanResult, ScanError> {
        if self.config.paths.is_empty() {
            debug!("No scan paths configured");
            return Ok(ScanResult::skipped());
        }

        if let Some(id) = self.config.collectors.iter().find(|id| !registry.contains(id)) {
            return Err(ScanError::UnknownCollector(id.clone()));
        }

        let entry = self.cache.read_entry();
        let timestamp = entry.as_ref().map_or(0, |entry| entry.timestamp);

        if timestamp > 0 && self.config.cacheable {
            debug!(timestamp, "Using cacheable scan data");
            return Ok(self.restore(registry, entry));
        }

        if self.handler.scan().is_scanned() {
            debug!("Scan handler reports a completed scan");
            return Ok(self.restore(registry, entry));
        }

        self.full_scan(registry, entry.as_ref(), timestamp)
    }

    fn restore(
        &self,
        registry: &mut CollectorRegistry,
        entry: Option<ScanCacheEntry>,
    ) -> ScanResult {
        let snapshot = entry.map(|entry| entry.collectors).unwrap_or_default();
        let restored = registry.restore_all(&snapshot, &self.config.collectors);

        info!(restored, "Restored metadata from cache");

        ScanResult {
            source: ScanSource::Cache,
            snapshot,
            stats: StatsSnapshot::default(),
        }
    }

    fn full_scan(
        &self,
        registry: &mut CollectorRegistry,
        entry: Option<&ScanCacheEntry>,
        timestamp: u64,
    ) -> Result<ScanResult, ScanError> {
        let started = unix_now();
        let active = &self.config.collectors;
        self.stats.reset();

        if let Some(entry) = entry {
            registry.restore_all(&entry.collectors, active);
        }

        let paths = normalize_paths(&self.config.paths)?;
        info!(paths = paths.len(), timestamp, "Starting scan");

        let found = ClassDiscoverer::from_config(&self.config).discover(&paths, &self.stats)?;
        let mut current: BTreeSet<ClassIdentity> = found.classes.keys().cloned().collect();

        let previous = self.cache.read_class_index().unwrap_or_default();
        let missing: Vec<ClassIdentity> = previous.difference(&current).cloned().collect();
        if found.unreadable.is_empty() {
            for class in &missing {
                debug!(class = %class, "Purging removed class");
                registry.clear_class(class, active);
                self.stats.increment_removed();
            }
        } else {
            // A missing class may live in a file that could not be read.
            debug!(
                classes = missing.len(),
                unreadable = found.unreadable.len(),
                "Keeping missing classes until every file is readable"
            );
            current.extend(missing);
        }

        let retry = entry.map(|entry| &entry.unreadable);
        for record in found.classes.values() {
            let retried = retry.is_some_and(|paths| paths.contains(record.path()));
            if !retried && !record.is_stale(timestamp) {
                self.stats.increment_unchanged();
                continue;
            }

            registry.clear_class(record.name(), active);
            match self.reader.collect(record, &self.config, registry) {
                CollectOutcome::Collected { .. } => self.stats.increment_collected(),
                CollectOutcome::Shadowed => self.stats.increment_shadowed(),
            }
        }

        let snapshot = registry.snapshot_all(active)?;
        self.cache.write_entry(&ScanCacheEntry {
            timestamp: started,
            collectors: snapshot.clone(),
            unreadable: found.unreadable,
        })?;
        // The class index never runs ahead of `scan.cache`.
        self.cache.write_class_index(&current)?;

        let stats = self.stats.snapshot();
        info!(
            discovered = stats.discovered,
            collected = stats.collected,
            unchanged = stats.unchanged,
            shadowed = stats.shadowed,
            removed = stats.removed,
            errors = stats.file_errors,
            "Scan completed"
        );

        Ok(ScanResult {
            source: ScanSource::Full,
            snapshot,
            stats,
        })
    }
}

/// Current time in whole seconds since the Unix epoch.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
