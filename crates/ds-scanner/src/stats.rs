//! Scan statistics with atomic counters.
//!
//! [`ScanStats`] is shared with the parallel parsing pass, so its counters
//! are atomics; [`StatsSnapshot`] is the plain copy returned to callers.
//!
//! # Examples
//!
//! ```
//! use ds_scanner::ScanStats;
//!
//! let stats = ScanStats::new();
//! stats.increment_files();
//! stats.add_discovered(3);
//! stats.increment_collected();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.discovered, 3);
//! assert_eq!(snapshot.collected, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for one scan.
///
/// Relaxed ordering is enough: the values are only read after the scan
/// has finished or for display.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Source files parsed successfully.
    files: AtomicU64,
    /// Source files that failed to read or parse.
    file_errors: AtomicU64,
    /// Classes found by discovery.
    discovered: AtomicU64,
    /// Classes handed to the annotation reader.
    collected: AtomicU64,
    /// Classes older than the cache timestamp.
    unchanged: AtomicU64,
    /// Classes skipped because the class map points elsewhere.
    shadowed: AtomicU64,
    /// Classes purged because they disappeared from the sources.
    removed: AtomicU64,
}

impl ScanStats {
    /// Creates a new [`ScanStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the parsed files counter.
    #[inline]
    pub fn increment_files(&self) {
        self.files.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the failed files counter.
    #[inline]
    pub fn increment_file_errors(&self) {
        self.file_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds to the discovered classes counter.
    #[inline]
    pub fn add_discovered(&self, count: u64) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    /// Increments the collected classes counter.
    #[inline]
    pub fn increment_collected(&self) {
        self.collected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the unchanged classes counter.
    #[inline]
    pub fn increment_unchanged(&self) {
        self.unchanged.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the shadowed classes counter.
    #[inline]
    pub fn increment_shadowed(&self) {
        self.shadowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the removed classes counter.
    #[inline]
    pub fn increment_removed(&self) {
        self.removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files: self.files.load(Ordering::Relaxed),
            file_errors: self.file_errors.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            collected: self.collected.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            shadowed: self.shadowed.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.files,
            &self.file_errors,
            &self.discovered,
            &self.collected,
            &self.unchanged,
            &self.shadowed,
            &self.removed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// A point-in-time copy of [`ScanStats`].
///
/// All zeros for scans answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Source files parsed successfully.
    pub files: u64,
    /// Source files that failed to read or parse.
    pub file_errors: u64,
    /// Classes found by discovery.
    pub discovered: u64,
    /// Classes handed to the annotation reader.
    pub collected: u64,
    /// Classes older than the cache timestamp.
    pub unchanged: u64,
    /// Classes skipped because the class map points elsewhere.
    pub shadowed: u64,
    /// Classes purged because they disappeared from the sources.
    pub removed: u64,
}

impl StatsSnapshot {
    /// Number of classes re-processed this scan, shadowed ones included.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_scanner::StatsSnapshot;
    ///
    /// let snap = StatsSnapshot {
    ///     discovered: 10,
    ///     collected: 3,
    ///     shadowed: 1,
    ///     unchanged: 6,
    ///     ..Default::default()
    /// };
    /// assert_eq!(snap.stale(), 4);
    /// ```
    #[inline]
    #[must_use]
    pub const fn stale(&self) -> u64 {
        self.collected + self.shadowed
    }

    /// Returns the share of source files that parsed, as a percentage.
    ///
    /// Returns 100.0 if no file was visited.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn success_rate(&self) -> f64 {
        let total = self.files + self.file_errors;
        if total == 0 {
            return 100.0;
        }

        (self.files as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_stats_new() {
        let snap = ScanStats::new().snapshot();
        assert_eq!(snap, StatsSnapshot::default());
    }

    #[test]
    fn test_scan_stats_increment() {
        let stats = ScanStats::new();

        stats.increment_files();
        stats.increment_files();
        stats.increment_file_errors();
        stats.add_discovered(5);
        stats.increment_collected();
        stats.increment_unchanged();
        stats.increment_shadowed();
        stats.increment_removed();

        let snap = stats.snapshot();
        assert_eq!(snap.files, 2);
        assert_eq!(snap.file_errors, 1);
        assert_eq!(snap.discovered, 5);
        assert_eq!(snap.collected, 1);
        assert_eq!(snap.unchanged, 1);
        assert_eq!(snap.shadowed, 1);
        assert_eq!(snap.removed, 1);
    }

    #[test]
    fn test_scan_stats_reset() {
        let stats = ScanStats::new();
        stats.increment_files();
        stats.add_discovered(2);

        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_success_rate() {
        assert!((StatsSnapshot::default().success_rate() - 100.0).abs() < f64::EPSILON);

        let snap = StatsSnapshot {
            files: 3,
            file_errors: 1,
            ..Default::default()
        };
        assert!((snap.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snap = StatsSnapshot {
            discovered: 2,
            ..Default::default()
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"discovered\":2"));
    }
}
