//! Error types for the ds-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! while resolving directories, discovering classes, collecting metadata,
//! and reading or writing the scan caches.

use std::io;

use camino::Utf8PathBuf;

/// Error returned by a [`MetadataCollector`](crate::MetadataCollector) when
/// its state cannot be encoded or decoded.
pub type CollectorError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during scanning operations.
///
/// # Error Recovery Strategy
///
/// - **Missing directories** ([`ScanError::DirectoryNotExist`]): Fatal, raised
///   before any cache is touched
/// - **Cache reads** ([`ScanError::CacheRead`]): Logged and treated as a
///   cache miss; never returned from a scan
/// - **Cache writes** ([`ScanError::CacheWrite`]): Fatal
/// - **File read/parse errors** ([`ScanError::Read`], [`ScanError::Parse`]):
///   Log warning, skip file, continue scan
///
/// # Examples
///
/// ```
/// use ds_scanner::ScanError;
///
/// fn describe(err: &ScanError) -> &'static str {
///     if err.is_recoverable() { "skipped" } else { "aborted" }
/// }
///
/// let err = ScanError::config("no collectors");
/// assert_eq!(describe(&err), "aborted");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// None of the configured scan directories exist.
    #[error("the scanned directory does not exist: {}", display_paths(.paths))]
    DirectoryNotExist {
        /// The configured paths, none of which is a directory.
        paths: Vec<Utf8PathBuf>,
    },

    /// A cache file exists but could not be read or decoded.
    #[error("failed to read cache {path}: {source}")]
    CacheRead {
        /// The cache file.
        path: Utf8PathBuf,
        /// The underlying I/O or decoding error.
        #[source]
        source: io::Error,
    },

    /// A cache file could not be written.
    #[error("failed to write cache {path}: {source}")]
    CacheWrite {
        /// The cache file.
        path: Utf8PathBuf,
        /// The underlying I/O or encoding error.
        #[source]
        source: io::Error,
    },

    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to read a source file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse a source file.
    #[error("failed to parse file {path}: {source}")]
    Parse {
        /// The file that couldn't be parsed.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: ds_ts_parser::ParseError,
    },

    /// A collector failed to encode or decode its state.
    #[error("collector '{id}' failed: {source}")]
    Collector {
        /// The collector identifier.
        id: String,
        /// The underlying error.
        #[source]
        source: CollectorError,
    },

    /// The configuration names a collector that is not registered.
    #[error("collector '{0}' is not registered")]
    UnknownCollector(String),

    /// Invalid scanner configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

fn display_paths(paths: &[Utf8PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Parse`] error.
    #[inline]
    pub fn parse(path: impl Into<Utf8PathBuf>, source: ds_ts_parser::ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::CacheRead`] error.
    #[inline]
    pub fn cache_read(path: impl Into<Utf8PathBuf>, source: impl Into<io::Error>) -> Self {
        Self::CacheRead {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Creates a new [`ScanError::CacheWrite`] error.
    #[inline]
    pub fn cache_write(path: impl Into<Utf8PathBuf>, source: impl Into<io::Error>) -> Self {
        Self::CacheWrite {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Creates a new [`ScanError::Collector`] error.
    #[inline]
    pub fn collector(id: impl Into<String>, source: CollectorError) -> Self {
        Self::Collector {
            id: id.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error is recoverable (scanning can continue).
    ///
    /// Unreadable files are skipped and an unreadable cache is a cache miss.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Parse { .. } | Self::CacheRead { .. }
        )
    }

    /// Returns `true` if this error is fatal (scanning should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::CacheRead { path, .. }
            | Self::CacheWrite { path, .. } => Some(path),
            Self::DirectoryNotExist { .. }
            | Self::Walk(_)
            | Self::Collector { .. }
            | Self::UnknownCollector(_)
            | Self::Config(_)
            | Self::NonUtf8Path(_) => None,
        }
    }
}
