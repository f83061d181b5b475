//! Error types for the ds-core crate.
//!
//! This module provides the [`ConfigError`] type for failures while loading
//! or validating a scan configuration.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use ds_core::ConfigError;
///
/// let error = ConfigError::invalid_option("record.Route", "unknown collector 'routes'");
/// assert!(error.to_string().contains("record.Route"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`Config`](crate::Config).
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_display() {
        let error = ConfigError::Io {
            path: Utf8PathBuf::from("/etc/di-scan.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = error.to_string();
        assert!(msg.contains("/etc/di-scan.json"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::invalid_option("collectors", "duplicate id 'routes'");
        let msg = error.to_string();
        assert!(msg.contains("collectors"));
        assert!(msg.contains("duplicate id 'routes'"));
    }

    #[test]
    fn test_parse_from_serde() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = ConfigError::from(source);
        assert!(error.to_string().starts_with("failed to parse configuration"));
    }
}
