//! Source positions of declarations and decorators.

use serde::{Deserialize, Serialize};

/// A position within a source file.
///
/// `line` is 1-indexed, `column` is a 0-indexed byte column.
///
/// # Examples
///
/// ```
/// use ds_core::SourceLocation;
///
/// let loc = SourceLocation::new(3, 4);
/// assert_eq!(loc.to_string(), "3:4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed).
    pub line: u32,

    /// Column number (0-indexed, UTF-8 byte offset within the line).
    pub column: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    #[inline]
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_ordering() {
        assert!(SourceLocation::new(1, 9) < SourceLocation::new(2, 0));
        assert!(SourceLocation::new(2, 1) > SourceLocation::new(2, 0));
    }

    #[test]
    fn test_source_location_default() {
        assert_eq!(SourceLocation::default(), SourceLocation::new(0, 0));
    }
}
