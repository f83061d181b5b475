//! Class declarations discovered in source files.
//!
//! [`ClassStructure`] is the static stand-in for a reflection handle: the
//! class's own decorators plus every declared property and method with
//! theirs. [`ClassRecord`] pins a structure to the file it came from.

use camino::{Utf8Path, Utf8PathBuf};

use super::annotation::Annotations;
use super::location::SourceLocation;

/// Unique name of a class; the primary key of discovery, collection, and
/// caching.
pub type ClassIdentity = String;

/// A property or method declared in a class body.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    /// Member name as written (`#secret` keeps its `#`).
    pub name: String,

    /// Decorators attached to the member, in source order.
    pub annotations: Annotations,
}

impl MemberRecord {
    /// Creates a member without decorators.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Annotations::new(),
        }
    }
}

/// Structural view of one class declaration.
///
/// # Examples
///
/// ```
/// use ds_core::{ClassStructure, MemberRecord, SourceLocation};
///
/// let mut class = ClassStructure::new("UserController", SourceLocation::new(4, 0));
/// class.methods.push(MemberRecord::new("index"));
///
/// assert!(!class.has_annotations());
/// assert_eq!(class.methods.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClassStructure {
    /// Class name.
    pub name: ClassIdentity,

    /// Decorators on the class declaration (including those written before
    /// `export`).
    pub annotations: Annotations,

    /// Declared fields, in source order.
    pub properties: Vec<MemberRecord>,

    /// Declared methods (including the constructor and accessors), in
    /// source order.
    pub methods: Vec<MemberRecord>,

    /// Position of the class declaration.
    pub location: SourceLocation,
}

impl ClassStructure {
    /// Creates an empty class structure.
    #[must_use]
    pub fn new(name: impl Into<ClassIdentity>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            annotations: Annotations::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            location,
        }
    }

    /// Returns `true` if the class or any member carries a decorator.
    #[must_use]
    pub fn has_annotations(&self) -> bool {
        !self.annotations.is_empty()
            || self
                .properties
                .iter()
                .chain(&self.methods)
                .any(|m| !m.annotations.is_empty())
    }

    /// Total number of decorators on the class and its members.
    #[must_use]
    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
            + self
                .properties
                .iter()
                .chain(&self.methods)
                .map(|m| m.annotations.len())
                .sum::<usize>()
    }
}

/// A class discovered during a scan, with its origin.
///
/// Built fresh on every discovery pass and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
    /// File declaring the class.
    pub path: Utf8PathBuf,

    /// Last modification time of `path`, in seconds since the Unix epoch.
    pub modified: u64,

    /// The class declaration itself.
    pub structure: ClassStructure,
}

impl ClassRecord {
    /// Creates a record for a class found in `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, modified: u64, structure: ClassStructure) -> Self {
        Self {
            path: path.into(),
            modified,
            structure,
        }
    }

    /// The class identity.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.structure.name
    }

    /// The declaring file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns `true` if the file changed at or after `timestamp`.
    ///
    /// The comparison is inclusive: a file written in the same second as the
    /// previous cache is treated as changed.
    #[inline]
    #[must_use]
    pub const fn is_stale(&self, timestamp: u64) -> bool {
        self.modified >= timestamp
    }
}
