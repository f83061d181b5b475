//! Domain types describing discovered classes and their annotations.
//!
//! - [`annotation`] - A single decorator attached to a class or member
//! - [`class`] - The structural handle of a class and its discovery record
//! - [`location`] - Source code locations
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use ds_core::{Annotation, ClassRecord, ClassStructure, MemberRecord};
//! ```

mod annotation;
mod class;
mod location;

pub use annotation::{Annotation, Annotations};
pub use class::{ClassIdentity, ClassRecord, ClassStructure, MemberRecord};
pub use location::SourceLocation;
