//! Core types, errors, and configuration for the di-scan metadata scanner.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`ScanConfig`] and [`Config`], loaded from JSON
//! - [`ConfigError`] for configuration failures
//! - Domain types describing a discovered class ([`ClassRecord`],
//!   [`ClassStructure`], [`Annotation`])
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std for string keys)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ScanConfig};
pub use error::ConfigError;
pub use types::{
    Annotation, Annotations, ClassIdentity, ClassRecord, ClassStructure, MemberRecord,
    SourceLocation,
};

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;
