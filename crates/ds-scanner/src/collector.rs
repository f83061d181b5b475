//! Named metadata accumulators and the registry that owns them.
//!
//! A [`MetadataCollector`] gathers per-class metadata during collection and
//! can dump and reload its whole state as bytes. The scan cache stores
//! those bytes keyed by collector id, so a later process can restore the
//! metadata of classes it does not re-collect.

use std::any::Any;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{CollectorError, ScanError};

/// Serialized collector states keyed by collector id.
pub type CollectorSnapshot = BTreeMap<String, Vec<u8>>;

/// A named, independently serializable metadata accumulator.
///
/// Implementations must round-trip: after `deserialize(&serialize()?)` the
/// collector answers every query exactly as before.
pub trait MetadataCollector: Any + Send {
    /// Identifier used as the key in the scan cache.
    fn id(&self) -> &str;

    /// Forgets everything recorded for `class`.
    fn clear(&mut self, class: &str);

    /// Drops all state, as if freshly constructed.
    fn reset(&mut self);

    /// Encodes the whole state.
    fn serialize(&self) -> Result<Vec<u8>, CollectorError>;

    /// Replaces the whole state with a previously encoded one.
    ///
    /// On error the current state is left untouched.
    fn deserialize(&mut self, bytes: &[u8]) -> Result<(), CollectorError>;

    /// Upcast for typed registry access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed registry access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Owns every collector available to a scan, keyed by id.
///
/// # Examples
///
/// ```
/// use ds_scanner::{AnnotationCollector, CollectorRegistry};
///
/// let mut registry = CollectorRegistry::new();
/// registry.register(AnnotationCollector::new("routes"));
///
/// assert!(registry.contains("routes"));
/// assert!(registry.get::<AnnotationCollector>("routes").is_some());
/// ```
#[derive(Default)]
pub struct CollectorRegistry {
    collectors: BTreeMap<String, Box<dyn MetadataCollector>>,
}

impl CollectorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collector, returning the one it replaced.
    pub fn register<C: MetadataCollector>(
        &mut self,
        collector: C,
    ) -> Option<Box<dyn MetadataCollector>> {
        self.collectors
            .insert(collector.id().to_owned(), Box::new(collector))
    }

    /// Returns `true` if a collector with this id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.collectors.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.collectors.keys().map(String::as_str)
    }

    /// Number of registered collectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Returns the collector with this id as a trait object.
    #[must_use]
    pub fn collector(&self, id: &str) -> Option<&dyn MetadataCollector> {
        self.collectors.get(id).map(|collector| &**collector)
    }

    /// Returns the collector with this id if it is a `T`.
    #[must_use]
    pub fn get<T: MetadataCollector>(&self, id: &str) -> Option<&T> {
        self.collectors.get(id)?.as_any().downcast_ref()
    }

    /// Returns the collector with this id mutably if it is a `T`.
    pub fn get_mut<T: MetadataCollector>(&mut self, id: &str) -> Option<&mut T> {
        self.collectors.get_mut(id)?.as_any_mut().downcast_mut()
    }

    /// Seeds active collectors from a cached snapshot.
    ///
    /// Snapshot entries for inactive or unregistered collectors are ignored,
    /// and active collectors missing from the snapshot keep their state. A
    /// collector that cannot decode its entry is left as it was.
    ///
    /// Returns the number of collectors restored.
    pub fn restore_all(&mut self, snapshot: &CollectorSnapshot, active: &[String]) -> usize {
        let mut restored = 0;

        for id in active {
            let (Some(bytes), Some(collector)) = (snapshot.get(id), self.collectors.get_mut(id))
            else {
                continue;
            };

            match collector.deserialize(bytes) {
                Ok(()) => restored += 1,
                Err(source) => {
                    let err = ScanError::collector(id.as_str(), source);
                    warn!(error = %err, "Ignoring cached collector state");
                }
            }
        }

        debug!(restored, "Restored collectors from snapshot");
        restored
    }

    /// Serializes every active collector.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::UnknownCollector`] for an active id that is not
    /// registered, or [`ScanError::Collector`] if encoding fails.
    pub fn snapshot_all(&self, active: &[String]) -> Result<CollectorSnapshot, ScanError> {
        active
            .iter()
            .map(|id| -> Result<(String, Vec<u8>), ScanError> {
                let collector = self
                    .collectors
                    .get(id)
                    .ok_or_else(|| ScanError::UnknownCollector(id.clone()))?;
                let bytes = collector
                    .serialize()
                    .map_err(|source| ScanError::collector(id.as_str(), source))?;
                Ok((id.clone(), bytes))
            })
            .collect()
    }

    /// Clears `class` from every active collector.
    pub fn clear_class(&mut self, class: &str, active: &[String]) {
        for id in active {
            if let Some(collector) = self.collectors.get_mut(id) {
                collector.clear(class);
            }
        }
    }

    /// Resets every registered collector to its empty state.
    pub fn reset(&mut self) {
        for collector in self.collectors.values_mut() {
            collector.reset();
        }
    }
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.collectors.keys().collect::<Vec<_>>())
            .finish()
    }
}
