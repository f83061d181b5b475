//! Dispatch of discovered decorators to their handlers.
//!
//! The [`AnnotationReader`] walks one [`ClassRecord`] and hands each
//! decorator to the [`AnnotationHandler`] registered under its name. Only
//! decorators with a registered handler are collectible; all others are
//! ignored.

use camino::Utf8Path;
use ds_core::{Annotation, ClassRecord, FxHashMap, ScanConfig};
use tracing::{debug, trace, warn};

use crate::annotations::AnnotationCollector;
use crate::collector::CollectorRegistry;

/// Collection hooks of a decorator.
///
/// Every hook defaults to a no-op, so a handler only implements the
/// positions it supports.
pub trait AnnotationHandler: Send + Sync {
    /// Called for a decorator on the class declaration.
    fn collect_class(
        &self,
        _annotation: &Annotation,
        _class: &str,
        _registry: &mut CollectorRegistry,
    ) {
    }

    /// Called for a decorator on a property.
    fn collect_property(
        &self,
        _annotation: &Annotation,
        _class: &str,
        _property: &str,
        _registry: &mut CollectorRegistry,
    ) {
    }

    /// Called for a decorator on a method.
    fn collect_method(
        &self,
        _annotation: &Annotation,
        _class: &str,
        _method: &str,
        _registry: &mut CollectorRegistry,
    ) {
    }
}

/// Records a decorator's arguments into an [`AnnotationCollector`] at every
/// position it appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordAnnotation {
    collector: String,
}

impl RecordAnnotation {
    /// Records into the collector with the given id.
    #[must_use]
    pub fn new(collector: impl Into<String>) -> Self {
        Self {
            collector: collector.into(),
        }
    }

    /// The target collector id.
    #[must_use]
    pub fn collector(&self) -> &str {
        &self.collector
    }

    fn target<'r>(
        &self,
        registry: &'r mut CollectorRegistry,
    ) -> Option<&'r mut AnnotationCollector> {
        let target = registry.get_mut::<AnnotationCollector>(&self.collector);
        if target.is_none() {
            warn!(collector = %self.collector, "Recording target is not an annotation collector");
        }
        target
    }
}

impl AnnotationHandler for RecordAnnotation {
    fn collect_class(
        &self,
        annotation: &Annotation,
        class: &str,
        registry: &mut CollectorRegistry,
    ) {
        if let Some(target) = self.target(registry) {
            target.collect_class(class, &annotation.name, annotation.payload());
        }
    }

    fn collect_property(
        &self,
        annotation: &Annotation,
        class: &str,
        property: &str,
        registry: &mut CollectorRegistry,
    ) {
        if let Some(target) = self.target(registry) {
            target.collect_property(class, property, &annotation.name, annotation.payload());
        }
    }

    fn collect_method(
        &self,
        annotation: &Annotation,
        class: &str,
        method: &str,
        registry: &mut CollectorRegistry,
    ) {
        if let Some(target) = self.target(registry) {
            target.collect_method(class, method, &annotation.name, annotation.payload());
        }
    }
}

/// What [`AnnotationReader::collect`] did with a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// The class was read; `dispatched` decorators reached a handler.
    Collected {
        /// Number of handler calls made.
        dispatched: usize,
    },
    /// The class map pins this class to another file.
    Shadowed,
}

/// Reads the decorators of discovered classes into collectors.
///
/// # Examples
///
/// ```
/// use ds_scanner::{AnnotationReader, RecordAnnotation};
///
/// let reader = AnnotationReader::new()
///     .with_handler("Controller", RecordAnnotation::new("routes"))
///     .with_handler("Get", RecordAnnotation::new("routes"));
///
/// assert!(reader.has_handler("Get"));
/// assert!(!reader.has_handler("Injectable"));
/// ```
#[derive(Default)]
pub struct AnnotationReader {
    handlers: FxHashMap<String, Box<dyn AnnotationHandler>>,
}

impl AnnotationReader {
    /// Creates a reader without handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for decorators named `name`.
    #[must_use]
    pub fn with_handler(
        mut self,
        name: impl Into<String>,
        handler: impl AnnotationHandler + 'static,
    ) -> Self {
        self.register(name, handler);
        self
    }

    /// Registers a handler, replacing any previous one for the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: impl AnnotationHandler + 'static) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    /// Returns `true` if decorators named `name` are collectible.
    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Hands every decorator of `record` to its handler.
    ///
    /// Class decorators are dispatched first, then property decorators,
    /// then method decorators, each in source order.
    pub fn collect(
        &self,
        record: &ClassRecord,
        config: &ScanConfig,
        registry: &mut CollectorRegistry,
    ) -> CollectOutcome {
        let class = record.name();

        if let Some(authoritative) = config.authoritative_path(class) {
            if !same_file(record.path(), authoritative) {
                debug!(
                    class,
                    path = %record.path(),
                    authoritative = %authoritative,
                    "Skipping class replaced through the class map"
                );
                return CollectOutcome::Shadowed;
            }
        }

        let structure = &record.structure;
        let mut dispatched = 0;

        for annotation in &structure.annotations {
            if let Some(handler) = self.handler_for(annotation, config) {
                handler.collect_class(annotation, class, registry);
                dispatched += 1;
            }
        }

        for property in &structure.properties {
            for annotation in &property.annotations {
                if let Some(handler) = self.handler_for(annotation, config) {
                    handler.collect_property(annotation, class, &property.name, registry);
                    dispatched += 1;
                }
            }
        }

        for method in &structure.methods {
            for annotation in &method.annotations {
                if let Some(handler) = self.handler_for(annotation, config) {
                    handler.collect_method(annotation, class, &method.name, registry);
                    dispatched += 1;
                }
            }
        }

        trace!(class, dispatched, "Collected class");
        CollectOutcome::Collected { dispatched }
    }

    fn handler_for(
        &self,
        annotation: &Annotation,
        config: &ScanConfig,
    ) -> Option<&dyn AnnotationHandler> {
        if config.is_ignored_annotation(&annotation.name) {
            return None;
        }
        self.handlers.get(&annotation.name).map(|handler| &**handler)
    }
}

impl std::fmt::Debug for AnnotationReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("AnnotationReader")
            .field("handlers", &names)
            .finish()
    }
}

/// Compares two paths, resolving them on disk when possible.
/// Compares two paths literally, then canonicalized.
pub(crate) fn same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize_utf8(), b.canonicalize_utf8()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use camino::Utf8PathBuf;
    use ds_core::{ClassStructure, MemberRecord, SourceLocation};
    use serde_json::json;

    use super::*;

    fn annotation(name: &str, args: Vec<serde_json::Value>) -> Annotation {
        Annotation::new(name, args, SourceLocation::new(1, 0))
    }

    fn controller_record(path: &str) -> ClassRecord {
        let mut class = ClassStructure::new("UserController", SourceLocation::new(1, 0));
        class.annotations.push(annotation("Controller", vec![json!("/users")]));
        class.annotations.push(annotation("Deprecated", vec![]));

        let mut users = MemberRecord::new("users");
        users.annotations.push(annotation("Inject", vec![]));
        class.properties.push(users);

        let mut show = MemberRecord::new("show");
        show.annotations.push(annotation("Get", vec![json!("/:id"), json!({"cache": 60})]));
        class.methods.push(show);

        ClassRecord::new(path, 0, class)
    }

    fn routes_registry() -> CollectorRegistry {
        let mut registry = CollectorRegistry::new();
        registry.register(AnnotationCollector::new("routes"));
        registry
    }

    fn record_all(reader: AnnotationReader) -> AnnotationReader {
        ["Controller", "Deprecated", "Inject", "Get"]
            .into_iter()
            .fold(reader, |reader, name| {
                reader.with_handler(name, RecordAnnotation::new("routes"))
            })
    }

    #[test]
    fn test_collect_all_positions() {
        let reader = record_all(AnnotationReader::new());
        let mut registry = routes_registry();
        let config = ScanConfig::default();

        let outcome = reader.collect(&controller_record("src/user.ts"), &config, &mut registry);
        assert_eq!(outcome, CollectOutcome::Collected { dispatched: 4 });

        let routes = registry.get::<AnnotationCollector>("routes").unwrap();
        assert_eq!(routes.class_annotation("UserController", "Controller"), Some(&json!("/users")));
        assert_eq!(
            routes.property_annotations("UserController", "users").unwrap().get("Inject"),
            Some(&serde_json::Value::Null)
        );
        let gets = routes.methods_by_annotation("Get");
        assert_eq!(gets[0].value, &json!(["/:id", {"cache": 60}]));
    }

    #[test]
    fn test_unhandled_and_ignored_annotations_are_skipped() {
        let reader = AnnotationReader::new()
            .with_handler("Controller", RecordAnnotation::new("routes"))
            .with_handler("Deprecated", RecordAnnotation::new("routes"));
        let mut registry = routes_registry();
        let config = ScanConfig::default().with_ignore_annotations(&["Deprecated"]);

        let outcome = reader.collect(&controller_record("src/user.ts"), &config, &mut registry);
        assert_eq!(outcome, CollectOutcome::Collected { dispatched: 1 });

        let routes = registry.get::<AnnotationCollector>("routes").unwrap();
        let meta = routes.get("UserController").unwrap();
        assert_eq!(meta.class.keys().collect::<Vec<_>>(), ["Controller"]);
        assert!(meta.properties.is_empty());
        assert!(meta.methods.is_empty());
    }

    #[test]
    fn test_shadowed_class_is_skipped() {
        let reader = record_all(AnnotationReader::new());
        let mut registry = routes_registry();
        let config = ScanConfig::default()
            .with_class_map_entry("UserController", Utf8Path::new("overrides/user.ts"));

        let outcome = reader.collect(&controller_record("src/user.ts"), &config, &mut registry);
        assert_eq!(outcome, CollectOutcome::Shadowed);
        assert!(registry.get::<AnnotationCollector>("routes").unwrap().is_empty());

        let outcome =
            reader.collect(&controller_record("overrides/user.ts"), &config, &mut registry);
        assert!(matches!(outcome, CollectOutcome::Collected { .. }));
    }

    #[test]
    fn test_same_file_resolves_relative_segments() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::create_dir(root.join("src")).unwrap();
        std::fs::write(root.join("src/a.ts"), "").unwrap();

        assert!(same_file(&root.join("src/a.ts"), &root.join("src/../src/a.ts")));
        assert!(!same_file(&root.join("src/a.ts"), &root.join("src/b.ts")));
    }

    /// Implements only the method hook.
    struct MethodSpy {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl AnnotationHandler for MethodSpy {
        fn collect_method(
            &self,
            annotation: &Annotation,
            class: &str,
            method: &str,
            _registry: &mut CollectorRegistry,
        ) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{class}::{method}@{}", annotation.name));
        }
    }

    #[test]
    fn test_missing_hooks_are_no_ops() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reader = ["Controller", "Inject", "Get"]
            .into_iter()
            .fold(AnnotationReader::new(), |reader, name| {
                reader.with_handler(name, MethodSpy { seen: Arc::clone(&seen) })
            });
        let mut registry = CollectorRegistry::new();

        reader.collect(&controller_record("src/user.ts"), &ScanConfig::default(), &mut registry);

        assert_eq!(*seen.lock().unwrap(), ["UserController::show@Get"]);
    }

    #[test]
    fn test_record_into_missing_collector_is_harmless() {
        let reader =
            AnnotationReader::new().with_handler("Controller", RecordAnnotation::new("nope"));
        let mut registry = routes_registry();

        let outcome = reader.collect(
            &controller_record("src/user.ts"),
            &ScanConfig::default(),
            &mut registry,
        );
        assert_eq!(outcome, CollectOutcome::Collected { dispatched: 1 });
        assert!(registry.get::<AnnotationCollector>("routes").unwrap().is_empty());
    }

    #[test]
    fn test_debug_lists_handlers() {
        let reader = AnnotationReader::new().with_handler("Get", RecordAnnotation::new("routes"));
        assert_eq!(reader.len(), 1);
        assert!(format!("{reader:?}").contains("Get"));
    }
}
