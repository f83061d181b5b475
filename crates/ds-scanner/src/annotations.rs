//! The general-purpose annotation collector.
//!
//! [`AnnotationCollector`] is the standard accumulator of a DI container:
//! for every class it remembers which decorators were found on the class,
//! on each property, and on each method, together with their arguments.

use std::any::Any;
use std::collections::BTreeMap;

use ds_core::ClassIdentity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collector::MetadataCollector;
use crate::error::CollectorError;

/// Decorator name to its recorded arguments.
pub type AnnotationValues = BTreeMap<String, Value>;

/// Everything recorded for one class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// Decorators on the class itself.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub class: AnnotationValues,

    /// Decorators per property name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, AnnotationValues>,

    /// Decorators per method name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, AnnotationValues>,
}

/// A method decorator match returned by
/// [`AnnotationCollector::methods_by_annotation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodAnnotation<'a> {
    /// Declaring class.
    pub class: &'a str,
    /// Method name.
    pub method: &'a str,
    /// Recorded arguments.
    pub value: &'a Value,
}

/// Collects decorator arguments per class, property, and method.
///
/// A decorator recorded twice at the same position keeps the last value.
///
/// # Examples
///
/// ```
/// use ds_scanner::AnnotationCollector;
/// use serde_json::json;
///
/// let mut routes = AnnotationCollector::new("routes");
/// routes.collect_class("UserController", "Controller", json!("/users"));
/// routes.collect_method("UserController", "show", "Get", json!("/:id"));
///
/// assert_eq!(routes.class_annotation("UserController", "Controller"), Some(&json!("/users")));
/// assert_eq!(routes.methods_by_annotation("Get").len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationCollector {
    id: String,
    classes: BTreeMap<ClassIdentity, ClassMetadata>,
}

impl AnnotationCollector {
    /// Creates an empty collector with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            classes: BTreeMap::new(),
        }
    }

    /// Records a class-level decorator.
    pub fn collect_class(&mut self, class: &str, annotation: &str, value: Value) {
        self.entry(class).class.insert(annotation.to_owned(), value);
    }

    /// Records a property decorator.
    pub fn collect_property(
        &mut self,
        class: &str,
        property: &str,
        annotation: &str,
        value: Value,
    ) {
        self.entry(class)
            .properties
            .entry(property.to_owned())
            .or_default()
            .insert(annotation.to_owned(), value);
    }

    /// Records a method decorator.
    pub fn collect_method(&mut self, class: &str, method: &str, annotation: &str, value: Value) {
        self.entry(class)
            .methods
            .entry(method.to_owned())
            .or_default()
            .insert(annotation.to_owned(), value);
    }

    fn entry(&mut self, class: &str) -> &mut ClassMetadata {
        self.classes.entry(class.to_owned()).or_default()
    }

    /// Everything recorded for `class`.
    #[must_use]
    pub fn get(&self, class: &str) -> Option<&ClassMetadata> {
        self.classes.get(class)
    }

    /// Arguments of a class-level decorator.
    #[must_use]
    pub fn class_annotation(&self, class: &str, annotation: &str) -> Option<&Value> {
        self.classes.get(class)?.class.get(annotation)
    }

    /// Classes carrying a class-level decorator, sorted by class name.
    pub fn classes_by_annotation<'a>(
        &'a self,
        annotation: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.classes.iter().filter_map(move |(class, meta)| {
            meta.class
                .get(annotation)
                .map(|value| (class.as_str(), value))
        })
    }

    /// Decorators recorded on one property.
    #[must_use]
    pub fn property_annotations(&self, class: &str, property: &str) -> Option<&AnnotationValues> {
        self.classes.get(class)?.properties.get(property)
    }

    /// Every method carrying a decorator, sorted by class then method.
    #[must_use]
    pub fn methods_by_annotation(&self, annotation: &str) -> Vec<MethodAnnotation<'_>> {
        self.classes
            .iter()
            .flat_map(|(class, meta)| {
                meta.methods.iter().filter_map(move |(method, values)| {
                    values.get(annotation).map(|value| MethodAnnotation {
                        class: class.as_str(),
                        method: method.as_str(),
                        value,
                    })
                })
            })
            .collect()
    }

    /// Names of all classes with recorded metadata.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Number of classes with recorded metadata.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl MetadataCollector for AnnotationCollector {
    fn id(&self) -> &str {
        &self.id
    }

    fn clear(&mut self, class: &str) {
        self.classes.remove(class);
    }

    fn reset(&mut self) {
        self.classes.clear();
    }

    fn serialize(&self) -> Result<Vec<u8>, CollectorError> {
        Ok(serde_json::to_vec(&self.classes)?)
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<(), CollectorError> {
        self.classes = serde_json::from_slice(bytes)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
