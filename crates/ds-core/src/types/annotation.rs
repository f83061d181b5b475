//! Declarative metadata items attached to classes and members.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use super::location::SourceLocation;

/// Decorator list of a single declaration.
///
/// Most declarations carry one or two decorators, so these stay inline.
pub type Annotations = SmallVec<[Annotation; 2]>;

/// A decorator found on a class, property, or method.
///
/// The `name` is the decorator expression without the `@` and without the
/// call arguments, e.g. `Route` for `@Route("/users")` or `Http.Get` for
/// `@Http.Get()`. Arguments are lifted to JSON values; expressions that are
/// not literals are kept as their source text.
///
/// # Examples
///
/// ```
/// use ds_core::{Annotation, SourceLocation};
/// use serde_json::json;
///
/// let route = Annotation::new("Route", vec![json!("/users")], SourceLocation::new(1, 0));
/// assert_eq!(route.first_argument(), Some(&json!("/users")));
/// assert_eq!(route.payload(), json!("/users"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Decorator name, e.g. `Injectable`.
    pub name: String,

    /// Call arguments; empty for bare decorators such as `@Injectable`.
    pub arguments: Vec<Value>,

    /// Position of the `@` in the source file.
    pub location: SourceLocation,
}

impl Annotation {
    /// Creates a new annotation.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Vec<Value>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            arguments,
            location,
        }
    }

    /// Returns the first call argument, if any.
    #[inline]
    #[must_use]
    pub fn first_argument(&self) -> Option<&Value> {
        self.arguments.first()
    }

    /// Collapses the arguments into one value for storage.
    ///
    /// No arguments become `null`, a single argument is stored as-is, and
    /// several arguments become an array.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self.arguments.as_slice() {
            [] => Value::Null,
            [single] => single.clone(),
            many => Value::Array(many.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shapes() {
        let loc = SourceLocation::new(1, 0);
        assert_eq!(Annotation::new("Injectable", vec![], loc).payload(), Value::Null);
        assert_eq!(
            Annotation::new("Value", vec![json!("db.host")], loc).payload(),
            json!("db.host")
        );
        assert_eq!(
            Annotation::new("Route", vec![json!("/a"), json!({"method": "GET"})], loc).payload(),
            json!(["/a", {"method": "GET"}])
        );
    }

    #[test]
    fn test_first_argument_empty() {
        let annotation = Annotation::new("Inject", vec![], SourceLocation::default());
        assert!(annotation.first_argument().is_none());
    }
}
