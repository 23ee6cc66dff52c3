//! Presence-tracking object builder.

use serde_json::{Map, Value};

/// Builds a JSON object from optional fields.
///
/// Absent fields are skipped rather than written as defaults, and
/// [`finish`](ObjectBuilder::finish) yields `None` when no field was set, so a
/// sub-object with no leaves disappears from the request entirely.
///
/// ```rust
/// use aws_operations::builders::ObjectBuilder;
/// use serde_json::json;
///
/// let empty = ObjectBuilder::new().set("Interval", None).finish();
/// assert_eq!(empty, None);
///
/// let health_check = ObjectBuilder::new()
///     .set("Interval", Some(json!(30)))
///     .set("Timeout", None)
///     .finish();
/// assert_eq!(health_check, Some(json!({"Interval": 30})));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectBuilder {
    fields: Map<String, Value>,
}

impl ObjectBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field if a value is present.
    pub fn set(mut self, name: impl Into<String>, value: Option<Value>) -> Self {
        if let Some(value) = value {
            self.fields.insert(name.into(), value);
        }
        self
    }

    /// Set a field unconditionally.
    pub fn field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, Some(value.into()))
    }

    /// Returns true if the named field was set.
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns true if no field was set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The object, or `None` if no field was set.
    pub fn finish(self) -> Option<Value> {
        if self.fields.is_empty() {
            None
        } else {
            Some(Value::Object(self.fields))
        }
    }

    /// The fields as a map, empty or not.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_are_skipped() {
        let builder = ObjectBuilder::new()
            .set("SourceLocationName", Some(json!("slate")))
            .set("VodSourceName", None);

        assert!(builder.has("SourceLocationName"));
        assert!(!builder.has("VodSourceName"));
        assert_eq!(builder.finish(), Some(json!({"SourceLocationName": "slate"})));
    }

    #[test]
    fn test_empty_builder_finishes_to_none() {
        let builder = ObjectBuilder::new().set("A", None).set("B", None);
        assert!(builder.is_empty());
        assert_eq!(builder.finish(), None);
    }

    #[test]
    fn test_into_map_keeps_empty_object() {
        let map = ObjectBuilder::new().into_map();
        assert!(map.is_empty());

        let map = ObjectBuilder::new().field("Tier", "BASIC").into_map();
        assert_eq!(map.get("Tier"), Some(&json!("BASIC")));
    }
}
