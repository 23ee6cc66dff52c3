//! Request building with presence tracking.
//!
//! A [`RequestBuilder`] turns named, optionally-present [`Inputs`] into a
//! [`BuiltRequest`] according to an operation's parameter schema:
//!
//! - Absent inputs are omitted from the request, never defaulted.
//! - A required input that is absent, or empty when the parameter does not
//!   allow empty values, fails with
//!   [`OperationError::MissingRequiredField`].
//! - A nested structure is materialized only when at least one of its leaves
//!   is present. Its required leaves are enforced only when it is.
//! - Scalars are coerced to their declared type.
//!
//! Nested leaves are addressed with dotted paths.
//!
//! # Examples
//!
//! ```rust
//! use aws_operations::builders::{Inputs, RequestBuilder};
//! use aws_operations::model::OperationRegistry;
//! use serde_json::json;
//!
//! let registry = OperationRegistry::builtin();
//! let op = registry.resolve("ELB:ConfigureHealthCheck").unwrap();
//!
//! let inputs = Inputs::new()
//!     .with("LoadBalancerName", "web")
//!     .with("HealthCheck.Target", "HTTP:80/ping")
//!     .with("HealthCheck.Interval", "30")
//!     .with("HealthCheck.Timeout", 5)
//!     .with("HealthCheck.HealthyThreshold", 3)
//!     .with("HealthCheck.UnhealthyThreshold", 2);
//!
//! let built = RequestBuilder::new(op).build(&inputs).unwrap();
//! assert_eq!(built.member("HealthCheck").unwrap()["Interval"], json!(30));
//! ```

mod coerce;
mod object_builder;

pub use coerce::{coerce_scalar, parse_timestamp};
pub use object_builder::ObjectBuilder;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{OperationError, OperationResult};
use crate::model::{OperationDescriptor, ParamSpec, Shape, TimestampFormat};

/// Named, optionally-present inputs for one invocation.
///
/// Keys are parameter names or dotted paths into nested structures. A
/// `null` value counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inputs {
    values: BTreeMap<String, Value>,
}

impl Inputs {
    /// Create an empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an input, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Set an input, collecting repeated names into a list.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        match self.values.entry(name.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                match existing {
                    Value::Array(items) => items.push(value),
                    _ => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                }
            }
        }
    }

    /// Parse a `Name=Value` assignment.
    ///
    /// Values that parse as a JSON object or array are taken as JSON;
    /// anything else is a string.
    ///
    /// ```rust
    /// use aws_operations::builders::Inputs;
    /// use serde_json::json;
    ///
    /// let (name, value) = Inputs::parse_assignment(r#"Subnets=["subnet-1","subnet-2"]"#).unwrap();
    /// assert_eq!(name, "Subnets");
    /// assert_eq!(value, json!(["subnet-1", "subnet-2"]));
    ///
    /// let (_, value) = Inputs::parse_assignment("PageSize=20").unwrap();
    /// assert_eq!(value, json!("20"));
    /// ```
    pub fn parse_assignment(arg: &str) -> OperationResult<(String, Value)> {
        let (name, raw) = arg
            .split_once('=')
            .ok_or_else(|| OperationError::invalid_parameter(arg, "expected Name=Value"))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(OperationError::invalid_parameter(arg, "parameter name is empty"));
        }

        let trimmed = raw.trim_start();
        let value = if trimmed.starts_with('{') || trimmed.starts_with('[') {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        } else {
            Value::String(raw.to_string())
        };

        Ok((name.to_string(), value))
    }

    /// Get an input by its exact key.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Look up the value supplied for a parameter path.
    ///
    /// Dotted leaves are assembled into an object, and a path into a
    /// structure supplied as a whole object resolves into it.
    ///
    /// # Errors
    ///
    /// [`OperationError::InvalidParameter`] if the same path is supplied
    /// both as a value and as a structure, or more than once.
    pub fn lookup(&self, path: &[String]) -> OperationResult<Option<Value>> {
        let mut tree = Map::new();
        for (key, value) in &self.values {
            if value.is_null() {
                continue;
            }
            let segments: Vec<&str> = key.split('.').collect();
            insert_path(&mut tree, &segments, value.clone())
                .map_err(|message| OperationError::invalid_parameter(key.as_str(), message))?;
        }
        Ok(walk(&tree, path))
    }

    /// Remove an input.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Returns true if no input is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate inputs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Inputs
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut inputs = Inputs::new();
        for (k, v) in iter {
            inputs.set(k, v);
        }
        inputs
    }
}

/// A request built from inputs, ready for protocol encoding.
///
/// `members` holds only the parameters that were present, coerced and
/// nested. The original inputs are kept for selector echoes, together with
/// their nested form as checked by the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRequest {
    operation: String,
    members: Map<String, Value>,
    inputs: Inputs,
    input_tree: Map<String, Value>,
}

impl BuiltRequest {
    /// Qualified operation name.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Present members keyed by parameter name.
    pub fn members(&self) -> &Map<String, Value> {
        &self.members
    }

    /// A single member.
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    /// Set a member, as pagination does for the continuation token.
    pub fn set_member(&mut self, name: impl Into<String>, value: Value) {
        self.members.insert(name.into(), value);
    }

    /// Set a member, builder style.
    pub fn with_member(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_member(name, value);
        self
    }

    /// Remove a member.
    pub fn take_member(&mut self, name: &str) -> Option<Value> {
        self.members.remove(name)
    }

    /// The inputs the request was built from.
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// The value supplied for a parameter path.
    pub fn input(&self, path: &[String]) -> Option<Value> {
        walk(&self.input_tree, path)
    }
}

/// Builds requests for one operation.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    descriptor: &'a OperationDescriptor,
    format: TimestampFormat,
}

impl<'a> RequestBuilder<'a> {
    /// Create a builder for an operation.
    pub fn new(descriptor: &'a OperationDescriptor) -> Self {
        Self {
            descriptor,
            format: descriptor.protocol().timestamp_format(),
        }
    }

    /// Build a request from inputs.
    ///
    /// # Errors
    ///
    /// - [`OperationError::MissingRequiredField`] for an absent or empty
    ///   required parameter
    /// - [`OperationError::InvalidParameter`] for an unknown parameter or a
    ///   value that cannot be coerced
    pub fn build(&self, inputs: &Inputs) -> OperationResult<BuiltRequest> {
        let input_tree = self.input_tree(inputs)?;
        let mut tree = input_tree.clone();

        let mut members = ObjectBuilder::new();
        for spec in &self.descriptor.params {
            let value = self.build_member(spec, tree.remove(&spec.name), &spec.name)?;
            members = members.set(spec.name.clone(), value);
        }

        let members = members.into_map();
        trace!(
            operation = %self.descriptor.name,
            members = ?members.keys().collect::<Vec<_>>(),
            "Built request"
        );

        Ok(BuiltRequest {
            operation: self.descriptor.qualified_name(),
            members,
            inputs: inputs.clone(),
            input_tree,
        })
    }

    /// Nest dotted inputs under their top-level parameter.
    fn input_tree(&self, inputs: &Inputs) -> OperationResult<Map<String, Value>> {
        let mut tree = Map::new();

        for (key, value) in inputs.iter() {
            let segments: Vec<&str> = key.split('.').collect();
            if segments.iter().any(|s| s.is_empty()) {
                return Err(OperationError::invalid_parameter(key.as_str(), "malformed parameter path"));
            }
            if self.descriptor.param_spec(segments[0]).is_none() {
                return Err(OperationError::invalid_parameter(
                    key.as_str(),
                    format!("not a parameter of {}", self.descriptor.name),
                ));
            }
            if value.is_null() {
                continue;
            }
            insert_path(&mut tree, &segments, value.clone())
                .map_err(|message| OperationError::invalid_parameter(key.as_str(), message))?;
        }

        Ok(tree)
    }

    fn build_member(&self, spec: &ParamSpec, value: Option<Value>, path: &str) -> OperationResult<Option<Value>> {
        let built = match value {
            None | Some(Value::Null) => None,
            Some(value) => self.build_value(spec, value, path)?,
        };

        match built {
            None if spec.required => Err(OperationError::missing_field(path)),
            other => Ok(other),
        }
    }

    fn build_value(&self, spec: &ParamSpec, value: Value, path: &str) -> OperationResult<Option<Value>> {
        if spec.required && !spec.allow_empty && is_empty_value(&value) {
            return Err(OperationError::missing_field(path));
        }
        self.build_shape(&spec.shape, value, path)
    }

    fn build_shape(&self, shape: &Shape, value: Value, path: &str) -> OperationResult<Option<Value>> {
        match shape {
            Shape::Scalar(ty) => coerce_scalar(*ty, value, path, self.format).map(Some),

            Shape::List(item_shape) => {
                let items = match value {
                    Value::Array(items) => items,
                    single => vec![single],
                };

                let mut built = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    if item.is_null() {
                        return Err(OperationError::invalid_parameter(item_path, "list items cannot be null"));
                    }
                    match self.build_shape(item_shape, item, &item_path)? {
                        Some(v) => built.push(v),
                        None => {
                            return Err(OperationError::invalid_parameter(item_path, "list item has no fields set"));
                        }
                    }
                }
                Ok(Some(Value::Array(built)))
            }

            Shape::Map(value_shape) => {
                let entries = match value {
                    Value::Object(entries) => entries,
                    other => {
                        return Err(OperationError::invalid_parameter(path, format!("expected a map, got {}", other)));
                    }
                };

                let mut built = Map::new();
                for (key, entry) in entries {
                    if entry.is_null() {
                        continue;
                    }
                    let entry_path = format!("{}.{}", path, key);
                    if let Some(v) = self.build_shape(value_shape, entry, &entry_path)? {
                        built.insert(key, v);
                    }
                }
                Ok(Some(Value::Object(built)))
            }

            Shape::Structure(members) => {
                let mut fields = match value {
                    Value::Object(fields) => fields,
                    other => {
                        return Err(OperationError::invalid_parameter(
                            path,
                            format!("expected an object, got {}", other),
                        ));
                    }
                };

                let mut object = ObjectBuilder::new();
                let mut first_missing = None;
                for member in members {
                    let member_path = format!("{}.{}", path, member.name);
                    let built = match fields.remove(&member.name) {
                        None | Some(Value::Null) => None,
                        Some(v) => self.build_value(member, v, &member_path)?,
                    };
                    if built.is_none() && member.required && first_missing.is_none() {
                        first_missing = Some(member_path);
                    }
                    object = object.set(member.name.clone(), built);
                }

                if let Some(unknown) = fields.keys().next() {
                    return Err(OperationError::invalid_parameter(
                        format!("{}.{}", path, unknown),
                        format!("not a member of {}", path),
                    ));
                }

                // No leaf present: the whole sub-object is omitted.
                if object.is_empty() {
                    return Ok(None);
                }
                if let Some(missing) = first_missing {
                    return Err(OperationError::missing_field(missing));
                }
                Ok(object.finish())
            }
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn walk(tree: &Map<String, Value>, path: &[String]) -> Option<Value> {
    let (first, rest) = path.split_first()?;
    let mut current = tree.get(first.as_str())?;
    for segment in rest {
        current = current.get(segment.as_str())?;
    }
    Some(current.clone())
}

/// Insert `value` at a dotted path, merging objects.
fn insert_path(tree: &mut Map<String, Value>, segments: &[&str], value: Value) -> Result<(), String> {
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut current = tree;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match slot {
            Value::Object(map) => map,
            _ => return Err(format!("'{}' was supplied both as a value and as a structure", segment)),
        };
    }

    if !current.contains_key(*last) {
        current.insert(last.to_string(), value);
        return Ok(());
    }

    match (current.get_mut(*last), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                if existing.contains_key(&k) {
                    return Err(format!("'{}.{}' was supplied more than once", last, k));
                }
                existing.insert(k, v);
            }
            Ok(())
        }
        _ => Err(format!("'{}' was supplied more than once", last)),
    }
}
