//! Response projection.
//!
//! A [`Selector`] names the part of each response surfaced to the caller:
//!
//! | Form          | Meaning                                         |
//! |---------------|-------------------------------------------------|
//! | `*`           | the whole response                              |
//! | `Field.Sub`   | a field path; lists are emitted item by item    |
//! | `^Param`      | the value the caller supplied for a parameter   |
//!
//! Selectors are parsed and validated against the operation descriptor
//! before any request is sent.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::builders::BuiltRequest;
use crate::error::{OperationError, OperationResult};
use crate::model::OperationDescriptor;

/// Which part of a response to surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `*`
    Response,
    /// A dotted response field path.
    Field(Vec<String>),
    /// `^` followed by a dotted parameter path.
    Parameter(Vec<String>),
}

impl Selector {
    /// Parse a selector without validating it against an operation.
    ///
    /// ```rust
    /// use aws_operations::projection::Selector;
    ///
    /// assert_eq!(Selector::parse("*").unwrap(), Selector::Response);
    /// assert_eq!(
    ///     Selector::parse("^LoadBalancerName").unwrap(),
    ///     Selector::Parameter(vec!["LoadBalancerName".to_string()])
    /// );
    /// assert!(Selector::parse("Items..Name").is_err());
    /// ```
    pub fn parse(selector: &str) -> OperationResult<Self> {
        let trimmed = selector.trim();
        if trimmed == "*" {
            return Ok(Selector::Response);
        }

        let (is_parameter, path) = match trimmed.strip_prefix('^') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        if path.is_empty() {
            return Err(OperationError::invalid_selector(selector, "selector is empty"));
        }

        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
            return Err(OperationError::invalid_selector(
                selector,
                format!("'{}' is not a valid path segment", bad),
            ));
        }

        Ok(if is_parameter {
            Selector::Parameter(segments)
        } else {
            Selector::Field(segments)
        })
    }

    /// Parse the caller's selector, or the operation's default, and
    /// validate it.
    pub fn resolve(selector: Option<&str>, descriptor: &OperationDescriptor) -> OperationResult<Self> {
        let raw = selector
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(descriptor.default_selector.as_deref())
            .unwrap_or("*");
        let parsed = Self::parse(raw)?;
        parsed.validate(descriptor)?;
        Ok(parsed)
    }

    /// Check that the selector resolves for an operation.
    ///
    /// A field path must start at a declared response field. A parameter
    /// path must name a parameter, descending only through structures.
    pub fn validate(&self, descriptor: &OperationDescriptor) -> OperationResult<()> {
        match self {
            Selector::Response => Ok(()),
            Selector::Field(path) => {
                let first = &path[0];
                if descriptor.response_fields.iter().any(|f| f == first) {
                    Ok(())
                } else {
                    Err(OperationError::invalid_selector(
                        self.to_string(),
                        format!(
                            "'{}' is not a response field of {} (expected one of: {})",
                            first,
                            descriptor.name,
                            descriptor.response_fields.join(", ")
                        ),
                    ))
                }
            }
            Selector::Parameter(path) => {
                if descriptor.param_path(path).is_some() {
                    Ok(())
                } else {
                    Err(OperationError::invalid_selector(
                        self.to_string(),
                        format!("'{}' is not a parameter of {}", path.join("."), descriptor.name),
                    ))
                }
            }
        }
    }
}

impl FromStr for Selector {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Response => write!(f, "*"),
            Selector::Field(path) => write!(f, "{}", path.join(".")),
            Selector::Parameter(path) => write!(f, "^{}", path.join(".")),
        }
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Applies a validated selector to responses.
#[derive(Debug, Clone)]
pub struct Projector {
    selector: Selector,
}

impl Projector {
    /// Create a projector.
    pub fn new(selector: Selector) -> Self {
        Self { selector }
    }

    /// The selector in use.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Values to emit for one response.
    ///
    /// Lists are emitted item by item and null or missing values emit
    /// nothing.
    ///
    /// Values are emitted as decoded. Query-protocol (XML) responses carry
    /// no types, so their leaves are strings: `HealthCheck.Interval` is
    /// `"30"` there, while JSON protocols return `30`.
    ///
    /// ```rust
    /// use aws_operations::builders::{Inputs, RequestBuilder};
    /// use aws_operations::model::OperationRegistry;
    /// use aws_operations::projection::{Projector, Selector};
    /// use serde_json::json;
    ///
    /// let registry = OperationRegistry::builtin();
    /// let op = registry.resolve("MediaTailor:ListChannels").unwrap();
    /// let request = RequestBuilder::new(op).build(&Inputs::new()).unwrap();
    ///
    /// let projector = Projector::new(Selector::resolve(None, op).unwrap());
    /// let response = json!({"Items": [{"ChannelName": "a"}, {"ChannelName": "b"}], "NextToken": "t"});
    /// assert_eq!(
    ///     projector.project(&response, &request),
    ///     vec![json!({"ChannelName": "a"}), json!({"ChannelName": "b"})]
    /// );
    /// ```
    pub fn project(&self, response: &Value, request: &BuiltRequest) -> Vec<Value> {
        let selected = match &self.selector {
            Selector::Response => return vec![response.clone()],
            Selector::Field(path) => extract_path(response, path),
            Selector::Parameter(path) => request.input(path).unwrap_or(Value::Null),
        };

        match selected {
            Value::Null => Vec::new(),
            Value::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
            other => vec![other],
        }
    }
}

/// Follow a field path, mapping over lists met on the way.
fn extract_path(value: &Value, path: &[String]) -> Value {
    let Some((first, rest)) = path.split_first() else {
        return value.clone();
    };

    match value {
        Value::Object(map) => map
            .get(first.as_str())
            .map(|v| extract_path(v, rest))
            .unwrap_or(Value::Null),
        Value::Array(items) => {
            let mut results = Vec::new();
            for item in items {
                match extract_path(item, path) {
                    Value::Null => {}
                    Value::Array(inner) => results.extend(inner),
                    other => results.push(other),
                }
            }
            if results.is_empty() {
                Value::Null
            } else {
                Value::Array(results)
            }
        }
        _ => Value::Null,
    }
}
