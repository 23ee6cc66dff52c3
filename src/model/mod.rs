//! Declarative operation descriptors.
//!
//! Every AWS operation is described by an [`OperationDescriptor`]: the
//! service it belongs to, how it binds to HTTP, its parameter schema, the
//! fields its response carries, the default selector and, for list
//! operations, how it paginates. One generic engine consumes descriptors;
//! there is no per-operation code.
//!
//! # Example
//!
//! ```rust
//! use aws_operations::model::{OperationDescriptor, ParamSpec, Protocol, ServiceDescriptor};
//!
//! let service = ServiceDescriptor::new("Widgets", "widgets", Protocol::Json)
//!     .with_target_prefix("Widgets_20240101");
//!
//! let op = OperationDescriptor::new(service, "DescribeWidget")
//!     .param(ParamSpec::string("WidgetId").required())
//!     .response_fields(["Widget"])
//!     .default_selector("Widget");
//!
//! assert_eq!(op.qualified_name(), "Widgets:DescribeWidget");
//! ```

mod registry;

pub use registry::OperationRegistry;

use serde::{Deserialize, Serialize};

use crate::error::{OperationError, OperationResult};
use crate::http::HttpMethod;
use crate::projection::Selector;

/// Wire protocol spoken by a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Form-encoded POST, XML response.
    Query,
    /// JSON 1.1 POST with an `X-Amz-Target` header.
    Json,
    /// REST bindings with a JSON body.
    RestJson,
}

impl Protocol {
    /// How timestamp parameters are rendered on the wire.
    pub fn timestamp_format(&self) -> TimestampFormat {
        match self {
            Protocol::Query => TimestampFormat::Iso8601,
            Protocol::Json | Protocol::RestJson => TimestampFormat::EpochSeconds,
        }
    }
}

/// Wire format for timestamp values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Seconds since the Unix epoch, as a JSON number.
    EpochSeconds,
    /// ISO-8601 / RFC 3339 in UTC, e.g. `2024-01-01T00:00:00Z`.
    Iso8601,
}

/// Identity and protocol of an AWS service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service name used to qualify operation names (e.g. `ELB`).
    pub name: String,
    /// Endpoint prefix (e.g. `elasticloadbalancing`).
    pub endpoint_prefix: String,
    /// Wire protocol.
    pub protocol: Protocol,
    /// API version, sent as `Version` by the Query protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// `X-Amz-Target` prefix for the JSON protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_prefix: Option<String>,
}

impl ServiceDescriptor {
    /// Create a service descriptor.
    pub fn new(name: impl Into<String>, endpoint_prefix: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            name: name.into(),
            endpoint_prefix: endpoint_prefix.into(),
            protocol,
            api_version: None,
            target_prefix: None,
        }
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set the JSON target prefix.
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = Some(prefix.into());
        self
    }
}

/// Scalar parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// UTF-8 string.
    String,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    /// Double-precision float.
    Double,
    /// `true` / `false`.
    Boolean,
    /// Point in time; wire format depends on the protocol.
    Timestamp,
}

/// Shape of a parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "lowercase")]
pub enum Shape {
    /// A single scalar value.
    Scalar(ScalarType),
    /// A list of values of the inner shape.
    List(Box<Shape>),
    /// A string-keyed map of values of the inner shape.
    Map(Box<Shape>),
    /// A sub-object with its own member schema.
    Structure(Vec<ParamSpec>),
}

/// Where a parameter is placed in the HTTP request.
///
/// Only REST protocols honor non-body locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "in", content = "name", rename_all = "lowercase")]
pub enum Location {
    /// Serialized into the request body.
    #[default]
    Body,
    /// Fills the URI label of the same name.
    Path,
    /// Sent as the named query string parameter.
    Query(String),
    /// Sent as the named header.
    Header(String),
}

/// Schema of one request parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Member name as it appears in the API.
    pub name: String,
    /// Value shape.
    pub shape: Shape,
    /// Must be present.
    #[serde(default)]
    pub required: bool,
    /// An empty string, list or map counts as present.
    #[serde(default)]
    pub allow_empty: bool,
    /// HTTP placement.
    #[serde(default)]
    pub location: Location,
    /// JSON body key, when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_name: Option<String>,
}

impl ParamSpec {
    /// Create an optional body parameter of the given shape.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            required: false,
            allow_empty: false,
            location: Location::Body,
            serialized_name: None,
        }
    }

    /// A string parameter.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, Shape::Scalar(ScalarType::String))
    }

    /// An integer parameter.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, Shape::Scalar(ScalarType::Integer))
    }

    /// A long parameter.
    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name, Shape::Scalar(ScalarType::Long))
    }

    /// A boolean parameter.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, Shape::Scalar(ScalarType::Boolean))
    }

    /// A timestamp parameter.
    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, Shape::Scalar(ScalarType::Timestamp))
    }

    /// A list of strings.
    pub fn string_list(name: impl Into<String>) -> Self {
        Self::new(name, Shape::List(Box::new(Shape::Scalar(ScalarType::String))))
    }

    /// A list of the given shape.
    pub fn list(name: impl Into<String>, item: Shape) -> Self {
        Self::new(name, Shape::List(Box::new(item)))
    }

    /// A string-keyed map of strings.
    pub fn string_map(name: impl Into<String>) -> Self {
        Self::new(name, Shape::Map(Box::new(Shape::Scalar(ScalarType::String))))
    }

    /// A nested structure.
    pub fn structure(name: impl Into<String>, members: Vec<ParamSpec>) -> Self {
        Self::new(name, Shape::Structure(members))
    }

    /// Mark the parameter required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Accept empty values for a required parameter.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Bind the parameter to the URI label of the same name.
    pub fn in_path(mut self) -> Self {
        self.location = Location::Path;
        self
    }

    /// Bind the parameter to a query string parameter.
    pub fn in_query(mut self, name: impl Into<String>) -> Self {
        self.location = Location::Query(name.into());
        self
    }

    /// Bind the parameter to a header.
    pub fn in_header(mut self, name: impl Into<String>) -> Self {
        self.location = Location::Header(name.into());
        self
    }

    /// Use a different key in JSON bodies.
    pub fn serialized_as(mut self, name: impl Into<String>) -> Self {
        self.serialized_name = Some(name.into());
        self
    }

    /// Key used when the parameter is written to a JSON body.
    pub fn wire_name(&self) -> &str {
        self.serialized_name.as_deref().unwrap_or(&self.name)
    }

    /// Member spec of a structure parameter.
    pub fn member(&self, name: &str) -> Option<&ParamSpec> {
        match &self.shape {
            Shape::Structure(members) => members.iter().find(|m| m.name == name),
            _ => None,
        }
    }
}

/// HTTP method and URI template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpBinding {
    /// HTTP method.
    pub method: HttpMethod,
    /// URI template with `{Label}` / `{Label+}` placeholders.
    pub uri: String,
}

impl Default for HttpBinding {
    fn default() -> Self {
        Self {
            method: HttpMethod::POST,
            uri: "/".to_string(),
        }
    }
}

/// How a list operation paginates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationDescriptor {
    /// Request parameter carrying the continuation token.
    pub input_token: String,
    /// Response field carrying the next continuation token.
    pub output_token: String,
    /// Request parameter carrying the page-size hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,
    /// Response field holding the page's items.
    pub items: String,
}

impl PaginationDescriptor {
    /// Create a pagination descriptor without a page-size parameter.
    pub fn new(input_token: impl Into<String>, output_token: impl Into<String>, items: impl Into<String>) -> Self {
        Self {
            input_token: input_token.into(),
            output_token: output_token.into(),
            page_size: None,
            items: items.into(),
        }
    }

    /// Set the page-size parameter.
    pub fn with_page_size(mut self, param: impl Into<String>) -> Self {
        self.page_size = Some(param.into());
        self
    }
}

/// Impact level of an operation, used by the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ConfirmImpact {
    /// Read-only.
    #[default]
    None,
    /// Mutating, low impact.
    Low,
    /// Mutating, medium impact.
    Medium,
    /// Mutating and destructive.
    High,
}

/// Complete description of one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Owning service.
    pub service: ServiceDescriptor,
    /// Operation name (e.g. `DescribeLoadBalancers`).
    pub name: String,
    /// HTTP binding; `POST /` when absent.
    #[serde(default)]
    pub http: HttpBinding,
    /// Parameter schema, in wire order.
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    /// Top-level fields of the (unwrapped) response.
    #[serde(default)]
    pub response_fields: Vec<String>,
    /// Selector used when the caller supplies none. `*` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_selector: Option<String>,
    /// Set for list operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationDescriptor>,
    /// Impact level for the confirmation gate.
    #[serde(default)]
    pub confirm_impact: ConfirmImpact,
}

impl OperationDescriptor {
    /// Create a descriptor bound to `POST /` with no parameters.
    pub fn new(service: ServiceDescriptor, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
            http: HttpBinding::default(),
            params: Vec::new(),
            response_fields: Vec::new(),
            default_selector: None,
            pagination: None,
            confirm_impact: ConfirmImpact::None,
        }
    }

    /// Set the HTTP binding.
    pub fn http(mut self, method: HttpMethod, uri: impl Into<String>) -> Self {
        self.http = HttpBinding {
            method,
            uri: uri.into(),
        };
        self
    }

    /// Add a parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Declare the response's top-level fields.
    pub fn response_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.response_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default selector.
    pub fn default_selector(mut self, selector: impl Into<String>) -> Self {
        self.default_selector = Some(selector.into());
        self
    }

    /// Mark the operation as paginated.
    pub fn paginated(mut self, pagination: PaginationDescriptor) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Set the impact level.
    pub fn confirm_impact(mut self, impact: ConfirmImpact) -> Self {
        self.confirm_impact = impact;
        self
    }

    /// `Service:Operation`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.service.name, self.name)
    }

    /// Look up a top-level parameter.
    pub fn param_spec(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Look up a parameter by dotted path through nested structures.
    pub fn param_path(&self, path: &[String]) -> Option<&ParamSpec> {
        let (first, rest) = path.split_first()?;
        let mut spec = self.param_spec(first)?;
        for segment in rest {
            spec = spec.member(segment)?;
        }
        Some(spec)
    }

    /// True if the operation changes server-side state.
    pub fn is_mutating(&self) -> bool {
        self.confirm_impact != ConfirmImpact::None
    }

    /// Protocol of the owning service.
    pub fn protocol(&self) -> Protocol {
        self.service.protocol
    }

    /// Check that the descriptor is consistent with itself.
    ///
    /// Pagination must name declared parameters and response fields, the
    /// default selector must resolve, and every URI label must be bound to a
    /// required path parameter. A continuation token that no parameter
    /// carries would resend the first request forever.
    ///
    /// # Errors
    ///
    /// [`OperationError::Configuration`] describing the first inconsistency.
    pub fn validate(&self) -> OperationResult<()> {
        let invalid = |message: String| OperationError::Configuration {
            message: format!("Invalid descriptor {}: {}", self.qualified_name(), message),
            source: None,
        };

        if let Some(pagination) = &self.pagination {
            if self.param_spec(&pagination.input_token).is_none() {
                return Err(invalid(format!(
                    "pagination input token '{}' is not a parameter",
                    pagination.input_token
                )));
            }
            if let Some(page_size) = &pagination.page_size {
                if self.param_spec(page_size).is_none() {
                    return Err(invalid(format!("page size '{}' is not a parameter", page_size)));
                }
            }
            for field in [&pagination.output_token, &pagination.items] {
                if !self.response_fields.contains(field) {
                    return Err(invalid(format!("pagination field '{}' is not a response field", field)));
                }
            }
        }

        Selector::resolve(None, self).map_err(|e| invalid(format!("default selector: {}", e)))?;

        for label in uri_labels(&self.http.uri)? {
            match self.param_spec(label) {
                Some(spec) if spec.location == Location::Path && spec.required => {}
                _ => {
                    return Err(invalid(format!(
                        "URI label '{}' is not bound to a required path parameter",
                        label
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Label names in a URI template, without the greedy `+` marker.
fn uri_labels(template: &str) -> OperationResult<Vec<&str>> {
    let mut labels = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| OperationError::Configuration {
            message: format!("Unterminated label in URI template '{}'", template),
            source: None,
        })?;
        let label = &after[..end];
        labels.push(label.strip_suffix('+').unwrap_or(label));
        rest = &after[end + 1..];
    }
    Ok(labels)
}
