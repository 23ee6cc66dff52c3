//! Error types for AWS operation invocations.
//!
//! Errors fall into two groups:
//!
//! - **Build-time errors** ([`OperationError::MissingRequiredField`],
//!   [`OperationError::InvalidParameter`], [`OperationError::InvalidSelector`],
//!   [`OperationError::UnknownOperation`]) are raised while the request is being
//!   assembled and always before any network call is made.
//! - **Run-time errors** ([`OperationError::TransportFailure`],
//!   [`OperationError::ServiceFailure`], [`OperationError::Cancelled`]) stop a
//!   pagination run at the page that failed. Pages emitted before the failure
//!   stay emitted.
//!
//! Nothing in this crate retries a failed call.
//!
//! # Examples
//!
//! ```rust
//! use aws_operations::error::OperationError;
//!
//! fn describe(error: &OperationError) {
//!     if error.is_build_error() {
//!         println!("nothing was sent: {}", error);
//!     } else if let Some(code) = error.error_code() {
//!         println!("service rejected the call with {}", code);
//!     }
//! }
//! ```

mod mapping;

pub use mapping::{
    is_name_resolution_failure, parse_json_error, parse_xml_error, service_failure,
    transport_failure, ServiceErrorBody,
};

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for operation invocations.
pub type OperationResult<T> = Result<T, OperationError>;

/// Top-level error type for descriptor-driven operation invocations.
#[derive(Debug, Error)]
pub enum OperationError {
    /// A required input was absent (or empty where empty is not allowed).
    #[error("Missing required field: {field}")]
    MissingRequiredField {
        /// Parameter path, e.g. `LoadBalancerName` or `HealthCheck.Target`.
        field: String,
    },

    /// An input could not be coerced to its declared type, or is not a
    /// parameter of the operation.
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter {
        /// Parameter path.
        parameter: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The output selector does not resolve to a response field, a request
    /// parameter or the whole-response wildcard.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The selector as supplied.
        selector: String,
        /// Why it does not resolve.
        reason: String,
    },

    /// No descriptor is registered under the requested name.
    #[error("Unknown operation: {name}")]
    UnknownOperation {
        /// The requested operation name.
        name: String,
    },

    /// A bare operation name matched descriptors in more than one service.
    #[error("Ambiguous operation '{name}', qualify it with one of: {}", .candidates.join(", "))]
    AmbiguousOperation {
        /// The requested operation name.
        name: String,
        /// Qualified names that matched.
        candidates: Vec<String>,
    },

    /// The underlying call failed before a service response was received.
    ///
    /// Name resolution failures are reported here with a message naming the
    /// region and endpoint that could not be resolved.
    #[error("Transport error: {message}")]
    TransportFailure {
        /// Description of the failure.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote service returned an error response.
    #[error("Service error: {code} - {message}")]
    ServiceFailure {
        /// AWS error code (e.g. `LoadBalancerNotFound`).
        code: String,
        /// Error message from the service.
        message: String,
        /// HTTP status of the response.
        status: u16,
        /// AWS request ID, when the service returned one.
        request_id: Option<String>,
    },

    /// A request or response body could not be (de)serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },

    /// The client is misconfigured.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The run was cancelled. Pages completed before cancellation were
    /// already emitted.
    #[error("Operation cancelled after {pages_completed} page(s)")]
    Cancelled {
        /// Number of pages fully fetched and emitted.
        pages_completed: usize,
    },
}

impl OperationError {
    /// Create a missing required field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an invalid selector error.
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error was raised before any network call.
    ///
    /// ```rust
    /// use aws_operations::error::OperationError;
    ///
    /// assert!(OperationError::missing_field("LoadBalancerName").is_build_error());
    /// assert!(!OperationError::Cancelled { pages_completed: 2 }.is_build_error());
    /// ```
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            OperationError::MissingRequiredField { .. }
                | OperationError::InvalidParameter { .. }
                | OperationError::InvalidSelector { .. }
                | OperationError::UnknownOperation { .. }
                | OperationError::AmbiguousOperation { .. }
        )
    }

    /// Returns the AWS error code for service failures.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            OperationError::ServiceFailure { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Returns the AWS request ID for service failures.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            OperationError::ServiceFailure { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Returns the HTTP status for service failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            OperationError::ServiceFailure { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for OperationError {
    fn from(err: serde_json::Error) -> Self {
        OperationError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for OperationError {
    fn from(err: ConfigError) -> Self {
        OperationError::Configuration {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
