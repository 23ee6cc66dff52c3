//! Mapping of wire-level failures to [`OperationError`] variants.
//!
//! This module handles:
//!
//! - Parsing AWS error bodies in both JSON (`Json`/`RestJson` protocols) and
//!   XML (`Query` protocol) form
//! - Building [`OperationError::ServiceFailure`] from an error response
//! - Building [`OperationError::TransportFailure`] from a transport error,
//!   re-wrapping name resolution failures with a clarified message
//!
//! # Error Response Formats
//!
//! JSON protocols:
//!
//! ```json
//! {
//!   "__type": "com.amazonaws.mediatailor#BadRequestException",
//!   "message": "Channel already exists"
//! }
//! ```
//!
//! Query protocol:
//!
//! ```xml
//! <ErrorResponse>
//!   <Error>
//!     <Type>Sender</Type>
//!     <Code>LoadBalancerNotFound</Code>
//!     <Message>There is no ACTIVE Load Balancer named 'web'</Message>
//!   </Error>
//!   <RequestId>5f8c1e4e-0000-0000-0000-000000000000</RequestId>
//! </ErrorResponse>
//! ```

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use super::OperationError;
use crate::model::Protocol;

/// Parsed AWS error body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceErrorBody {
    /// The AWS error code, with any namespace prefix stripped.
    #[serde(default, alias = "__type", alias = "Type", alias = "code", alias = "Code")]
    pub error_type: String,

    /// Human-readable error message.
    #[serde(default, alias = "Message")]
    pub message: String,

    /// AWS request ID.
    #[serde(
        default,
        alias = "requestId",
        alias = "RequestId",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_id: Option<String>,
}

/// Parse a JSON error body.
///
/// The namespace prefix of the error type
/// (`com.amazonaws.mediatailor#BadRequestException`) is stripped.
///
/// ```rust
/// use aws_operations::error::parse_json_error;
///
/// let body = parse_json_error(br#"{"__type": "svc#ThrottlingException", "message": "slow down"}"#).unwrap();
/// assert_eq!(body.error_type, "ThrottlingException");
/// assert_eq!(body.message, "slow down");
/// ```
pub fn parse_json_error(body: &[u8]) -> Result<ServiceErrorBody, OperationError> {
    let mut parsed: ServiceErrorBody = serde_json::from_slice(body)?;
    parsed.error_type = strip_namespace(&parsed.error_type);
    Ok(parsed)
}

/// Parse a Query-protocol XML error body.
pub fn parse_xml_error(body: &str) -> Result<ServiceErrorBody, OperationError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut parsed = ServiceErrorBody::default();
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current_element = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current_element.as_str() {
                    "Code" => parsed.error_type = text,
                    "Message" => parsed.message = text,
                    "RequestId" | "RequestID" => parsed.request_id = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current_element.clear(),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(OperationError::Serialization {
                    message: format!("Failed to parse XML error response: {}", e),
                });
            }
            _ => {}
        }
    }

    Ok(parsed)
}

/// Build a [`OperationError::ServiceFailure`] from an error response.
///
/// The body is parsed according to the protocol. When the body carries no
/// error code, the `x-amzn-ErrorType` header is used; when neither is
/// available the code is `UnknownError`. `headers` must have lowercase keys.
pub fn service_failure(
    status: u16,
    headers: &HashMap<String, String>,
    body: &[u8],
    protocol: Protocol,
) -> OperationError {
    let parsed = match protocol {
        Protocol::Query => parse_xml_error(&String::from_utf8_lossy(body)).ok(),
        Protocol::Json | Protocol::RestJson => parse_json_error(body).ok(),
    }
    .unwrap_or_default();

    let code = if !parsed.error_type.is_empty() {
        parsed.error_type
    } else if let Some(header) = headers.get("x-amzn-errortype") {
        // Header format: "BadRequestException:http://internal.amazon.com/..."
        header.split(':').next().unwrap_or(header).to_string()
    } else {
        "UnknownError".to_string()
    };

    let message = if !parsed.message.is_empty() {
        parsed.message
    } else {
        let text = String::from_utf8_lossy(body).trim().to_string();
        if text.is_empty() {
            http::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            text
        }
    };

    let request_id = parsed.request_id.or_else(|| {
        headers
            .get("x-amzn-requestid")
            .or_else(|| headers.get("x-amz-request-id"))
            .cloned()
    });

    OperationError::ServiceFailure {
        code,
        message,
        status,
        request_id,
    }
}

/// Build a [`OperationError::TransportFailure`] from a transport error.
///
/// A name resolution failure is re-wrapped with a message naming the region
/// and endpoint, since the usual cause is a mistyped region or endpoint.
pub fn transport_failure<E>(err: E, region: &str, endpoint: &str) -> OperationError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = if is_name_resolution_failure(&err) {
        format!(
            "Name resolution failure attempting to reach service in region '{}' at {}. \
             Check that the region and endpoint settings are correct ({})",
            region, endpoint, err
        )
    } else {
        err.to_string()
    };

    OperationError::TransportFailure {
        message,
        source: Some(Box::new(err)),
    }
}

/// Returns true if the error, or any error in its source chain, reports a
/// failure to resolve a host name.
pub fn is_name_resolution_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    const MARKERS: &[&str] = &[
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "no such host",
        "nodename nor servname",
        "temporary failure in name resolution",
    ];

    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if MARKERS.iter().any(|marker| text.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}

fn strip_namespace(error_type: &str) -> String {
    match error_type.rfind('#') {
        Some(pos) => error_type[pos + 1..].to_string(),
        None => error_type.to_string(),
    }
}
