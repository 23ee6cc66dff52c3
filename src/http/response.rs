//! HTTP response handling for AWS operation calls.

use http::StatusCode;
use std::collections::HashMap;

use crate::error::{OperationError, OperationResult};

/// A raw response from an AWS service, before protocol decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    status: StatusCode,

    /// Response headers, keys lowercased
    headers: HashMap<String, String>,

    /// Response body
    body: Vec<u8>,

    /// AWS request ID (from x-amzn-RequestId header)
    request_id: Option<String>,
}

impl RawResponse {
    /// Create a new response.
    ///
    /// Header names are lowercased.
    ///
    /// ```rust
    /// use aws_operations::http::RawResponse;
    /// use http::StatusCode;
    /// use std::collections::HashMap;
    ///
    /// let mut headers = HashMap::new();
    /// headers.insert("X-Amzn-RequestId".to_string(), "abc-123".to_string());
    ///
    /// let response = RawResponse::new(StatusCode::OK, headers, b"{}".to_vec());
    /// assert_eq!(response.request_id(), Some("abc-123"));
    /// ```
    pub fn new(status: StatusCode, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        let request_id = headers
            .get("x-amzn-requestid")
            .or_else(|| headers.get("x-amzn-request-id"))
            .or_else(|| headers.get("x-amz-request-id"))
            .cloned();

        Self {
            status,
            headers,
            body,
            request_id,
        }
    }

    /// Create a response from a reqwest Response.
    pub async fn from_reqwest(response: reqwest::Response) -> OperationResult<Self> {
        let status = response.status();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), value_str.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| OperationError::TransportFailure {
                message: format!("Failed to read response body: {}", e),
                source: Some(Box::new(e)),
            })?
            .to_vec();

        Ok(Self::new(status, headers, body))
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Get all headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Get the response body as bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Get the response body as a UTF-8 string.
    pub fn body_string(&self) -> OperationResult<&str> {
        std::str::from_utf8(&self.body).map_err(|e| OperationError::Serialization {
            message: format!("Response body is not valid UTF-8: {}", e),
        })
    }

    /// Get the AWS request ID.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
