//! HTTP request types for AWS operation calls.
//!
//! An [`OperationRequest`] is the protocol-encoded form of a built request:
//! method, path, query, headers and body. It is endpoint-agnostic; the
//! transport joins it with the resolved service endpoint.

use http::HeaderMap;
use percent_encoding::utf8_percent_encode;
use serde::{Deserialize, Serialize};

use crate::error::{OperationError, OperationResult};
use crate::protocol::URI_ENCODE_SET;

/// HTTP methods used by AWS operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET request
    GET,
    /// POST request
    POST,
    /// PUT request
    PUT,
    /// DELETE request
    DELETE,
    /// PATCH request
    PATCH,
}

impl HttpMethod {
    /// The method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
        }
    }
}

/// A protocol-encoded request for one operation call.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    /// HTTP method
    method: HttpMethod,

    /// Request path, already label-expanded (e.g., "/channel/live")
    path: String,

    /// Query parameters, unencoded
    query_params: Vec<(String, String)>,

    /// HTTP headers
    headers: HeaderMap,

    /// Request body (if any)
    body: Option<Vec<u8>>,

    /// Content type
    content_type: Option<String>,
}

impl OperationRequest {
    /// Create a new request with the specified method.
    ///
    /// ```rust
    /// use aws_operations::http::{HttpMethod, OperationRequest};
    ///
    /// let request = OperationRequest::new(HttpMethod::GET, "/channels");
    /// assert_eq!(request.path(), "/channels");
    /// ```
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            content_type: None,
        }
    }

    /// Create a new POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::POST, path)
    }

    /// Add a query parameter to the request.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> OperationResult<Self> {
        let header_name = http::header::HeaderName::from_bytes(key.as_ref().as_bytes())
            .map_err(|e| OperationError::invalid_parameter(key.as_ref(), format!("Invalid header name: {}", e)))?;

        let header_value = http::header::HeaderValue::from_str(value.as_ref())
            .map_err(|e| OperationError::invalid_parameter(key.as_ref(), format!("Invalid header value: {}", e)))?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Set the request body as raw bytes with a content type.
    pub fn body(mut self, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type.into());
        self
    }

    /// Get the HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Get the request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the query parameters.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// Get the value of the first query parameter with the given name.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get mutable access to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the request body.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Get the content type.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Build the full URL for this request.
    ///
    /// Query keys and values are percent-encoded.
    ///
    /// ```rust
    /// use aws_operations::http::{HttpMethod, OperationRequest};
    ///
    /// let request = OperationRequest::new(HttpMethod::GET, "/channels")
    ///     .query("maxResults", "10")
    ///     .query("nextToken", "a/b");
    ///
    /// let url = request.build_url("https://api.mediatailor.us-east-1.amazonaws.com");
    /// assert_eq!(
    ///     url,
    ///     "https://api.mediatailor.us-east-1.amazonaws.com/channels?maxResults=10&nextToken=a%2Fb"
    /// );
    /// ```
    pub fn build_url(&self, endpoint: &str) -> String {
        let mut url = format!("{}{}", endpoint.trim_end_matches('/'), self.path);

        if !self.query_params.is_empty() {
            url.push('?');
            let query_string = self
                .query_params
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(k, URI_ENCODE_SET),
                        utf8_percent_encode(v, URI_ENCODE_SET)
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            url.push_str(&query_string);
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_as_str() {
        assert_eq!(HttpMethod::GET.as_str(), "GET");
        assert_eq!(HttpMethod::POST.as_str(), "POST");
        assert_eq!(HttpMethod::PUT.as_str(), "PUT");
        assert_eq!(HttpMethod::DELETE.as_str(), "DELETE");
        assert_eq!(HttpMethod::PATCH.as_str(), "PATCH");
    }

    #[test]
    fn test_request_query() {
        let request = OperationRequest::new(HttpMethod::GET, "/channels")
            .query("maxResults", "100")
            .query("nextToken", "abc123");

        assert_eq!(request.query_params().len(), 2);
        assert_eq!(request.query_param("nextToken"), Some("abc123"));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn test_request_header() {
        let request = OperationRequest::post("/")
            .header("X-Amz-Target", "Service.Operation")
            .unwrap();

        assert_eq!(
            request.headers().get("x-amz-target").unwrap(),
            "Service.Operation"
        );
    }

    #[test]
    fn test_request_invalid_header() {
        let result = OperationRequest::post("/").header("bad header", "value");
        assert!(matches!(result, Err(OperationError::InvalidParameter { .. })));
    }

    #[test]
    fn test_request_body() {
        let request = OperationRequest::post("/").body(b"Action=Describe".to_vec(), "application/x-www-form-urlencoded");

        assert_eq!(request.body_bytes(), Some(&b"Action=Describe"[..]));
        assert_eq!(request.content_type(), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_build_url_no_query() {
        let request = OperationRequest::new(HttpMethod::DELETE, "/channel/live");

        assert_eq!(
            request.build_url("http://localhost:4566/"),
            "http://localhost:4566/channel/live"
        );
    }
}
