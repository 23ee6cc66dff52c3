//! Mock HTTP transport for testing.

use async_trait::async_trait;
use http::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{OperationError, OperationResult};
use crate::http::{OperationRequest, RawResponse, Transport};

/// Mock HTTP response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
    /// Simulated latency before the response is returned.
    pub delay: Option<Duration>,
    /// Fail with a transport error instead of responding.
    pub failure: Option<String>,
}

impl MockResponse {
    /// Create a successful response with empty body.
    pub fn ok() -> Self {
        Self::error(200, Vec::new())
    }

    /// Create a successful response with body.
    pub fn ok_with_body(body: impl Into<Vec<u8>>) -> Self {
        Self::error(200, body)
    }

    /// Create a response with an arbitrary status.
    pub fn error(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
            delay: None,
            failure: None,
        }
    }

    /// Fail the call with a transport error carrying `message`.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::ok()
        }
    }

    /// Add a header to the response.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Wait before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Endpoint the request was sent to.
    pub endpoint: String,
    /// The encoded request.
    pub request: OperationRequest,
}

impl RecordedRequest {
    /// Full URL of the request.
    pub fn url(&self) -> String {
        self.request.build_url(&self.endpoint)
    }

    /// Body as UTF-8 text, empty if there is none.
    pub fn body_text(&self) -> String {
        self.request
            .body_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Body parsed as JSON.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        self.request.body_bytes().and_then(|b| serde_json::from_slice(b).ok())
    }

    /// Value of a form field in a form-encoded body.
    pub fn form_field(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body_text().as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// Mock HTTP transport for testing.
#[derive(Default)]
pub struct MockTransport {
    /// Queue of responses to return.
    responses: Mutex<VecDeque<MockResponse>>,
    /// Recorded requests.
    requests: Mutex<Vec<RecordedRequest>>,
    /// Default response if no responses are queued.
    default_response: Option<MockResponse>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    /// Create a new mock transport with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport with queued responses.
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Create a mock transport with a default response.
    pub fn with_default(response: MockResponse) -> Self {
        Self {
            default_response: Some(response),
            ..Self::default()
        }
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Get the last request made.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, endpoint: &str, request: OperationRequest) -> OperationResult<RawResponse> {
        lock(&self.requests).push(RecordedRequest {
            endpoint: endpoint.to_string(),
            request,
        });

        let response = lock(&self.responses)
            .pop_front()
            .or_else(|| self.default_response.clone());

        let Some(mock) = response else {
            return Err(OperationError::TransportFailure {
                message: "No mock response available".to_string(),
                source: None,
            });
        };

        if let Some(delay) = mock.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = mock.failure {
            return Err(OperationError::TransportFailure { message, source: None });
        }

        let status = StatusCode::from_u16(mock.status).map_err(|e| OperationError::Configuration {
            message: format!("Invalid mock status {}: {}", mock.status, e),
            source: None,
        })?;
        Ok(RawResponse::new(status, mock.headers, mock.body))
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued_responses", &lock(&self.responses).len())
            .field("recorded_requests", &lock(&self.requests).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    #[tokio::test]
    async fn test_mock_transport_replays_in_order() {
        let transport = MockTransport::with_responses(vec![
            MockResponse::ok_with_body("first"),
            MockResponse::error(404, "Not Found"),
        ]);

        let first = transport
            .send("http://localhost", OperationRequest::new(HttpMethod::GET, "/1"))
            .await
            .unwrap();
        assert_eq!(first.body(), b"first");

        let second = transport
            .send("http://localhost", OperationRequest::new(HttpMethod::GET, "/2"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::NOT_FOUND);

        assert!(transport
            .send("http://localhost", OperationRequest::new(HttpMethod::GET, "/3"))
            .await
            .is_err());
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::with_default(MockResponse::ok().with_header("x-amzn-requestid", "r-1"));

        let request = OperationRequest::post("/").body(b"Action=Describe&Marker=a%2Fb".to_vec(), "application/x-www-form-urlencoded");
        let response = transport.send("http://localhost:4566", request).await.unwrap();
        assert_eq!(response.request_id(), Some("r-1"));

        let recorded = transport.last_request().unwrap();
        assert_eq!(recorded.url(), "http://localhost:4566/");
        assert_eq!(recorded.form_field("Action").as_deref(), Some("Describe"));
        assert_eq!(recorded.form_field("Marker").as_deref(), Some("a/b"));
    }

    #[tokio::test]
    async fn test_mock_transport_failure() {
        let transport = MockTransport::with_responses(vec![MockResponse::transport_failure("connection reset")]);
        let err = transport
            .send("http://localhost", OperationRequest::post("/"))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::TransportFailure { message, .. } if message == "connection reset"));
    }
}
