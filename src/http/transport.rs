//! Transport layer abstraction for HTTP communication.
//!
//! The default implementation uses reqwest. Tests substitute
//! [`crate::mocks::MockTransport`].

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};

use super::{OperationRequest, RawResponse};
use crate::config::ClientConfig;
use crate::error::{transport_failure, OperationError, OperationResult};

/// Header carrying a per-call invocation ID.
pub const INVOCATION_ID_HEADER: &str = "amz-sdk-invocation-id";

/// Trait for HTTP transport implementations.
///
/// A transport may be shared by many invocations; it holds no per-run state.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request to `endpoint` and return the raw response.
    ///
    /// Non-2xx responses are returned as `Ok`; only failures to obtain a
    /// response at all are errors.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::TransportFailure`] if the request cannot be
    /// sent or times out.
    async fn send(&self, endpoint: &str, request: OperationRequest) -> OperationResult<RawResponse>;
}

/// Reqwest-based HTTP transport implementation.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    /// The reqwest HTTP client
    client: Client,

    /// Region, used to clarify name resolution failures
    region: String,
}

impl ReqwestTransport {
    /// Create a transport from client configuration.
    ///
    /// ```rust
    /// use aws_operations::config::ClientConfig;
    /// use aws_operations::http::ReqwestTransport;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ClientConfig::builder().region("us-east-1").build()?;
    /// let transport = ReqwestTransport::new(&config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: &ClientConfig) -> OperationResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| OperationError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            region: config.region.clone(),
        })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, endpoint: &str, request: OperationRequest) -> OperationResult<RawResponse> {
        let url = request.build_url(endpoint);
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| OperationError::invalid_parameter("method", e.to_string()))?;

        let invocation_id = uuid::Uuid::new_v4().to_string();
        debug!(method = %method, url = %url, invocation_id = %invocation_id, "Sending request");

        let mut builder = self
            .client
            .request(method, &url)
            .headers(request.headers().clone())
            .header(INVOCATION_ID_HEADER, invocation_id);

        if let Some(content_type) = request.content_type() {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body_bytes() {
            trace!(bytes = body.len(), "Request body");
            builder = builder.body(body.to_vec());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_failure(e, &self.region, endpoint))?;

        let raw = RawResponse::from_reqwest(response).await?;
        debug!(
            status = raw.status().as_u16(),
            request_id = raw.request_id().unwrap_or("-"),
            "Received response"
        );
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_transport_creation() {
        let config = ClientConfig::builder().region("us-east-1").build().unwrap();
        let transport = ReqwestTransport::new(&config);
        assert!(transport.is_ok());
    }

    #[test]
    fn test_transport_trait_object() {
        let config = ClientConfig::builder().region("us-east-1").build().unwrap();
        let transport = ReqwestTransport::new(&config).unwrap();

        let _: &dyn Transport = &transport;
    }
}
