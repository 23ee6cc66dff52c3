//! Configuration for the operation client.
//!
//! The client needs a region to resolve service endpoints. Everything else has
//! a default:
//!
//! - Endpoint override (for LocalStack or a signing proxy)
//! - Request and connect timeouts
//! - User agent

use std::time::Duration;

pub mod error;

pub use error::ConfigError;

/// Default timeout for a whole request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the operation client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// AWS region (e.g., "us-east-1").
    pub region: String,

    /// Endpoint URL used for every service instead of the regional default.
    pub endpoint: Option<String>,

    /// Timeout for the entire request.
    pub timeout: Duration,

    /// Timeout for establishing connections.
    pub connect_timeout: Duration,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use aws_operations::config::ClientConfig;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ClientConfig::builder()
    ///     .region("us-east-1")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// This method reads the following environment variables:
    /// - `AWS_REGION` or `AWS_DEFAULT_REGION` for the region
    /// - `AWS_ENDPOINT_URL` for an optional endpoint override
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().with_env().build()
    }

    /// Resolve the endpoint URL for a service endpoint prefix.
    ///
    /// Returns the override if configured, otherwise the standard regional
    /// endpoint.
    ///
    /// ```
    /// use aws_operations::config::ClientConfig;
    ///
    /// let config = ClientConfig::builder().region("eu-west-1").build().unwrap();
    /// assert_eq!(
    ///     config.endpoint_for("elasticloadbalancing"),
    ///     "https://elasticloadbalancing.eu-west-1.amazonaws.com"
    /// );
    /// ```
    pub fn endpoint_for(&self, endpoint_prefix: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}.amazonaws.com", endpoint_prefix, self.region),
        }
    }
}

/// Builder for creating client configurations.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    region: Option<String>,
    endpoint: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Set the AWS region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint URL.
    ///
    /// ```
    /// use aws_operations::config::ClientConfig;
    ///
    /// let builder = ClientConfig::builder()
    ///     .region("us-east-1")
    ///     .endpoint("http://localhost:4566");
    /// ```
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set a custom user agent string.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Fill unset region and endpoint from the environment.
    ///
    /// Values already set on the builder win over the environment.
    pub fn with_env(mut self) -> Self {
        if self.region.is_none() {
            self.region = non_empty_var("AWS_REGION").or_else(|| non_empty_var("AWS_DEFAULT_REGION"));
        }
        if self.endpoint.is_none() {
            self.endpoint = non_empty_var("AWS_ENDPOINT_URL");
        }
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` if the region is not set and
    /// `ConfigError::Invalid` if the endpoint is not an absolute URL or a
    /// timeout is zero.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let region = self
            .region
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "region".to_string(),
            })?;

        if let Some(endpoint) = &self.endpoint {
            let parsed = url::Url::parse(endpoint).map_err(|e| ConfigError::Invalid {
                message: format!("endpoint '{}' is not a valid URL: {}", endpoint, e),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    message: format!("endpoint '{}' must use http or https", endpoint),
                });
            }
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        if timeout.is_zero() || connect_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "timeouts must be greater than zero".to_string(),
            });
        }

        Ok(ClientConfig {
            region,
            endpoint: self.endpoint,
            timeout,
            connect_timeout,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| format!("aws-operations/{}", env!("CARGO_PKG_VERSION"))),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
