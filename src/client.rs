//! Operation client.
//!
//! [`OperationClient`] is the single engine behind every catalog
//! operation. An invocation runs:
//!
//! 1. resolve the descriptor by name
//! 2. resolve and validate the output selector
//! 3. build the request from the inputs
//! 4. confirmation gate for mutating operations, unless forced
//! 5. fetch (paginated or single call), projecting each response into the
//!    caller's sink as it arrives
//!
//! Steps 1 to 3 fail before any network call.
//!
//! # Example
//!
//! ```rust,no_run
//! use aws_operations::{Inputs, InvocationOptions, OperationClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OperationClient::builder().region("us-east-1").build()?;
//!
//! let inputs = Inputs::new()
//!     .with("LoadBalancerName", "web")
//!     .with("Subnets", serde_json::json!(["subnet-1"]));
//!
//! client
//!     .invoke(
//!         "DetachLoadBalancerFromSubnets",
//!         &inputs,
//!         &InvocationOptions::new().force(),
//!         CancellationToken::new(),
//!         |subnet| {
//!             println!("{}", subnet);
//!             Ok(())
//!         },
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::builders::{BuiltRequest, Inputs, RequestBuilder};
use crate::config::ClientConfig;
use crate::error::{OperationError, OperationResult};
use crate::http::{ReqwestTransport, Transport};
use crate::model::{OperationDescriptor, OperationRegistry, PaginationDescriptor};
use crate::pagination::{Page, PaginationOutcome, Paginator, PagingOptions};
use crate::projection::{Projector, Selector};
use crate::protocol::{decode_response, encode_request};

/// Decides whether a mutating operation may proceed.
///
/// Consulted only when the invocation is not forced.
pub trait Confirmation: Send + Sync {
    /// Return true to proceed.
    fn confirm(&self, descriptor: &OperationDescriptor, request: &BuiltRequest) -> bool;
}

/// Approves every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Confirmation for AutoApprove {
    fn confirm(&self, _descriptor: &OperationDescriptor, _request: &BuiltRequest) -> bool {
        true
    }
}

/// Declines every operation; only forced invocations of mutating
/// operations go through.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

impl Confirmation for DeclineAll {
    fn confirm(&self, _descriptor: &OperationDescriptor, _request: &BuiltRequest) -> bool {
        false
    }
}

/// Per-invocation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOptions {
    /// Output selector; the operation's default when `None`.
    pub select: Option<String>,
    /// Skip the confirmation gate.
    pub force: bool,
    /// Paging preferences.
    pub paging: PagingOptions,
}

impl InvocationOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output selector.
    pub fn select(mut self, selector: impl Into<String>) -> Self {
        self.select = Some(selector.into());
        self
    }

    /// Skip the confirmation gate.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Set paging preferences.
    pub fn paging(mut self, paging: PagingOptions) -> Self {
        self.paging = paging;
        self
    }
}

/// Summary of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Qualified operation name.
    pub operation: String,
    /// Responses received.
    pub pages: usize,
    /// Values handed to the sink.
    pub emitted: usize,
    /// Token to resume from, set when paging stopped early by request.
    pub next_token: Option<String>,
    /// The confirmation gate declined the call; nothing was sent.
    pub skipped: bool,
}

/// Runs catalog operations against AWS.
#[derive(Clone)]
pub struct OperationClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    registry: Arc<OperationRegistry>,
    confirmation: Arc<dyn Confirmation>,
}

impl OperationClient {
    /// Create a client with the reqwest transport and the built-in catalog.
    pub fn new(config: ClientConfig) -> OperationResult<Self> {
        Self::builder().config(config).build()
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> OperationResult<Self> {
        Self::builder().from_env().build()
    }

    /// Create a client builder.
    pub fn builder() -> OperationClientBuilder {
        OperationClientBuilder::default()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the operation registry.
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Invoke an operation, handing each projected value to `sink` as soon
    /// as its page arrives.
    ///
    /// # Errors
    ///
    /// - [`OperationError::UnknownOperation`] / [`OperationError::AmbiguousOperation`]
    /// - [`OperationError::InvalidSelector`]
    /// - [`OperationError::MissingRequiredField`] / [`OperationError::InvalidParameter`]
    /// - [`OperationError::TransportFailure`] / [`OperationError::ServiceFailure`]
    ///   from any page; values from earlier pages were already emitted
    /// - [`OperationError::Cancelled`] if `cancel` fires
    /// - any error returned by `sink`, which stops the run
    #[instrument(skip(self, inputs, options, cancel, sink), fields(operation = %name))]
    pub async fn invoke<S>(
        &self,
        name: &str,
        inputs: &Inputs,
        options: &InvocationOptions,
        cancel: CancellationToken,
        mut sink: S,
    ) -> OperationResult<InvocationOutcome>
    where
        S: FnMut(Value) -> OperationResult<()>,
    {
        let descriptor = self.registry.resolve(name)?;
        let selector = Selector::resolve(options.select.as_deref(), descriptor)?;
        let request = RequestBuilder::new(descriptor).build(inputs)?;

        let mut outcome = InvocationOutcome {
            operation: descriptor.qualified_name(),
            ..InvocationOutcome::default()
        };

        if descriptor.is_mutating() && !options.force && !self.confirmation.confirm(descriptor, &request) {
            info!(impact = ?descriptor.confirm_impact, "Operation declined, nothing sent");
            outcome.skipped = true;
            return Ok(outcome);
        }

        let endpoint = self.config.endpoint_for(&descriptor.service.endpoint_prefix);
        let projector = Projector::new(selector);
        debug!(endpoint = %endpoint, selector = %projector.selector(), "Invoking operation");

        let mut emitted = 0usize;
        let mut emit = |response: &Value, request: &BuiltRequest| -> OperationResult<()> {
            for value in projector.project(response, request) {
                emitted += 1;
                sink(value)?;
            }
            Ok(())
        };

        match &descriptor.pagination {
            Some(pagination) => {
                let (template, paging) = self.paging_template(pagination, request, &options.paging);
                let result = self
                    .run_paginated(descriptor, pagination, &endpoint, &template, paging, cancel, |page| {
                        emit(&page.data, &template)
                    })
                    .await?;
                outcome.pages = result.pages;
                outcome.next_token = result.next_token;
            }
            None => {
                let response = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(OperationError::Cancelled { pages_completed: 0 });
                    }
                    response = self.call(descriptor, &endpoint, &request) => response?,
                };
                outcome.pages = 1;
                emit(&response, &request)?;
            }
        }

        outcome.emitted = emitted;
        info!(
            pages = outcome.pages,
            emitted = outcome.emitted,
            has_next_token = outcome.next_token.is_some(),
            "Operation complete"
        );
        Ok(outcome)
    }

    /// Invoke an operation and collect every emitted value.
    pub async fn invoke_collect(
        &self,
        name: &str,
        inputs: &Inputs,
        options: &InvocationOptions,
        cancel: CancellationToken,
    ) -> OperationResult<Vec<Value>> {
        let mut values = Vec::new();
        self.invoke(name, inputs, options, cancel, |value| {
            values.push(value);
            Ok(())
        })
        .await?;
        Ok(values)
    }

    /// Blocking form of [`invoke_collect`](Self::invoke_collect) for callers
    /// without a runtime.
    ///
    /// Runs on a private current-thread runtime; calling it from inside a
    /// tokio runtime panics. Cancel from another thread with a clone of
    /// `cancel`.
    pub fn invoke_blocking(
        &self,
        name: &str,
        inputs: &Inputs,
        options: &InvocationOptions,
        cancel: CancellationToken,
    ) -> OperationResult<Vec<Value>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OperationError::Configuration {
                message: format!("Failed to start runtime: {}", e),
                source: Some(Box::new(e)),
            })?;

        runtime.block_on(self.invoke_collect(name, inputs, options, cancel))
    }

    /// Split the built request into the per-page template and the paging
    /// options of the run.
    ///
    /// A token given in the paging options wins over one given as an input.
    fn paging_template(
        &self,
        pagination: &PaginationDescriptor,
        mut request: BuiltRequest,
        options: &PagingOptions,
    ) -> (BuiltRequest, PagingOptions) {
        let mut paging = options.clone();

        let input_token = request.take_member(&pagination.input_token);
        if paging.next_token.is_none() {
            paging.next_token = input_token.as_ref().and_then(token_string);
        }

        if let Some(size) = paging.page_size {
            match &pagination.page_size {
                Some(param) => request.set_member(param.clone(), json!(size)),
                None => debug!(page_size = size, "Operation takes no page size, ignoring"),
            }
        }

        (request, paging)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_paginated<'a, C>(
        &'a self,
        descriptor: &'a OperationDescriptor,
        pagination: &'a PaginationDescriptor,
        endpoint: &'a str,
        template: &'a BuiltRequest,
        paging: PagingOptions,
        cancel: CancellationToken,
        on_page: C,
    ) -> OperationResult<PaginationOutcome>
    where
        C: FnMut(Page<Value>) -> OperationResult<()>,
    {
        let fetch = move |token: Option<String>| -> BoxFuture<'a, OperationResult<Page<Value>>> {
            let mut request = template.clone();
            if let Some(token) = token {
                request.set_member(pagination.input_token.clone(), Value::String(token));
            }
            self.fetch_page(descriptor, pagination, endpoint, request).boxed()
        };

        Paginator::new(fetch, paging, cancel).for_each_page(on_page).await
    }

    async fn fetch_page(
        &self,
        descriptor: &OperationDescriptor,
        pagination: &PaginationDescriptor,
        endpoint: &str,
        request: BuiltRequest,
    ) -> OperationResult<Page<Value>> {
        let response = self.call(descriptor, endpoint, &request).await?;
        let next_token = response.get(&pagination.output_token).and_then(token_string);
        Ok(Page::new(response, next_token))
    }

    async fn call(&self, descriptor: &OperationDescriptor, endpoint: &str, request: &BuiltRequest) -> OperationResult<Value> {
        let encoded = encode_request(descriptor, request)?;
        let raw = self.transport.send(endpoint, encoded).await?;
        decode_response(descriptor, &raw)
    }
}

fn token_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl std::fmt::Debug for OperationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationClient")
            .field("config", &self.config)
            .field("operations", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`OperationClient`].
#[derive(Default)]
pub struct OperationClientBuilder {
    config: Option<ClientConfig>,
    region: Option<String>,
    endpoint: Option<String>,
    from_env: bool,
    transport: Option<Arc<dyn Transport>>,
    registry: Option<OperationRegistry>,
    confirmation: Option<Arc<dyn Confirmation>>,
}

impl OperationClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the provided configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Set the AWS region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Send every request to this endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use a custom transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom operation registry instead of the built-in catalog.
    pub fn registry(mut self, registry: OperationRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the confirmation policy for mutating operations.
    pub fn confirmation(mut self, confirmation: Arc<dyn Confirmation>) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Configuration`] if no region is available
    /// or the HTTP client cannot be created.
    pub fn build(self) -> OperationResult<OperationClient> {
        let config = match self.config {
            Some(config) => config,
            None => {
                let mut builder = ClientConfig::builder();
                if self.from_env {
                    builder = builder.with_env();
                }
                if let Some(region) = self.region {
                    builder = builder.region(region);
                }
                if let Some(endpoint) = self.endpoint {
                    builder = builder.endpoint(endpoint);
                }
                builder.build()?
            }
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config)?),
        };

        Ok(OperationClient {
            config: Arc::new(config),
            transport,
            registry: Arc::new(self.registry.unwrap_or_else(OperationRegistry::builtin)),
            confirmation: self.confirmation.unwrap_or_else(|| Arc::new(AutoApprove)),
        })
    }
}
