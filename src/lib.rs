//! Descriptor-driven AWS operation bindings.
//!
//! Every supported AWS operation is described once, declaratively, by an
//! [`OperationDescriptor`](model::OperationDescriptor). A single engine
//! turns named inputs into a request, pages through the results and
//! projects each response through a selector.
//!
//! # Features
//!
//! - **Presence-tracking request builder**: absent inputs are omitted, never
//!   defaulted; nested structures are materialized only when one of their
//!   leaves is set
//! - **Cursor pagination**: sequential page fetches with auto-iteration,
//!   manual paging and cancellation
//! - **Result projection**: `*`, a response field path, or `^Param` to echo
//!   an input
//! - **Protocols**: AWS Query (XML), JSON 1.1 and REST-JSON
//! - **Async/Await**: built on Tokio, with a blocking entry point
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aws_operations::{Inputs, InvocationOptions, OperationClient, PagingOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OperationClient::from_env()?;
//!
//!     let options = InvocationOptions::new().paging(PagingOptions::new().with_page_size(20));
//!     client
//!         .invoke(
//!             "DescribeLoadBalancers",
//!             &Inputs::new(),
//!             &options,
//!             CancellationToken::new(),
//!             |description| {
//!                 println!("{}", description["LoadBalancerName"]);
//!                 Ok(())
//!             },
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`OperationResult<T>`]. Input and selector problems
//! are reported before anything is sent:
//!
//! ```rust,no_run
//! use aws_operations::{Inputs, InvocationOptions, OperationClient, OperationError};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(client: &OperationClient) {
//! let result = client
//!     .invoke_collect("ConfigureHealthCheck", &Inputs::new(), &InvocationOptions::new(), CancellationToken::new())
//!     .await;
//!
//! match result {
//!     Err(OperationError::MissingRequiredField { field }) => eprintln!("missing {}", field),
//!     Err(OperationError::ServiceFailure { code, .. }) => eprintln!("service said {}", code),
//!     Err(e) => eprintln!("{}", e),
//!     Ok(values) => println!("{} values", values.len()),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod builders;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mocks;
pub mod model;
pub mod pagination;
pub mod projection;
pub mod protocol;
pub mod services;

// Re-export client types
pub use client::{
    AutoApprove, Confirmation, DeclineAll, InvocationOptions, InvocationOutcome, OperationClient,
    OperationClientBuilder,
};

// Re-export builder types
pub use builders::{BuiltRequest, Inputs, RequestBuilder};

// Re-export configuration types
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};

// Re-export error types
pub use error::{OperationError, OperationResult};

// Re-export model types
pub use model::{OperationDescriptor, OperationRegistry, ParamSpec, Protocol};

// Re-export pagination and projection types
pub use pagination::{Page, PaginationOutcome, Paginator, PagingOptions};
pub use projection::{Projector, Selector};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
