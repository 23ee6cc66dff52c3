//! HTTP layer for AWS operation calls.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ OperationRequest │  - Protocol-encoded request
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │    Transport     │  - HTTP transport abstraction
//! │                  │  - Name resolution failure clarification
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     reqwest      │  - Actual HTTP implementation
//! └──────────────────┘
//! ```
//!
//! Requests are unsigned. Point the client at a signing proxy or a local
//! emulator with an endpoint override when talking to a real account.

mod request;
mod response;
mod transport;

pub use request::{HttpMethod, OperationRequest};
pub use response::RawResponse;
pub use transport::{ReqwestTransport, Transport, INVOCATION_ID_HEADER};
