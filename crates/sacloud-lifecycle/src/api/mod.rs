//! Control-plane API access
//!
//! [`HttpGateway`] talks to the provider's REST API over HTTPS. Tests use the
//! in-memory gateway from `sacloud-lifecycle-test-utils` instead.

mod client;
pub mod error;
pub mod types;

pub use client::HttpGateway;
pub use error::classify_response;
