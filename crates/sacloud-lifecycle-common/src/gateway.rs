//! Resource API gateway interface
//!
//! The gateway performs single synchronous-style calls against the control
//! plane. Transient failure handling belongs to implementations; callers in
//! this workspace never retry a failed call.

use crate::id::ResourceId;
use crate::resource::{Resource, SearchResult};
use crate::resource_kind::ResourceKind;
use std::future::Future;
use thiserror::Error;

/// Errors raised by a gateway call
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider has no resource with this id
    #[error("{kind} '{id}' not found")]
    NotFound { kind: ResourceKind, id: ResourceId },

    /// The provider answered with a non-success status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The response body could not be understood
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Create a transport error wrapping its cause
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
            || matches!(self, GatewayError::Api { status: 404, .. })
    }
}

/// Operations the core needs from the control plane.
///
/// Implementations must be safe for concurrent independent calls.
pub trait ResourceGateway: Send + Sync {
    /// Read the current state of one resource
    fn read_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> impl Future<Output = Result<Resource, GatewayError>> + Send;

    /// Find resources whose name matches `token`, returning at most `limit` records
    fn search_by_name_prefix(
        &self,
        kind: ResourceKind,
        token: &str,
        limit: usize,
    ) -> impl Future<Output = Result<SearchResult, GatewayError>> + Send;

    /// Attach `reference` (a packet filter) to `target` (an interface). Idempotent.
    fn attach_reference(
        &self,
        target: ResourceId,
        reference: ResourceId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
