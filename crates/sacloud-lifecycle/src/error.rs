//! Error types for monitoring, resolution and configuration
//!
//! Gateway failures are wrapped unchanged; everything else is raised by this
//! crate and is terminal for the operation that produced it.

use sacloud_lifecycle_common::{GatewayError, IdParseError, ResourceId, ResourceKind};
use std::time::Duration;
use thiserror::Error;

/// Errors from the readiness monitor
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A gateway read failed; never retried here
    #[error(transparent)]
    Transport(#[from] GatewayError),

    /// The deadline elapsed before the resource became available
    #[error("Timeout waiting for {resource} after {timeout:?}")]
    Timeout { resource: String, timeout: Duration },

    /// The resource reported a failed terminal state
    #[error("Provisioning failed for {resource} (availability: {availability})")]
    ProvisioningFailed {
        resource: String,
        availability: String,
    },

    /// The wait was cancelled by the caller
    #[error("Wait for {resource} cancelled")]
    Cancelled { resource: String },

    /// The monitor task ended without reporting an outcome
    #[error("Monitor task for {resource} ended without an outcome")]
    Aborted { resource: String },
}

impl MonitorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, MonitorError::Timeout { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, MonitorError::Transport(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MonitorError::Cancelled { .. })
    }

    pub fn is_provisioning_failed(&self) -> bool {
        matches!(self, MonitorError::ProvisioningFailed { .. })
    }
}

/// Errors from provenance and reference resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A gateway call failed
    #[error(transparent)]
    Transport(#[from] GatewayError),

    /// A numeric token is not a usable id
    #[error("Invalid resource id: {0}")]
    InvalidId(#[from] IdParseError),

    /// Name search matched nothing
    #[error("{kind} [{token}](name): Not Found")]
    NotFound { kind: ResourceKind, token: String },

    /// The provenance chain revisited a resource
    #[error("Provenance chain of {start} loops back to {kind} {id}")]
    ProvenanceCycle {
        start: ResourceId,
        kind: ResourceKind,
        id: ResourceId,
    },

    /// The provenance chain is longer than the configured cap
    #[error("Provenance chain of {start} exceeds {max_depth} ancestors")]
    ProvenanceTooDeep { start: ResourceId, max_depth: usize },

    /// Resources of this kind carry no provenance links
    #[error("{kind} resources have no provenance to check")]
    NoProvenance { kind: ResourceKind },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ResolveError::Transport(_))
    }
}

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// zone field is empty
    #[error("zone cannot be empty")]
    EmptyZone,

    /// api_root field is empty
    #[error("api_root cannot be empty")]
    EmptyApiRoot,

    /// Credentials are required for the HTTP gateway
    #[error("access token and secret are required")]
    MissingCredentials,

    /// poll_interval_secs is zero
    #[error("poll_interval_secs must be at least 1")]
    InvalidPollInterval,

    /// progress_capacity is zero
    #[error("progress_capacity must be at least 1")]
    InvalidProgressCapacity,

    /// http_timeout_secs is zero
    #[error("http_timeout_secs must be at least 1")]
    InvalidHttpTimeout,

    /// An allow-edit tag is blank
    #[error("allow_edit_tags cannot contain empty tags")]
    EmptyAllowEditTag,

    /// The HTTP client could not be built from the settings
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
