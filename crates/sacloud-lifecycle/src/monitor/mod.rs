//! Resource readiness monitoring
//!
//! Two ways to wait for a long-running provider operation (disk copy, archive
//! upload) to finish:
//!
//! - [`StateMonitor::wait_until_ready`] polls inline and returns once the
//!   resource is available.
//! - [`StateMonitor::watch_until_ready`] spawns a polling task and hands back
//!   a [`ReadinessWatch`] with progress, completion and error channels.

mod watch;

pub use watch::ReadinessWatch;

use crate::config::MonitorConfig;
use crate::error::{ConfigError, MonitorError};
use crate::wait::{WaitConfig, wait_for_resource};
use sacloud_lifecycle_common::{GatewayError, Resource, ResourceGateway, ResourceId, ResourceKind};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Polls a resource through the gateway until it reaches a terminal state
pub struct StateMonitor<G> {
    gateway: Arc<G>,
    config: MonitorConfig,
}

impl<G> Clone for StateMonitor<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            config: self.config.clone(),
        }
    }
}

impl<G: ResourceGateway> StateMonitor<G> {
    /// Create a monitor with the default 5 second poll interval
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            config: MonitorConfig::default(),
        }
    }

    /// Create a monitor with custom settings.
    ///
    /// A zero poll interval or progress capacity is rejected; a zero interval
    /// would never advance the blocking wait's deadline.
    pub fn with_config(gateway: Arc<G>, config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { gateway, config })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Single read reporting whether the resource is currently available
    pub async fn is_available(&self, kind: ResourceKind, id: ResourceId) -> Result<bool, GatewayError> {
        let resource = self.gateway.read_resource(kind, id).await?;
        Ok(resource.is_available())
    }

    /// Wait until the resource reports `Available`.
    ///
    /// A zero `timeout` waits forever. A read failure ends the wait at once.
    /// A `Failed` resource keeps being polled unless
    /// `MonitorConfig::fail_fast_on_failed` is set.
    pub async fn wait_until_ready(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        timeout: Duration,
    ) -> Result<Resource, MonitorError> {
        self.wait_inner(kind, id, timeout, None).await
    }

    /// Same as [`wait_until_ready`](Self::wait_until_ready), stopping with
    /// `MonitorError::Cancelled` once `cancel` fires.
    pub async fn wait_until_ready_cancellable(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Resource, MonitorError> {
        self.wait_inner(kind, id, timeout, Some(cancel)).await
    }

    async fn wait_inner(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Resource, MonitorError> {
        let label = format!("{kind} {id}");
        info!(
            resource = %label,
            timeout_secs = timeout.as_secs(),
            interval_secs = self.config.poll_interval_secs,
            "Waiting for resource to become available"
        );

        let gateway: &G = &self.gateway;
        let fail_fast = self.config.fail_fast_on_failed;
        let resource_name = label.as_str();

        wait_for_resource(
            &WaitConfig::new(self.config.poll_interval(), timeout),
            cancel,
            || async move {
                let resource = gateway.read_resource(kind, id).await?;
                debug!(resource = %resource_name, state = %resource.state, "Polled resource");

                if resource.is_available() {
                    Ok(Some(resource))
                } else if fail_fast && resource.is_failed() {
                    Err(MonitorError::ProvisioningFailed {
                        resource: resource_name.to_string(),
                        availability: resource.availability.unwrap_or_default(),
                    })
                } else {
                    Ok(None)
                }
            },
            resource_name,
        )
        .await
    }
}

impl<G: ResourceGateway + 'static> StateMonitor<G> {
    /// Start a background watch on the resource.
    ///
    /// A zero `timeout` means no deadline. Dropping the returned handle
    /// cancels the task at its next tick.
    pub fn watch_until_ready(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        timeout: Duration,
    ) -> ReadinessWatch {
        self.watch_with_cancel(kind, id, timeout, CancellationToken::new())
    }

    /// Start a background watch that also stops when `parent` is cancelled
    pub fn watch_until_ready_with_parent(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        timeout: Duration,
        parent: &CancellationToken,
    ) -> ReadinessWatch {
        self.watch_with_cancel(kind, id, timeout, parent.child_token())
    }

    fn watch_with_cancel(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> ReadinessWatch {
        ReadinessWatch::spawn(
            Arc::clone(&self.gateway),
            watch::WatchParams {
                kind,
                id,
                timeout,
                interval: self.config.poll_interval(),
                progress_capacity: self.config.progress_capacity,
            },
            cancel,
        )
    }
}
