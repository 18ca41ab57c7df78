//! Background readiness watch
//!
//! The polling task never blocks on its consumers: progress goes through a
//! bounded channel with `try_send` (ticks are dropped when it is full), and
//! the completion and error outcomes are one-shots. The progress sender is
//! closed before the outcome is sent, so a consumer draining progress sees the
//! stream end before the outcome arrives.

use crate::error::MonitorError;
use sacloud_lifecycle_common::{Resource, ResourceGateway, ResourceId, ResourceKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

/// Parameters of one watch task
#[derive(Debug, Clone)]
pub(super) struct WatchParams {
    pub kind: ResourceKind,
    pub id: ResourceId,
    /// Zero means no deadline
    pub timeout: Duration,
    pub interval: Duration,
    pub progress_capacity: usize,
}

/// How the task ended
enum Outcome {
    Complete(Resource),
    Failed(MonitorError),
}

/// Handle to a running readiness watch.
///
/// Consume any of the three channels independently. Completion and error are
/// mutually exclusive and each fires at most once. Dropping the handle
/// cancels the task.
pub struct ReadinessWatch {
    resource: String,
    progress: mpsc::Receiver<Resource>,
    completion: oneshot::Receiver<Resource>,
    error: oneshot::Receiver<MonitorError>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    _guard: DropGuard,
}

impl ReadinessWatch {
    pub(super) fn spawn<G>(gateway: Arc<G>, params: WatchParams, cancel: CancellationToken) -> Self
    where
        G: ResourceGateway + 'static,
    {
        let resource = format!("{} {}", params.kind, params.id);
        let (progress_tx, progress) = mpsc::channel(params.progress_capacity);
        let (completion_tx, completion) = oneshot::channel();
        let (error_tx, error) = oneshot::channel();

        let task = WatchTask {
            gateway,
            params,
            resource: resource.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(task.run(progress_tx, completion_tx, error_tx));

        Self {
            resource,
            progress,
            completion,
            error,
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    /// Label of the watched resource, e.g. `disk 1234`
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Progress stream; ends when the watch reaches an outcome
    pub fn progress(&mut self) -> &mut mpsc::Receiver<Resource> {
        &mut self.progress
    }

    /// Completion signal, carrying the available resource
    pub fn completion(&mut self) -> &mut oneshot::Receiver<Resource> {
        &mut self.completion
    }

    /// Error signal
    pub fn error(&mut self) -> &mut oneshot::Receiver<MonitorError> {
        &mut self.error
    }

    /// Next progress tick, or `None` once the stream has ended
    pub async fn next_progress(&mut self) -> Option<Resource> {
        self.progress.recv().await
    }

    /// Ask the task to stop; it reports `MonitorError::Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the polling task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal outcome, ignoring any undrained progress
    pub async fn outcome(mut self) -> Result<Resource, MonitorError> {
        let resource = self.resource.clone();
        tokio::select! {
            Ok(ready) = &mut self.completion => Ok(ready),
            Ok(err) = &mut self.error => Err(err),
            else => Err(MonitorError::Aborted { resource }),
        }
    }
}

struct WatchTask<G> {
    gateway: Arc<G>,
    params: WatchParams,
    resource: String,
    cancel: CancellationToken,
}

impl<G: ResourceGateway + 'static> WatchTask<G> {
    async fn run(
        self,
        progress: mpsc::Sender<Resource>,
        completion: oneshot::Sender<Resource>,
        error: oneshot::Sender<MonitorError>,
    ) {
        info!(
            resource = %self.resource,
            timeout_secs = self.params.timeout.as_secs(),
            interval_secs = self.params.interval.as_secs(),
            "Watching resource"
        );

        let outcome = self.poll(&progress).await;
        drop(progress);

        // Receivers may be gone; nobody is left to tell
        match outcome {
            Outcome::Complete(resource) => {
                info!(resource = %self.resource, "Resource available");
                let _ = completion.send(resource);
            }
            Outcome::Failed(err) => {
                warn!(resource = %self.resource, error = %err, "Watch ended with error");
                let _ = error.send(err);
            }
        }
    }

    async fn poll(&self, progress: &mpsc::Sender<Resource>) -> Outcome {
        let WatchParams {
            kind,
            id,
            timeout,
            interval,
            ..
        } = self.params;

        let deadline = async {
            if timeout.is_zero() {
                std::future::pending::<()>().await
            } else {
                tokio::time::sleep(timeout).await
            }
        };
        tokio::pin!(deadline);

        let mut tick = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.cancelled(),
                _ = &mut deadline => return self.timed_out(),
                _ = tokio::time::sleep(interval) => {}
            }
            tick += 1;

            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.cancelled(),
                _ = &mut deadline => return self.timed_out(),
                read = self.gateway.read_resource(kind, id) => read,
            };
            let resource = match read {
                Ok(resource) => resource,
                Err(e) => return Outcome::Failed(MonitorError::Transport(e)),
            };
            debug!(resource = %self.resource, tick, state = %resource.state, "Polled resource");

            match progress.try_send(resource.clone()) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(_)) => {
                    debug!(resource = %self.resource, tick, "Progress channel full, dropping tick");
                }
            }

            if resource.state.is_terminal() {
                if resource.is_available() {
                    return Outcome::Complete(resource);
                }
                return Outcome::Failed(MonitorError::ProvisioningFailed {
                    resource: self.resource.clone(),
                    availability: resource.availability.unwrap_or_default(),
                });
            }
        }
    }

    fn cancelled(&self) -> Outcome {
        debug!(resource = %self.resource, "Watch cancelled");
        Outcome::Failed(MonitorError::Cancelled {
            resource: self.resource.clone(),
        })
    }

    fn timed_out(&self) -> Outcome {
        Outcome::Failed(MonitorError::Timeout {
            resource: self.resource.clone(),
            timeout: self.params.timeout,
        })
    }
}
