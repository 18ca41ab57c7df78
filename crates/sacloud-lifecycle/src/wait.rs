//! Fixed-interval resource waiting with cancellation support.
//!
//! Provides the polling loop behind the blocking readiness wait: run a check,
//! sleep a constant interval, and give up once the accumulated sleep time
//! exceeds an optional deadline.

use crate::error::MonitorError;
use backon::{BackoffBuilder, ConstantBuilder};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shortest delay between checks
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for resource waiting.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Deadline on accumulated waiting; `None` waits forever
    pub timeout: Option<Duration>,
}

impl WaitConfig {
    /// Build a config where a zero `timeout` means "no deadline".
    ///
    /// The interval is at least one millisecond so the deadline always advances.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            timeout: (!timeout.is_zero()).then_some(timeout),
        }
    }
}

/// Wait for a resource to become ready, polling at a fixed interval.
///
/// Uses `backon::ConstantBuilder` for the delay sequence and `tokio::select!`
/// for cancellation support.
///
/// # Arguments
/// * `config` - Wait configuration
/// * `cancel` - Optional cancellation token
/// * `check` - Async function that returns `Ok(Some(value))` when ready,
///   `Ok(None)` to poll again
/// * `resource_name` - Name for logging and errors
///
/// # Returns
/// * `Ok(value)` - Resource is ready
/// * `Err` - Timeout, cancelled, or check returned an error
///
/// The deadline is measured as the sum of completed sleeps and is checked
/// after each sleep, so a timeout is never reported before `timeout` has
/// actually elapsed.
pub async fn wait_for_resource<F, Fut, T>(
    config: &WaitConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    resource_name: &str,
) -> Result<T, MonitorError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>, MonitorError>>,
{
    let mut elapsed = Duration::ZERO;
    let mut attempts = 0u32;

    let mut delays = ConstantBuilder::default()
        .with_delay(config.interval)
        .with_max_times(usize::MAX)
        .build();

    loop {
        attempts += 1;

        // Check cancellation before each attempt
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(MonitorError::Cancelled {
                resource: resource_name.to_string(),
            });
        }

        match check().await {
            Ok(Some(value)) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(value);
            }
            Ok(None) => {
                let delay = delays.next().unwrap_or(config.interval);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, polling again"
                );

                // Wait with cancellation support
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = async {
                        if let Some(token) = cancel {
                            token.cancelled().await
                        } else {
                            std::future::pending::<()>().await
                        }
                    } => {
                        return Err(MonitorError::Cancelled {
                            resource: resource_name.to_string(),
                        });
                    }
                }
                elapsed += delay;

                if let Some(timeout) = config.timeout {
                    if elapsed > timeout {
                        warn!(
                            resource = %resource_name,
                            attempts,
                            timeout_secs = timeout.as_secs(),
                            "Timed out waiting for resource"
                        );
                        return Err(MonitorError::Timeout {
                            resource: resource_name.to_string(),
                            timeout,
                        });
                    }
                }
            }
            Err(e) => {
                warn!(resource = %resource_name, error = %e, "Resource check failed");
                return Err(e);
            }
        }
    }
}
