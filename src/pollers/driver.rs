//! Poll-until-done driver
//!
//! Repeatedly invokes a [`PollerType`], sleeping for the interval each result
//! asks for, until the poller reports a terminal status, returns an error, the
//! deadline passes, or the caller cancels.

use super::{PollError, PollResult, PollerType, PollingStatus};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consecutive connections without any HTTP response tolerated before giving up
pub const DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW: u32 = 3;

#[derive(Debug, Error)]
pub enum PollingError {
    #[error(transparent)]
    Poll(#[from] PollError),

    /// A poller reported `Failed` without an accompanying error
    #[error("polling {id} reported a Failed status")]
    Failed { id: String, result: PollResult },

    #[error("giving up after {dropped} dropped connections: {source}")]
    DroppedConnections {
        dropped: u32,
        #[source]
        source: PollError,
    },

    #[error("polling {id} was cancelled")]
    Cancelled { id: String },

    #[error("polling {id} timed out after {timeout:?}")]
    TimedOut { id: String, timeout: Duration },
}

impl PollingError {
    /// Identifier of the resource that was being polled
    pub fn id(&self) -> &str {
        match self {
            Self::Poll(err) | Self::DroppedConnections { source: err, .. } => err.id(),
            Self::Failed { id, .. } | Self::Cancelled { id } | Self::TimedOut { id, .. } => id,
        }
    }
}

/// Drives a [`PollerType`] to a terminal state
pub struct Poller<P> {
    poller_type: P,
    default_interval: Duration,
    dropped_connections_allowed: u32,
    timeout: Option<Duration>,
}

impl<P: PollerType> Poller<P> {
    /// `default_interval` is used whenever a result asks for a zero interval and
    /// between retries of a dropped connection.
    pub fn new(
        poller_type: P,
        default_interval: Duration,
        dropped_connections_allowed: u32,
    ) -> Self {
        Self {
            poller_type,
            default_interval,
            dropped_connections_allowed,
            timeout: None,
        }
    }

    /// Give up with [`PollingError::TimedOut`] once `timeout` has elapsed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn into_inner(self) -> P {
        self.poller_type
    }

    /// Poll until the operation succeeds or fails for good
    ///
    /// Both the in-flight poll and the sleep between polls are abandoned as soon
    /// as `cancel` fires or the deadline passes.
    pub async fn poll_until_done(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<PollResult, PollingError> {
        let timeout = self.timeout;
        let deadline = timeout.map(|t| Instant::now() + t);
        let id = self.poller_type.resource_id();
        let mut attempt = 0u32;
        let mut dropped = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, %id, "Polling");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollingError::Cancelled { id }),
                _ = sleep_until(deadline) => return Err(timed_out(id, timeout)),
                outcome = self.poller_type.poll() => outcome,
            };

            let wait = match outcome {
                Ok(result) => {
                    dropped = 0;
                    match result.status {
                        PollingStatus::Succeeded => {
                            info!(attempt, %id, "Polling succeeded");
                            return Ok(result);
                        }
                        PollingStatus::Failed => {
                            warn!(attempt, "Polling reported a Failed status");
                            return Err(PollingError::Failed { id, result });
                        }
                        PollingStatus::InProgress => {
                            if result.poll_interval.is_zero() {
                                self.default_interval
                            } else {
                                result.poll_interval
                            }
                        }
                    }
                }
                Err(err) if err.is_dropped_connection() => {
                    dropped += 1;
                    if dropped > self.dropped_connections_allowed {
                        warn!(attempt, dropped, error = %err, "Too many dropped connections");
                        return Err(PollingError::DroppedConnections { dropped, source: err });
                    }
                    warn!(attempt, dropped, error = %err, "Connection dropped, retrying");
                    self.default_interval
                }
                Err(err) => {
                    warn!(
                        attempt,
                        status = %err.reported_status(),
                        error = %err,
                        "Polling failed"
                    );
                    return Err(PollingError::Poll(err));
                }
            };

            debug!(attempt, wait_ms = wait.as_millis() as u64, "Still in progress");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollingError::Cancelled { id }),
                _ = sleep_until(deadline) => return Err(timed_out(id, timeout)),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn timed_out(id: String, timeout: Option<Duration>) -> PollingError {
    PollingError::TimedOut {
        id,
        timeout: timeout.unwrap_or_default(),
    }
}
