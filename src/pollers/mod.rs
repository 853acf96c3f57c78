//! Custom long-running-operation pollers
//!
//! Some ARM actions have no operation resource to poll, so completion has to be
//! discovered by repeatedly reading the resource itself. Each poller in this
//! module performs one status check per [`PollerType::poll`] call and reports
//! a [`PollingStatus`] or a fatal [`PollError`]; the generic
//! [`Poller`] driver calls it until a terminal state is reached.
//!
//! # Module Structure
//!
//! - [`driver`] - The poll-until-done loop (intervals, dropped connections, cancellation)
//! - [`resource_group`] - Resource group create stabilization and delete guard
//! - [`cdn`] - CDN custom domain deletion and validation approval
//!
//! # Contract
//!
//! `Ok` results carry a [`PollingStatus`]; `Err` is always fatal. Pollers never
//! return a status and an error together, so the error always wins.
//! [`PollError::reported_status`] exposes the status a failure is displayed
//! with.
//!
//! # Example
//!
//! ```ignore
//! use azurerm_pollers::pollers::{Poller, DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW};
//! use azurerm_pollers::pollers::resource_group::ResourceGroupCreatePoller;
//!
//! let poller_type = ResourceGroupCreatePoller::new(client, id);
//! let mut poller = Poller::new(
//!     poller_type,
//!     Duration::from_secs(10),
//!     DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW,
//! );
//! poller.poll_until_done(&CancellationToken::new()).await?;
//! ```

pub mod cdn;
pub mod driver;
pub mod resource_group;

use crate::azure::http::{ApiError, RawResponse};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use driver::{Poller, PollingError, DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW};

/// Status reported by a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl PollingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for PollingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one successful poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    /// How long the driver sleeps before polling again (ignored once terminal)
    pub poll_interval: Duration,
    pub status: PollingStatus,
    /// Response the status was derived from, for diagnostics
    pub http_response: Option<RawResponse>,
}

impl PollResult {
    pub fn in_progress(poll_interval: Duration) -> Self {
        Self::new(poll_interval, PollingStatus::InProgress)
    }

    pub fn succeeded(poll_interval: Duration) -> Self {
        Self::new(poll_interval, PollingStatus::Succeeded)
    }

    pub fn failed(poll_interval: Duration) -> Self {
        Self::new(poll_interval, PollingStatus::Failed)
    }

    fn new(poll_interval: Duration, status: PollingStatus) -> Self {
        Self {
            poll_interval,
            status,
            http_response: None,
        }
    }

    pub fn with_response(mut self, response: Option<RawResponse>) -> Self {
        self.http_response = response;
        self
    }
}

/// Fatal outcome of a single poll
///
/// Every variant's message contains the identifier of the resource being polled.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("retrieving {id}: {source}")]
    Retrieving {
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("listing resources within {id}: {source}")]
    Listing {
        id: String,
        #[source]
        source: ApiError,
    },

    /// The request never got an HTTP response; the driver tolerates a few of these
    #[error("connection dropped while polling {id}: {source}")]
    DroppedConnection {
        id: String,
        #[source]
        source: ApiError,
    },

    #[error(
        "{id}: the Domain Validation State was {state:?} (Deployment Status {:?} / Provisioning State {:?})",
        or_unknown(.deployment_status),
        or_unknown(.provisioning_state)
    )]
    TerminalState {
        id: String,
        state: String,
        deployment_status: Option<String>,
        provisioning_state: Option<String>,
    },

    #[error("{}", resources_present_message(.id, .resource_ids))]
    ResourcesPresent { id: String, resource_ids: Vec<String> },
}

impl PollError {
    /// Wrap a failed GET, splitting out connections that never got a response
    pub fn retrieving(id: &impl fmt::Display, source: ApiError) -> Self {
        let id = id.to_string();
        if source.is_dropped_connection() {
            Self::DroppedConnection { id, source }
        } else {
            Self::Retrieving { id, source }
        }
    }

    /// Wrap a failed list call, splitting out connections that never got a response
    pub fn listing(id: &impl fmt::Display, source: ApiError) -> Self {
        let id = id.to_string();
        if source.is_dropped_connection() {
            Self::DroppedConnection { id, source }
        } else {
            Self::Listing { id, source }
        }
    }

    /// The status this failure is displayed with. Informational only: an error
    /// stops the driver whatever this returns.
    pub fn reported_status(&self) -> PollingStatus {
        match self {
            Self::ResourcesPresent { .. } => PollingStatus::InProgress,
            _ => PollingStatus::Failed,
        }
    }

    pub fn is_dropped_connection(&self) -> bool {
        matches!(self, Self::DroppedConnection { .. })
    }

    /// Identifier of the resource that was being polled
    pub fn id(&self) -> &str {
        match self {
            Self::Retrieving { id, .. }
            | Self::Listing { id, .. }
            | Self::DroppedConnection { id, .. }
            | Self::TerminalState { id, .. }
            | Self::ResourcesPresent { id, .. } => id,
        }
    }
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("unknown")
}

fn resources_present_message(id: &str, resource_ids: &[String]) -> String {
    let listing = resource_ids
        .iter()
        .map(|r| format!("* `{}`", r))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "deleting {id}: this Resource Group contains {count} other resources which are not \
managed by this provider:

{listing}

In order to delete this Resource Group, these nested resources must first be deleted, or this \
safety check must be disabled by setting `prevent_deletion_if_contains_resources` to `false` \
within the `resource_group` block of the `features` section of the configuration file.

Note that disabling this check deletes the nested resources along with the Resource Group.",
        count = resource_ids.len(),
    )
}

/// A state machine performing one status check per call
#[async_trait]
pub trait PollerType: Send {
    /// Query the remote resource once and classify what it reports
    async fn poll(&mut self) -> Result<PollResult, PollError>;

    /// ARM identifier of the resource being polled
    fn resource_id(&self) -> String;
}

/// Enables dynamic dispatch for pollers
#[async_trait]
impl PollerType for Box<dyn PollerType> {
    async fn poll(&mut self) -> Result<PollResult, PollError> {
        (**self).poll().await
    }

    fn resource_id(&self) -> String {
        (**self).resource_id()
    }
}
