//! Resource group pollers
//!
//! - [`ResourceGroupCreatePoller`] waits until a newly created group has been
//!   observed several times in a row, absorbing stale reads right after creation.
//! - [`ResourceGroupPreventDeletePoller`] refuses to let a group be deleted while
//!   it still contains resources this provider does not manage.

use super::{PollError, PollResult, PollerType};
use crate::azure::client::ArmClient;
use crate::azure::http::{ApiError, ListResult, Response};
use crate::azure::ids::ResourceGroupId;
use crate::azure::models::{GenericResourceExpanded, ResourceGroup};
use crate::azure::resources::ListByResourceGroupOptions;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Consecutive successful reads needed before a new group counts as available
pub const REQUIRED_SUCCESSFUL_OBSERVATIONS: u32 = 3;

/// Page size used when scanning a group for nested resources
pub const NESTED_RESOURCES_PAGE_SIZE: i64 = 10;

/// Listed in place of a nested resource that came back with neither id nor name
pub const UNIDENTIFIED_RESOURCE: &str = "(unidentified resource)";

/// Reads a resource group
#[async_trait]
pub trait ResourceGroupReader: Send + Sync {
    async fn get_resource_group(
        &self,
        id: &ResourceGroupId,
    ) -> Result<Response<ResourceGroup>, ApiError>;
}

/// Lists every resource nested in a resource group
#[async_trait]
pub trait ResourceGroupResourceLister: Send + Sync {
    async fn list_by_resource_group_complete(
        &self,
        id: &ResourceGroupId,
        options: ListByResourceGroupOptions,
    ) -> Result<ListResult<GenericResourceExpanded>, ApiError>;
}

#[async_trait]
impl ResourceGroupReader for ArmClient {
    async fn get_resource_group(
        &self,
        id: &ResourceGroupId,
    ) -> Result<Response<ResourceGroup>, ApiError> {
        self.resource_groups_get(id).await
    }
}

#[async_trait]
impl ResourceGroupResourceLister for ArmClient {
    async fn list_by_resource_group_complete(
        &self,
        id: &ResourceGroupId,
        options: ListByResourceGroupOptions,
    ) -> Result<ListResult<GenericResourceExpanded>, ApiError> {
        self.resources_list_by_resource_group_complete(id, &options)
            .await
    }
}

/// Waits for a created resource group to be consistently readable
///
/// The countdown belongs to this instance, so pollers for different groups
/// (or concurrent creates) never interfere with each other.
pub struct ResourceGroupCreatePoller<C> {
    client: C,
    id: ResourceGroupId,
    success_count: u32,
}

impl<C: ResourceGroupReader> ResourceGroupCreatePoller<C> {
    pub fn new(client: C, id: ResourceGroupId) -> Self {
        Self {
            client,
            id,
            success_count: REQUIRED_SUCCESSFUL_OBSERVATIONS,
        }
    }

    /// Successful reads still required before reporting success
    pub fn remaining(&self) -> u32 {
        self.success_count
    }
}

#[async_trait]
impl<C: ResourceGroupReader> PollerType for ResourceGroupCreatePoller<C> {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    async fn poll(&mut self) -> Result<PollResult, PollError> {
        match self.client.get_resource_group(&self.id).await {
            Ok(resp) => {
                if self.success_count > 1 {
                    self.success_count -= 1;
                    debug!(
                        "{} found, waiting for {} more consecutive reads",
                        self.id, self.success_count
                    );
                    return Ok(PollResult::in_progress(POLL_INTERVAL)
                        .with_response(Some(resp.http_response)));
                }
                Ok(PollResult::succeeded(POLL_INTERVAL).with_response(Some(resp.http_response)))
            }
            Err(err) if err.was_not_found() => {
                debug!("{} not found yet, resetting the countdown", self.id);
                self.success_count = REQUIRED_SUCCESSFUL_OBSERVATIONS;
                Ok(PollResult::in_progress(POLL_INTERVAL).with_response(err.response().cloned()))
            }
            Err(err) => Err(PollError::retrieving(&self.id, err)),
        }
    }
}

/// Fails while a resource group still contains nested resources
pub struct ResourceGroupPreventDeletePoller<C> {
    client: C,
    id: ResourceGroupId,
}

impl<C: ResourceGroupResourceLister> ResourceGroupPreventDeletePoller<C> {
    pub fn new(client: C, id: ResourceGroupId) -> Self {
        Self { client, id }
    }

    fn options() -> ListByResourceGroupOptions {
        ListByResourceGroupOptions {
            expand: Some("provisioningState".to_string()),
            filter: None,
            top: Some(NESTED_RESOURCES_PAGE_SIZE),
        }
    }
}

#[async_trait]
impl<C: ResourceGroupResourceLister> PollerType for ResourceGroupPreventDeletePoller<C> {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    async fn poll(&mut self) -> Result<PollResult, PollError> {
        let result = match self
            .client
            .list_by_resource_group_complete(&self.id, Self::options())
            .await
        {
            Ok(result) => result,
            Err(err) if err.was_not_found() => {
                debug!("{} no longer exists, nothing to guard", self.id);
                return Ok(
                    PollResult::succeeded(POLL_INTERVAL).with_response(err.response().cloned())
                );
            }
            Err(err) => return Err(PollError::listing(&self.id, err)),
        };

        if result.items.is_empty() {
            return Ok(
                PollResult::succeeded(POLL_INTERVAL).with_response(result.latest_http_response)
            );
        }

        // Entries without an id still block deletion, listed by name instead
        let mut resource_ids: Vec<String> = result.items.into_iter().map(describe).collect();
        resource_ids.sort();
        warn!(
            "{} still contains {} nested resources",
            self.id,
            resource_ids.len()
        );

        Err(PollError::ResourcesPresent {
            id: self.id.to_string(),
            resource_ids,
        })
    }
}

fn describe(resource: GenericResourceExpanded) -> String {
    match (resource.id, resource.name) {
        (Some(id), _) => id,
        (None, Some(name)) => format!("{} (no resource id)", name),
        (None, None) => UNIDENTIFIED_RESOURCE.to_string(),
    }
}
