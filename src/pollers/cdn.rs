//! CDN custom domain pollers

use super::{PollError, PollResult, PollerType};
use crate::azure::client::ArmClient;
use crate::azure::http::{ApiError, Response};
use crate::azure::ids::CustomDomainId;
use crate::azure::models::{CustomDomain, DomainValidationState};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub const DELETE_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Domain validation waits on a DNS record, so there is no point polling faster
pub const APPROVAL_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Reads a custom domain
#[async_trait]
pub trait CustomDomainReader: Send + Sync {
    async fn get_custom_domain(&self, id: &CustomDomainId)
        -> Result<Response<CustomDomain>, ApiError>;
}

#[async_trait]
impl CustomDomainReader for ArmClient {
    async fn get_custom_domain(
        &self,
        id: &CustomDomainId,
    ) -> Result<Response<CustomDomain>, ApiError> {
        self.custom_domains_get(id).await
    }
}

/// Waits until a deleted custom domain stops being returned
pub struct CdnCustomDomainDeletePoller<C> {
    client: C,
    id: CustomDomainId,
}

impl<C: CustomDomainReader> CdnCustomDomainDeletePoller<C> {
    pub fn new(client: C, id: CustomDomainId) -> Self {
        Self { client, id }
    }
}

#[async_trait]
impl<C: CustomDomainReader> PollerType for CdnCustomDomainDeletePoller<C> {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    async fn poll(&mut self) -> Result<PollResult, PollError> {
        match self.client.get_custom_domain(&self.id).await {
            Ok(resp) => Ok(PollResult::in_progress(DELETE_POLL_INTERVAL)
                .with_response(Some(resp.http_response))),
            Err(err) if err.was_not_found() => Ok(PollResult::succeeded(DELETE_POLL_INTERVAL)
                .with_response(err.response().cloned())),
            Err(err) => Err(PollError::retrieving(&self.id, err)),
        }
    }
}

/// Waits until a custom domain's ownership validation has been approved
///
/// Unrecognised validation states count as still in progress: a state added
/// by the service later must never be mistaken for success or failure.
pub struct CdnCustomDomainWaitForApprovedPoller<C> {
    client: C,
    id: CustomDomainId,
}

impl<C: CustomDomainReader> CdnCustomDomainWaitForApprovedPoller<C> {
    pub fn new(client: C, id: CustomDomainId) -> Self {
        Self { client, id }
    }
}

#[async_trait]
impl<C: CustomDomainReader> PollerType for CdnCustomDomainWaitForApprovedPoller<C> {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    async fn poll(&mut self) -> Result<PollResult, PollError> {
        let resp = self
            .client
            .get_custom_domain(&self.id)
            .await
            .map_err(|err| PollError::retrieving(&self.id, err))?;

        let in_progress = PollResult::in_progress(APPROVAL_POLL_INTERVAL)
            .with_response(Some(resp.http_response.clone()));

        let Some(props) = resp.model.and_then(|m| m.properties) else {
            debug!("{} returned no properties yet", self.id);
            return Ok(in_progress);
        };

        let Some(state) = props.domain_validation_state else {
            debug!(
                "{}: Domain Validation State was nil - Deployment Status {:?} / Provisioning State {:?}",
                self.id, props.deployment_status, props.provisioning_state
            );
            return Ok(in_progress);
        };

        match state {
            DomainValidationState::Approved => Ok(PollResult::succeeded(APPROVAL_POLL_INTERVAL)
                .with_response(Some(resp.http_response))),
            state if state.is_terminal_failure() => Err(PollError::TerminalState {
                id: self.id.to_string(),
                state: state.to_string(),
                deployment_status: props.deployment_status,
                provisioning_state: props.provisioning_state,
            }),
            state => {
                debug!("{}: Domain Validation State is {:?}", self.id, state.as_str());
                Ok(in_progress)
            }
        }
    }
}
