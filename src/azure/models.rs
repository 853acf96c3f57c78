//! ARM response models
//!
//! Only the fields the pollers read are modelled; everything else in the
//! response body is ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resource group as returned by `GET .../resourceGroups/{name}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: Option<ResourceGroupProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

/// A resource listed within a resource group (`$expand=provisioningState` lifts
/// the provisioning state to the top level)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericResourceExpanded {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

/// One page of an ARM list operation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// A CDN (Front Door) custom domain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomain {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Option<CustomDomainProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomainProperties {
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub domain_validation_state: Option<DomainValidationState>,
    #[serde(default)]
    pub deployment_status: Option<String>,
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

/// Validation state of a custom domain's ownership challenge
///
/// Values the service adds later land in [`DomainValidationState::Other`]
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DomainValidationState {
    Unknown,
    Submitting,
    Pending,
    Rejected,
    TimedOut,
    PendingRevalidation,
    Approved,
    RefreshingValidationToken,
    InternalError,
    Other(String),
}

impl DomainValidationState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "Unknown",
            Self::Submitting => "Submitting",
            Self::Pending => "Pending",
            Self::Rejected => "Rejected",
            Self::TimedOut => "TimedOut",
            Self::PendingRevalidation => "PendingRevalidation",
            Self::Approved => "Approved",
            Self::RefreshingValidationToken => "RefreshingValidationToken",
            Self::InternalError => "InternalError",
            Self::Other(value) => value,
        }
    }

    /// States the service never moves out of without operator action
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Rejected | Self::TimedOut | Self::InternalError)
    }
}

impl From<String> for DomainValidationState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Unknown" => Self::Unknown,
            "Submitting" => Self::Submitting,
            "Pending" => Self::Pending,
            "Rejected" => Self::Rejected,
            "TimedOut" => Self::TimedOut,
            "PendingRevalidation" => Self::PendingRevalidation,
            "Approved" => Self::Approved,
            "RefreshingValidationToken" => Self::RefreshingValidationToken,
            "InternalError" => Self::InternalError,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for DomainValidationState {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DomainValidationState> for String {
    fn from(value: DomainValidationState) -> Self {
        match value {
            DomainValidationState::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DomainValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
