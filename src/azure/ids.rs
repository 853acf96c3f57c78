//! Resource identifiers
//!
//! Immutable value types naming the ARM resources the pollers watch. `Display`
//! renders the canonical ARM id, which is also the identity used in every
//! error message.

use std::fmt;

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupId {
    pub subscription_id: String,
    pub resource_group_name: String,
}

impl ResourceGroupId {
    pub fn new(subscription_id: impl Into<String>, resource_group_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
        }
    }
}

impl fmt::Display for ResourceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group_name
        )
    }
}

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Cdn/profiles/{profileName}/customDomains/{customDomainName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomDomainId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub profile_name: String,
    pub custom_domain_name: String,
}

impl CustomDomainId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        profile_name: impl Into<String>,
        custom_domain_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            profile_name: profile_name.into(),
            custom_domain_name: custom_domain_name.into(),
        }
    }

    /// The resource group containing this domain's profile
    pub fn resource_group(&self) -> ResourceGroupId {
        ResourceGroupId::new(&self.subscription_id, &self.resource_group_name)
    }
}

impl fmt::Display for CustomDomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/providers/Microsoft.Cdn/profiles/{}/customDomains/{}",
            self.resource_group(),
            self.profile_name,
            self.custom_domain_name
        )
    }
}
