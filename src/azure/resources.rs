//! Microsoft.Resources operations
//!
//! Resource group lookups and listing the resources nested inside a group.

use super::client::{ArmClient, RESOURCES_API_VERSION};
use super::http::{ApiError, ListResult, Response};
use super::ids::ResourceGroupId;
use super::models::{GenericResourceExpanded, ResourceGroup};

/// Query options for `Resources - List By Resource Group`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListByResourceGroupOptions {
    /// Comma-separated extra properties to include (`$expand`)
    pub expand: Option<String>,
    /// OData filter (`$filter`)
    pub filter: Option<String>,
    /// Page size (`$top`)
    pub top: Option<i64>,
}

impl ListByResourceGroupOptions {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(expand) = &self.expand {
            query.push(("$expand", expand.clone()));
        }
        if let Some(filter) = &self.filter {
            query.push(("$filter", filter.clone()));
        }
        if let Some(top) = self.top {
            query.push(("$top", top.to_string()));
        }
        query
    }
}

impl ArmClient {
    /// `GET /subscriptions/{sub}/resourceGroups/{name}`
    pub async fn resource_groups_get(
        &self,
        id: &ResourceGroupId,
    ) -> Result<Response<ResourceGroup>, ApiError> {
        let url = self.resource_url(&id.to_string(), RESOURCES_API_VERSION, &[])?;
        self.get_json(&url).await
    }

    /// `GET /subscriptions/{sub}/resourceGroups/{name}/resources`, following every page
    pub async fn resources_list_by_resource_group_complete(
        &self,
        id: &ResourceGroupId,
        options: &ListByResourceGroupOptions,
    ) -> Result<ListResult<GenericResourceExpanded>, ApiError> {
        let url = self.resource_url(
            &format!("{}/resources", id),
            RESOURCES_API_VERSION,
            &options.to_query(),
        )?;
        self.list_all(url).await
    }
}
