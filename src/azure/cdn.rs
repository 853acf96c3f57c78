//! Microsoft.Cdn operations

use super::client::{ArmClient, CDN_API_VERSION};
use super::http::{ApiError, Response};
use super::ids::CustomDomainId;
use super::models::CustomDomain;

impl ArmClient {
    /// `GET .../providers/Microsoft.Cdn/profiles/{profile}/customDomains/{name}`
    pub async fn custom_domains_get(
        &self,
        id: &CustomDomainId,
    ) -> Result<Response<CustomDomain>, ApiError> {
        let url = self.resource_url(&id.to_string(), CDN_API_VERSION, &[])?;
        self.get_json(&url).await
    }
}
