//! ARM Client
//!
//! Main client for interacting with Azure Resource Manager, combining the
//! bearer token, endpoint and HTTP functionality.

use super::http::{ApiError, AzureHttpClient, ListResult, Response};
use super::models::Page;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use url::Url;

/// Public-cloud Resource Manager endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// API version for `Microsoft.Resources`
pub const RESOURCES_API_VERSION: &str = "2022-09-01";

/// API version for `Microsoft.Cdn`
pub const CDN_API_VERSION: &str = "2024-02-01";

/// Main ARM client
#[derive(Clone)]
pub struct ArmClient {
    http: AzureHttpClient,
    endpoint: Url,
    token: String,
}

impl ArmClient {
    /// Create a new ARM client against `endpoint`, authenticating with a bearer token
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid Resource Manager endpoint {:?}", endpoint))?;
        let http = AzureHttpClient::new().context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            token: token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build a URL for an ARM resource path with `api-version` and extra query parameters
    pub fn resource_url(
        &self,
        path: &str,
        api_version: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<Url, ApiError> {
        let mut url = self.endpoint.join(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", api_version);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET a single resource and decode its body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
    ) -> std::result::Result<Response<T>, ApiError> {
        let raw = self.http.get(url.as_str(), &self.token).await?;
        let model = raw.json::<T>().map_err(|source| ApiError::Decode {
            source,
            response: raw.clone(),
        })?;

        Ok(Response {
            model,
            http_response: raw,
        })
    }

    /// GET every page of a list operation (auto-paginate via `nextLink`)
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        first_page: Url,
    ) -> std::result::Result<ListResult<T>, ApiError> {
        let mut items = Vec::new();
        let mut next = Some(first_page);
        let mut latest_http_response = None;

        while let Some(url) = next.take() {
            let response = self.get_json::<Page<T>>(&url).await?;
            latest_http_response = Some(response.http_response);

            let Some(page) = response.model else {
                break;
            };
            items.extend(page.value);

            if let Some(link) = page.next_link.filter(|l| !l.is_empty()) {
                next = Some(Url::parse(&link)?);
            }
        }

        tracing::debug!("Listed {} items", items.len());

        Ok(ListResult {
            items,
            latest_http_response,
        })
    }
}
