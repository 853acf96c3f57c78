//! Azure Resource Manager interaction module
//!
//! The typed REST collaborator the pollers query: one HTTP GET per operation,
//! decoded into the handful of models the pollers inspect.
//!
//! # Module Structure
//!
//! - [`client`] - ARM client: endpoint, token, URL building and pagination
//! - [`http`] - HTTP wrapper, raw responses and [`ApiError`](http::ApiError)
//! - [`ids`] - Resource identifiers
//! - [`models`] - Response models
//! - [`resources`] - Resource group operations
//! - [`cdn`] - CDN custom domain operations
//!
//! # Example
//!
//! ```ignore
//! use azurerm_pollers::azure::{client::ArmClient, ids::ResourceGroupId};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = ArmClient::new("https://management.azure.com", "token")?;
//!     let group = client.resource_groups_get(&ResourceGroupId::new("sub", "rg1")).await?;
//!     Ok(())
//! }
//! ```

pub mod cdn;
pub mod client;
pub mod http;
pub mod ids;
pub mod models;
pub mod resources;
