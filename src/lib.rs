//! Custom long-running-operation pollers for Azure Resource Manager
//!
//! Some ARM actions expose no operation to poll. A new resource group can read
//! as missing for a while after creation, and a CDN custom domain is only
//! usable once its DNS validation has been approved. The pollers in [`pollers`]
//! turn each of these into a state machine that the generic [`pollers::Poller`]
//! drives to a terminal state, using the thin REST client in [`azure`].

pub mod azure;
pub mod config;
pub mod pollers;

/// Version injected at compile time via AZURERM_POLLERS_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("AZURERM_POLLERS_VERSION") {
    Some(v) => v,
    None => "dev",
};
