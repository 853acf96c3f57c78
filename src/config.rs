//! Configuration Management
//!
//! Handles persistent configuration storage for azurerm-pollers, with
//! environment overrides for the values ARM tooling usually reads from `ARM_*`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::azure::client::DEFAULT_ENDPOINT;
use crate::pollers::DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW;

pub const ENV_SUBSCRIPTION_ID: &str = "ARM_SUBSCRIPTION_ID";
pub const ENV_ENDPOINT: &str = "ARM_ENDPOINT";
pub const ENV_ACCESS_TOKEN: &str = "ARM_ACCESS_TOKEN";

/// User configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Subscription the resources live in
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Resource Manager endpoint (sovereign clouds use a different host)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub features: Features,
}

/// Poll-loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Overall deadline for one operation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_dropped_connections")]
    pub dropped_connections_allowed: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            dropped_connections_allowed: default_dropped_connections(),
        }
    }
}

impl PollingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    60 * 60
}

fn default_dropped_connections() -> u32 {
    DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW
}

/// Behaviour toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Features {
    #[serde(default)]
    pub resource_group: ResourceGroupFeatures,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupFeatures {
    /// Refuse to delete a resource group that still contains resources
    #[serde(default = "default_true")]
    pub prevent_deletion_if_contains_resources: bool,
}

impl Default for ResourceGroupFeatures {
    fn default() -> Self {
        Self {
            prevent_deletion_if_contains_resources: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("azurerm-pollers").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Apply `ARM_*` environment overrides
    pub fn with_env(mut self) -> Self {
        if let Some(subscription) = non_empty_env(ENV_SUBSCRIPTION_ID) {
            self.subscription_id = Some(subscription);
        }
        if let Some(endpoint) = non_empty_env(ENV_ENDPOINT) {
            self.endpoint = Some(endpoint);
        }
        self
    }

    /// Get effective subscription (CLI > env/config)
    pub fn effective_subscription(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.subscription_id.clone())
            .filter(|s| !s.is_empty())
    }

    /// Get effective endpoint (env/config > public cloud)
    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Set subscription and save
    pub fn set_subscription(&mut self, subscription_id: &str) -> Result<()> {
        self.subscription_id = Some(subscription_id.to_string());
        self.save()
    }
}

/// Bearer token for ARM, read from `ARM_ACCESS_TOKEN`
pub fn access_token() -> Result<String> {
    non_empty_env(ENV_ACCESS_TOKEN).with_context(|| {
        format!(
            "No access token configured. Set {} (e.g. from `az account get-access-token`)",
            ENV_ACCESS_TOKEN
        )
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
