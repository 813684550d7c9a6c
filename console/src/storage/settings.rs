//! Settings file management

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ConsoleError;
use crate::logs::LogLevel;

/// Console agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Cluster API configuration
    #[serde(default)]
    pub cluster: ClusterSettings,

    /// Salt API configuration
    #[serde(default)]
    pub salt: SaltSettings,

    /// Enable the inventory polling worker in daemon mode
    #[serde(default = "default_true")]
    pub enable_poller: bool,

    /// Enable the deploy event watcher in daemon mode
    #[serde(default = "default_true")]
    pub enable_watcher: bool,

    /// Polling interval in seconds
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_polling_interval() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            cluster: ClusterSettings::default(),
            salt: SaltSettings::default(),
            enable_poller: true,
            enable_watcher: true,
            polling_interval_secs: 30,
        }
    }
}

impl Settings {
    /// Validate that the configured endpoints are well-formed URLs
    pub fn validate(&self) -> Result<(), ConsoleError> {
        Url::parse(&self.cluster.base_url)
            .map_err(|e| ConsoleError::ConfigError(format!("cluster.base_url: {}", e)))?;
        Url::parse(&self.salt.base_url)
            .map_err(|e| ConsoleError::ConfigError(format!("salt.base_url: {}", e)))?;
        Ok(())
    }
}

/// Kubernetes cluster API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Base URL for the cluster API
    #[serde(default = "default_cluster_url")]
    pub base_url: String,

    /// Bearer token for the cluster API
    #[serde(default)]
    pub token: String,
}

fn default_cluster_url() -> String {
    "https://localhost:6443".to_string()
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            base_url: default_cluster_url(),
            token: String::new(),
        }
    }
}

/// Salt orchestration API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaltSettings {
    /// Base URL for the Salt API
    #[serde(default = "default_salt_url")]
    pub base_url: String,

    /// Username for Salt eauth
    #[serde(default = "default_salt_username")]
    pub username: String,
}

fn default_salt_url() -> String {
    "https://localhost:4507".to_string()
}

fn default_salt_username() -> String {
    "admin".to_string()
}

impl Default for SaltSettings {
    fn default() -> Self {
        Self {
            base_url: default_salt_url(),
            username: default_salt_username(),
        }
    }
}
