//! Application configuration options

use std::time::Duration;

use crate::storage::layout::StorageLayout;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Cluster API base URL
    pub cluster_base_url: String,

    /// Cluster API bearer token
    pub cluster_token: String,

    /// Salt API base URL
    pub salt_base_url: String,

    /// Salt eauth username
    pub salt_username: String,

    /// Storage layout paths
    pub storage: StorageLayout,

    /// Enable the polling worker
    pub enable_poller: bool,

    /// Enable the event watcher worker
    pub enable_watcher: bool,

    /// Poller worker options
    pub poller: poller::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            cluster_base_url: "https://localhost:6443".to_string(),
            cluster_token: String::new(),
            salt_base_url: "https://localhost:4507".to_string(),
            salt_username: "admin".to_string(),
            storage: StorageLayout::default(),
            enable_poller: true,
            enable_watcher: true,
            poller: poller::Options::default(),
        }
    }
}

/// Lifecycle options for the daemon
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}
