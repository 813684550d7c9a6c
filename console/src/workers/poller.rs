//! Polling worker for periodic inventory refresh

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::flows::nodes::NodeFlows;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Initial delay before first poll
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Run the poller worker
pub async fn run<S, F>(
    options: &Options,
    flows: &NodeFlows,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    // Initial delay
    sleep_fn(options.initial_delay).await;

    loop {
        debug!("Refreshing node inventory...");

        if let Err(e) = flows.reconcile_ledger().await {
            error!("Job ledger reconciliation failed: {}", e);
        }

        match flows.fetch_nodes().await {
            Ok(()) => {
                debug!("Node inventory refreshed");
            }
            Err(e) => {
                error!("Failed to refresh node inventory: {}", e);
            }
        }

        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with next poll
            }
        }
    }
}
