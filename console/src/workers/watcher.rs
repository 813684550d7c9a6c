//! Event watcher worker
//!
//! Daemon-mode consumer of the Salt event stream: every incoming event is
//! routed to the ledger-tracked jobs its tag matches. One connection is held
//! for the worker's lifetime; when the stream ends it is not reopened.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{error, info};

use crate::events::stream::{EventStream, StreamItem};
use crate::flows::nodes::NodeFlows;
use crate::session::SaltSession;

/// Run the event watcher worker
pub async fn run(
    salt_base_url: String,
    session: Arc<SaltSession>,
    flows: Arc<NodeFlows>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Event watcher starting...");

    let token = match session.token().await {
        Ok(token) => token,
        Err(e) => {
            error!("Event watcher could not authenticate: {}", e);
            return;
        }
    };

    let mut stream = match EventStream::connect(&salt_base_url, &token).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Event watcher could not connect: {}", e);
            return;
        }
    };

    info!("Event watcher connected");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Event watcher shutting down...");
                break;
            }
            item = stream.next() => {
                match item {
                    StreamItem::Event(event) => {
                        if let Err(e) = flows.route_event(&event).await {
                            error!("Failed to route event {}: {}", event.tag, e);
                        }
                    }
                    StreamItem::End => {
                        info!("Event stream ended, watcher exiting");
                        break;
                    }
                }
            }
        }
    }

    stream.close();
}
