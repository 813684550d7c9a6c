//! Application state management

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::app::options::AppOptions;
use crate::errors::ConsoleError;
use crate::flows::nodes::NodeFlows;
use crate::http::nodes::{ClusterApi, ClusterClient};
use crate::http::salt::{SaltApi, SaltClient};
use crate::nav::Router;
use crate::notify::{self, Notification, Notifier};
use crate::session::{SaltCreds, SaltSession};
use crate::state::NodesState;
use crate::storage::ledger::JobLedger;

/// Main application state
pub struct AppState {
    /// Salt API base URL, also hosting the event stream
    pub salt_base_url: String,

    /// Salt session
    pub session: Arc<SaltSession>,

    /// Deployment job ledger
    pub ledger: JobLedger,

    /// Node view state
    pub nodes: Arc<NodesState>,

    /// Notification sender
    pub notifier: Notifier,

    /// Route history
    pub router: Arc<Router>,

    /// Node lifecycle flows
    pub flows: Arc<NodeFlows>,
}

impl AppState {
    /// Initialize application state; returns the state and the receiver end
    /// of the notification channel.
    pub fn init(
        options: &AppOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>), ConsoleError> {
        info!("Initializing console state...");

        let cluster: Arc<dyn ClusterApi> = Arc::new(ClusterClient::new(
            &options.cluster_base_url,
            &options.cluster_token,
        )?);
        let salt_client = Arc::new(SaltClient::new(&options.salt_base_url)?);
        let salt: Arc<dyn SaltApi> = salt_client.clone();

        let session = Arc::new(SaltSession::new(
            salt.clone(),
            SaltCreds {
                username: options.salt_username.clone(),
                token: options.cluster_token.clone(),
            },
        ));

        let ledger = JobLedger::new(options.storage.jobs_file());
        let nodes = Arc::new(NodesState::new());
        let (notifier, notifications) = notify::channel();
        let router = Arc::new(Router::new());

        let flows = Arc::new(NodeFlows::new(
            cluster,
            salt,
            session.clone(),
            ledger.clone(),
            nodes.clone(),
            notifier.clone(),
            router.clone(),
        ));

        let state = Self {
            salt_base_url: salt_client.base_url().to_string(),
            session,
            ledger,
            nodes,
            notifier,
            router,
            flows,
        };

        Ok((state, notifications))
    }
}
