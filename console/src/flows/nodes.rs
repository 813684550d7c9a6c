//! Node lifecycle flows
//!
//! The dashboard's node sagas as explicit async task functions: create a
//! node, deploy it through the Salt orchestration API, reconcile the local
//! job ledger, and feed deploy events into the per-job log. Each flow is
//! logically sequential; every external call is checked and a failure ends
//! the remaining steps of that flow.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::ConsoleError;
use crate::events::stream::{EventStream, StreamItem};
use crate::http::nodes::ClusterApi;
use crate::http::salt::SaltApi;
use crate::models::event::SaltEvent;
use crate::models::node::{CreateNodeSpec, Node};
use crate::nav::Router;
use crate::notify::Notifier;
use crate::session::SaltSession;
use crate::state::NodesState;
use crate::storage::ledger::JobLedger;

/// Node lifecycle flow runner
pub struct NodeFlows {
    cluster: Arc<dyn ClusterApi>,
    salt: Arc<dyn SaltApi>,
    session: Arc<SaltSession>,
    ledger: JobLedger,
    state: Arc<NodesState>,
    notifier: Notifier,
    router: Arc<Router>,
}

impl NodeFlows {
    pub fn new(
        cluster: Arc<dyn ClusterApi>,
        salt: Arc<dyn SaltApi>,
        session: Arc<SaltSession>,
        ledger: JobLedger,
        state: Arc<NodesState>,
        notifier: Notifier,
        router: Arc<Router>,
    ) -> Self {
        Self {
            cluster,
            salt,
            session,
            ledger,
            state,
            notifier,
            router,
        }
    }

    /// Refresh the node list from the cluster API
    pub async fn fetch_nodes(&self) -> Result<(), ConsoleError> {
        let nodes = self.cluster.list_nodes().await?;
        let summaries = nodes.iter().map(Node::summarize).collect();
        self.state.set_list(summaries).await;
        Ok(())
    }

    /// Create a node, then refresh the inventory and report the outcome.
    ///
    /// On success the ledger is garbage-collected for all currently known
    /// nodes before the refetch; refetch or GC failures are logged but do
    /// not stop the navigation and success notification. On failure the
    /// server message lands in the create-error slot, which only
    /// [`NodesState::clear_create_error`] resets.
    pub async fn create_node(&self, spec: &CreateNodeSpec) {
        match self.cluster.create_node(&spec.to_manifest()).await {
            Ok(_) => {
                if let Err(e) = self.reconcile_ledger().await {
                    warn!("Job ledger reconciliation failed: {}", e);
                }
                if let Err(e) = self.fetch_nodes().await {
                    warn!("Node list refresh failed: {}", e);
                }
                self.router.push("/nodes");
                self.notifier.success(
                    "Node Creation",
                    format!("Node {} has been created successfully.", spec.name),
                );
            }
            Err(e) => {
                self.state.set_create_error(e.to_string()).await;
                self.notifier.error(
                    "Node Creation",
                    format!("Node {} creation has failed.", spec.name),
                );
            }
        }
    }

    /// Start a deployment for a node.
    ///
    /// On success the job is probed once, recorded in the ledger and the
    /// progress route is pushed; the returned jid identifies the run. On
    /// failure only an error notification is emitted: no navigation, no
    /// ledger write. The deploy path never garbage-collects the ledger.
    pub async fn deploy_node(&self, name: &str, version: &str) -> Option<String> {
        let token = match self.session.token().await {
            Ok(token) => token,
            Err(e) => {
                self.notifier.error("Node Deployment", e.to_string());
                return None;
            }
        };

        match self.salt.deploy_node(&token, name, version).await {
            Err(e) => {
                self.notifier.error("Node Deployment", e.to_string());
                None
            }
            Ok(ret) => {
                let jid = ret.jid;
                info!("Deployment of {} started as job {}", name, jid);

                // One-shot status probe; the result is not consumed
                if let Err(e) = self.salt.lookup_jid(&token, &jid).await {
                    debug!("Initial job probe failed: {}", e);
                }

                if let Err(e) = self.ledger.record_job(&jid, name).await {
                    self.notifier.error("Node Deployment", e.to_string());
                    return None;
                }

                self.router.push(format!("/nodes/deploy/{}", jid));
                Some(jid)
            }
        }
    }

    /// Remove ledger records whose remote job result shows completion, for
    /// every currently known node.
    pub async fn reconcile_ledger(&self) -> Result<(), ConsoleError> {
        for name in self.state.node_names().await {
            self.reconcile_node_job(&name).await?;
        }
        Ok(())
    }

    /// Reconcile the ledger record of a single node, if it has one
    pub async fn reconcile_node_job(&self, name: &str) -> Result<(), ConsoleError> {
        let Some(jid) = self.ledger.jid_for_name(name).await? else {
            return Ok(());
        };

        let token = self.session.token().await?;
        let result = self.salt.lookup_jid(&token, &jid).await?;
        if result.is_completed(&jid) {
            debug!("Job {} for node {} completed, dropping ledger record", jid, name);
            self.ledger.remove_job(&jid).await?;
        }
        Ok(())
    }

    /// Consume a stream, appending every event whose tag contains the jid to
    /// the job's log. Runs until the stream ends; the stream is owned here
    /// and released when the loop exits.
    pub async fn subscribe_deploy_events(&self, mut stream: EventStream, jid: &str) {
        loop {
            match stream.next().await {
                StreamItem::Event(event) => {
                    if event.matches_jid(jid) {
                        self.state.push_event(jid, event).await;
                    }
                }
                StreamItem::End => {
                    debug!("Event stream for job {} ended", jid);
                    break;
                }
            }
        }
    }

    /// Route one event to every ledger-tracked job whose jid its tag
    /// contains (daemon mode). Duplicate ledger records append once.
    pub async fn route_event(&self, event: &SaltEvent) -> Result<(), ConsoleError> {
        let mut seen = HashSet::new();
        for record in self.ledger.entries().await? {
            if event.matches_jid(&record.jid) && seen.insert(record.jid.clone()) {
                self.state.push_event(&record.jid, event.clone()).await;
            }
        }
        Ok(())
    }
}
