//! Shared test fixtures: mock API clients recording call order

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use quarry_console::errors::ConsoleError;
use quarry_console::filesys::file::File;
use quarry_console::flows::nodes::NodeFlows;
use quarry_console::http::nodes::ClusterApi;
use quarry_console::http::salt::SaltApi;
use quarry_console::models::job::{
    DeployReturn, JobInfo, JobResponse, RecipientReturn, StateReturn,
};
use quarry_console::models::node::Node;
use quarry_console::nav::Router;
use quarry_console::notify::{self, Notification};
use quarry_console::session::{SaltCreds, SaltSession, SaltToken};
use quarry_console::state::NodesState;
use quarry_console::storage::ledger::JobLedger;

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(calls: &CallLog, call: impl Into<String>) {
    calls.lock().unwrap().push(call.into());
}

pub fn recorded(calls: &CallLog) -> Vec<String> {
    calls.lock().unwrap().clone()
}

/// Node with just a name, as returned by the mock cluster
pub fn named_node(name: &str) -> Node {
    let mut node = Node::default();
    node.metadata.name = name.to_string();
    node
}

/// Mock cluster API
pub struct MockCluster {
    pub calls: CallLog,
    pub nodes: Vec<Node>,
    pub create_error: Option<String>,
}

impl MockCluster {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            nodes: Vec::new(),
            create_error: None,
        }
    }
}

#[async_trait]
impl ClusterApi for MockCluster {
    async fn list_nodes(&self) -> Result<Vec<Node>, ConsoleError> {
        record(&self.calls, "list_nodes");
        Ok(self.nodes.clone())
    }

    async fn create_node(&self, manifest: &Node) -> Result<Node, ConsoleError> {
        record(&self.calls, "create_node");
        match &self.create_error {
            Some(message) => Err(ConsoleError::ApiError(message.clone())),
            None => Ok(manifest.clone()),
        }
    }
}

/// Mock Salt API
pub struct MockSalt {
    pub calls: CallLog,
    /// Jids whose lookup reports completion
    pub completed: Vec<String>,
    /// Jid returned by deploy; `None` makes the deploy fail
    pub deploy_jid: Option<String>,
}

impl MockSalt {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            completed: Vec::new(),
            deploy_jid: None,
        }
    }
}

fn completed_response(jid: &str) -> JobResponse {
    let mut result = HashMap::new();
    result.insert(
        "bootstrap".to_string(),
        RecipientReturn {
            ret: StateReturn { success: true },
        },
    );
    let mut jobs = HashMap::new();
    jobs.insert(jid.to_string(), JobInfo { result });
    JobResponse {
        returns: vec![jobs],
    }
}

#[async_trait]
impl SaltApi for MockSalt {
    async fn authenticate(&self, _creds: &SaltCreds) -> Result<SaltToken, ConsoleError> {
        record(&self.calls, "authenticate");
        Ok(SaltToken {
            raw: "test-token".to_string(),
        })
    }

    async fn deploy_node(
        &self,
        _token: &str,
        _node_name: &str,
        _version: &str,
    ) -> Result<DeployReturn, ConsoleError> {
        record(&self.calls, "deploy_node");
        match &self.deploy_jid {
            Some(jid) => Ok(DeployReturn { jid: jid.clone() }),
            None => Err(ConsoleError::ApiError("deployment rejected".to_string())),
        }
    }

    async fn lookup_jid(&self, _token: &str, jid: &str) -> Result<JobResponse, ConsoleError> {
        record(&self.calls, format!("lookup_jid:{}", jid));
        if self.completed.iter().any(|completed| completed == jid) {
            Ok(completed_response(jid))
        } else {
            Ok(JobResponse::default())
        }
    }
}

/// Flow runner wired to mocks and a temp-file ledger
pub struct Harness {
    pub flows: NodeFlows,
    pub state: Arc<NodesState>,
    pub router: Arc<Router>,
    pub ledger: JobLedger,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

pub fn harness(cluster: MockCluster, salt: MockSalt) -> Harness {
    let cluster: Arc<dyn ClusterApi> = Arc::new(cluster);
    let salt: Arc<dyn SaltApi> = Arc::new(salt);

    let session = Arc::new(SaltSession::new(salt.clone(), SaltCreds::default()));
    let ledger = JobLedger::new(File::new(
        std::env::temp_dir()
            .join(format!("quarry-flows-{}", uuid::Uuid::new_v4()))
            .join("jobs.json"),
    ));
    let state = Arc::new(NodesState::new());
    let (notifier, notifications) = notify::channel();
    let router = Arc::new(Router::new());

    let flows = NodeFlows::new(
        cluster,
        salt,
        session,
        ledger.clone(),
        state.clone(),
        notifier,
        router.clone(),
    );

    Harness {
        flows,
        state,
        router,
        ledger,
        notifications,
    }
}
