//! Cluster API node operations

use async_trait::async_trait;

use crate::errors::ConsoleError;
use crate::http::client::{Auth, HttpClient};
use crate::models::node::{Node, NodeList};

/// Cluster API surface used by the node flows
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch all nodes
    async fn list_nodes(&self) -> Result<Vec<Node>, ConsoleError>;

    /// Create a node from a manifest
    async fn create_node(&self, manifest: &Node) -> Result<Node, ConsoleError>;
}

/// Cluster API client
pub struct ClusterClient {
    http: HttpClient,
    token: String,
}

impl ClusterClient {
    /// Create a client against the given cluster API endpoint
    pub fn new(base_url: &str, token: &str) -> Result<Self, ConsoleError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl ClusterApi for ClusterClient {
    async fn list_nodes(&self) -> Result<Vec<Node>, ConsoleError> {
        let response: NodeList = self
            .http
            .get("/api/v1/nodes", Auth::Bearer(&self.token))
            .await?;
        Ok(response.items)
    }

    async fn create_node(&self, manifest: &Node) -> Result<Node, ConsoleError> {
        self.http
            .post("/api/v1/nodes", Auth::Bearer(&self.token), manifest)
            .await
    }
}
