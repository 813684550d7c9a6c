//! Salt API operations

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::errors::ConsoleError;
use crate::http::client::{Auth, HttpClient};
use crate::models::job::{DeployResponse, DeployReturn, JobResponse};
use crate::session::{SaltCreds, SaltToken};

/// Salt API surface used by the node flows
#[async_trait]
pub trait SaltApi: Send + Sync {
    /// Log in and obtain an API token
    async fn authenticate(&self, creds: &SaltCreds) -> Result<SaltToken, ConsoleError>;

    /// Start an async deployment orchestration for a node
    async fn deploy_node(
        &self,
        token: &str,
        node_name: &str,
        version: &str,
    ) -> Result<DeployReturn, ConsoleError>;

    /// Look up the current result of a job
    async fn lookup_jid(&self, token: &str, jid: &str) -> Result<JobResponse, ConsoleError>;
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(rename = "return", default)]
    returns: Vec<AuthReturn>,
}

#[derive(Debug, Deserialize)]
struct AuthReturn {
    token: String,
}

/// Salt API client
pub struct SaltClient {
    http: HttpClient,
}

impl SaltClient {
    /// Create a client against the given Salt API endpoint
    pub fn new(base_url: &str) -> Result<Self, ConsoleError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    /// Base URL of the Salt API, also hosting the event stream
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }
}

#[async_trait]
impl SaltApi for SaltClient {
    async fn authenticate(&self, creds: &SaltCreds) -> Result<SaltToken, ConsoleError> {
        let body = json!({
            "eauth": "kubernetes_rbac",
            "username": creds.username,
            "token": creds.token,
        });

        let response: AuthResponse = self.http.post("/login", Auth::None, &body).await?;
        let ret = response
            .returns
            .into_iter()
            .next()
            .ok_or_else(|| ConsoleError::AuthError("login returned no token".to_string()))?;

        Ok(SaltToken { raw: ret.token })
    }

    async fn deploy_node(
        &self,
        token: &str,
        node_name: &str,
        version: &str,
    ) -> Result<DeployReturn, ConsoleError> {
        let body = json!({
            "client": "runner_async",
            "fun": "state.orchestrate",
            "arg": ["orchestrate.deploy_node"],
            "kwarg": {
                "saltenv": format!("quarry-{}", version),
                "pillar": { "orchestrate": { "node_name": node_name } },
            },
        });

        let response: DeployResponse =
            self.http.post("/", Auth::XAuthToken(token), &body).await?;
        response
            .returns
            .into_iter()
            .next()
            .ok_or_else(|| ConsoleError::ApiError("deployment returned no job id".to_string()))
    }

    async fn lookup_jid(&self, token: &str, jid: &str) -> Result<JobResponse, ConsoleError> {
        let path = format!("/jobs/{}", jid);
        self.http.get(&path, Auth::XAuthToken(token)).await
    }
}
