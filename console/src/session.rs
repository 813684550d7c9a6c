//! Salt API session management
//!
//! Caches the token obtained from the Salt login endpoint and logs in lazily
//! on first use.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::errors::ConsoleError;
use crate::http::salt::SaltApi;

/// Credentials for Salt eauth login
#[derive(Debug, Clone, Default)]
pub struct SaltCreds {
    /// eauth username
    pub username: String,

    /// Cluster bearer token presented to the kubernetes_rbac eauth backend
    pub token: String,
}

/// An authenticated Salt API token
#[derive(Debug, Clone)]
pub struct SaltToken {
    pub raw: String,
}

/// Session over the Salt API
pub struct SaltSession {
    salt: Arc<dyn SaltApi>,
    creds: SaltCreds,
    cached_token: RwLock<Option<SaltToken>>,
}

impl SaltSession {
    /// Create a new session; no login is performed until a token is needed
    pub fn new(salt: Arc<dyn SaltApi>, creds: SaltCreds) -> Self {
        Self {
            salt,
            creds,
            cached_token: RwLock::new(None),
        }
    }

    /// Get the session token, logging in on first use
    pub async fn token(&self) -> Result<String, ConsoleError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                return Ok(token.raw.clone());
            }
        }

        info!("Logging in to the Salt API as {}", self.creds.username);
        let token = self.salt.authenticate(&self.creds).await?;

        let mut cached = self.cached_token.write().await;
        *cached = Some(token.clone());
        Ok(token.raw)
    }

    /// Drop the cached token, forcing a re-login on next use
    pub async fn invalidate(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }
}
