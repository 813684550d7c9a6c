//! HTTP client implementation

use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::ConsoleError;

/// Authentication scheme for a request
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <token>` (cluster API)
    Bearer(&'a str),
    /// `X-Auth-Token: <token>` (Salt API)
    XAuthToken(&'a str),
    /// No authentication (login endpoint)
    None,
}

/// HTTP client for API communication
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(request: RequestBuilder, auth: Auth<'_>) -> RequestBuilder {
        match auth {
            Auth::Bearer(token) => {
                request.header(header::AUTHORIZATION, format!("Bearer {}", token))
            }
            Auth::XAuthToken(token) => request.header("X-Auth-Token", token),
            Auth::None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: Auth<'_>,
    ) -> Result<T, ConsoleError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = Self::authorize(self.client.get(&url), auth);
        let response = request.send().await?;
        Self::into_body(response, "GET", &url).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        auth: Auth<'_>,
        body: &B,
    ) -> Result<T, ConsoleError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = Self::authorize(self.client.post(&url), auth).json(body);
        let response = request.send().await?;
        Self::into_body(response, "POST", &url).await
    }

    async fn into_body<T: DeserializeOwned>(
        response: reqwest::Response,
        method: &str,
        url: &str,
    ) -> Result<T, ConsoleError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} {} failed: {} - {}", method, url, status, body);
            return Err(ConsoleError::ApiError(extract_message(status, &body)));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// Pull the server-provided message out of an error body.
///
/// The cluster API returns a Status object with a `message` field; other
/// backends return plain text. Falls back to `<status>: <body>`.
fn extract_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{}: {}", status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_prefers_status_message() {
        let body = r#"{"kind":"Status","message":"nodes \"node-1\" already exists"}"#;
        assert_eq!(
            extract_message(reqwest::StatusCode::CONFLICT, body),
            "nodes \"node-1\" already exists"
        );
    }

    #[test]
    fn test_extract_message_falls_back_to_raw_body() {
        assert_eq!(
            extract_message(reqwest::StatusCode::UNAUTHORIZED, "no session"),
            "401 Unauthorized: no session"
        );
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = HttpClient::new("https://localhost:6443/").unwrap();
        assert_eq!(client.base_url(), "https://localhost:6443");
    }
}
