//! Common utilities for NetBox API client
//!
//! Provides the GET-only transport shared by the fetcher and the prober.

pub mod query;

use crate::config::NetBoxSettings;
use crate::error::NetBoxError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Paginated response wrapper from NetBox API
///
/// Only the presence of `next` matters to the fetch loop; its content is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Total matching records
    #[serde(default)]
    pub count: Option<u64>,
    /// Next page URL
    #[serde(default)]
    pub next: Option<Value>,
    /// Previous page URL
    #[serde(default)]
    pub previous: Option<Value>,
    /// Records on this page
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// Whether the server signalled a further page
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Read-only transport to the NetBox API
///
/// There is deliberately no way to issue anything other than GET through this trait.
/// Paths are relative to `<base url>/api/` (e.g. `ipam/prefixes/`).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` with query parameters and decode the body as JSON
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, NetBoxError>;

    /// GET `path` and return the 2xx status without decoding the body
    async fn get_status(&self, path: &str, params: &[(String, String)]) -> Result<StatusCode, NetBoxError>;
}

/// HTTP client wrapper with authentication
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: &str, token: String) -> Self {
        Self {
            client,
            api_url: format!("{}/api", base_url.trim_end_matches('/')),
            token,
        }
    }

    /// Build a client from connection settings (timeout and TLS verification applied)
    pub fn from_settings(settings: &NetBoxSettings) -> Result<Self, NetBoxError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .user_agent(concat!("nbpull/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetBoxError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::new(client, &settings.url, settings.token.clone()))
    }

    /// Get the API root (`<base url>/api`)
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Build a full URL from a path relative to the API root
    pub fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Build query string from parameters
    pub fn build_query_string(params: &[(String, String)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    async fn send(&self, path: &str, params: &[(String, String)]) -> Result<reqwest::Response, NetBoxError> {
        let mut url = self.build_url(path);
        if !params.is_empty() {
            url = format!("{}?{}", url, Self::build_query_string(params));
        }
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| NetBoxError::from_request(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetBoxError::from_status(path, status, &body));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl Transport for HttpClient {
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, NetBoxError> {
        let response = self.send(path, params).await?;
        let response_text = response
            .text()
            .await
            .map_err(|e| NetBoxError::from_request(path, e))?;

        serde_json::from_str(&response_text).map_err(|e| NetBoxError::Decode {
            endpoint: path.to_string(),
            reason: format!(
                "{} - Response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            ),
        })
    }

    async fn get_status(&self, path: &str, params: &[(String, String)]) -> Result<StatusCode, NetBoxError> {
        let response = self.send(path, params).await?;
        Ok(response.status())
    }
}
