//! NetBox API client
//!
//! Read-only client for the IPAM list endpoints:
//! /api/ipam/prefixes/, /api/ipam/ip-addresses/, /api/ipam/vlans/ and /api/ipam/vrfs/

use crate::common::query::{self, Filters, Query};
use crate::common::{HttpClient, Transport};
use crate::config::NetBoxSettings;
use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use crate::probe::{self, ProbeOutcome};
use serde_json::Value;
use tracing::debug;

/// NetBox API client
///
/// Generic over its transport so the fetch logic can run against an in-memory
/// server in tests; production code uses the reqwest-backed [`HttpClient`].
#[derive(Debug, Clone)]
pub struct NetBoxClient<T = HttpClient> {
    transport: T,
    base_url: String,
    page_size: usize,
}

impl NetBoxClient<HttpClient> {
    /// Create a new NetBox client from validated settings
    pub fn new(settings: &NetBoxSettings) -> Result<Self, NetBoxError> {
        settings.validate()?;
        let transport = HttpClient::from_settings(settings)?;
        Ok(Self::with_transport(transport, settings.url.clone(), settings.page_size))
    }
}

impl<T: Transport> NetBoxClient<T> {
    /// Create a client around an existing transport
    pub fn with_transport(transport: T, base_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured records per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch raw records, following pagination up to the query's cap
    pub async fn fetch(&self, query: &Query) -> Result<Vec<Value>, NetBoxError> {
        query::fetch_all(&self.transport, query, self.page_size).await
    }

    /// Fetch a single object (no pagination)
    ///
    /// # Arguments
    /// * `path` - API path relative to `/api/` (e.g., "ipam/prefixes/42/")
    pub async fn get_single(&self, path: &str) -> Result<Value, NetBoxError> {
        debug!("Fetching single object {}", path);
        self.transport.get_json(path, &[]).await
    }

    /// Query and decode one resource kind
    pub async fn query<R: Resource>(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<R>, NetBoxError> {
        query::query_resources(&self.transport, filters, cap, self.page_size).await
    }

    /// Get a resource by ID
    ///
    /// # Returns
    /// * `Ok(R)` - The decoded object
    /// * `Err(NetBoxError::NotFound)` - If NetBox has no object with that ID
    pub async fn get_resource<R: Resource>(&self, id: u64) -> Result<R, NetBoxError> {
        let raw = self.get_single(&format!("{}{}/", R::ENDPOINT, id)).await?;
        decode(raw)
    }

    /// Probe connectivity; `None` probes the default endpoint set
    pub async fn probe(&self, endpoints: Option<&[String]>) -> Vec<ProbeOutcome> {
        match endpoints {
            Some(endpoints) => probe::probe(&self.transport, endpoints).await,
            None => probe::probe(&self.transport, &probe::default_endpoints()).await,
        }
    }
}

#[async_trait::async_trait]
impl<T: Transport> NetBoxClientTrait for NetBoxClient<T> {
    fn base_url(&self) -> &str {
        NetBoxClient::base_url(self)
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Value>, NetBoxError> {
        NetBoxClient::fetch(self, query).await
    }

    async fn get_single(&self, path: &str) -> Result<Value, NetBoxError> {
        NetBoxClient::get_single(self, path).await
    }

    async fn query_prefixes(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Prefix>, NetBoxError> {
        self.query(filters, cap).await
    }

    async fn query_ip_addresses(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<IpAddress>, NetBoxError> {
        self.query(filters, cap).await
    }

    async fn query_vlans(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Vlan>, NetBoxError> {
        self.query(filters, cap).await
    }

    async fn query_vrfs(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Vrf>, NetBoxError> {
        self.query(filters, cap).await
    }

    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        self.get_resource(id).await
    }

    async fn probe(&self, endpoints: Option<&[String]>) -> Vec<ProbeOutcome> {
        NetBoxClient::probe(self, endpoints).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::PagedTransport;
    use reqwest::StatusCode;
    use serde_json::json;

    fn client(transport: PagedTransport, page_size: usize) -> NetBoxClient<PagedTransport> {
        NetBoxClient::with_transport(transport, "https://netbox.example.com/", page_size)
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let mut settings = NetBoxSettings::new("https://netbox.example.com", "token");
        settings.page_size = 0;
        let err = NetBoxClient::new(&settings).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_new_builds_http_client() {
        let settings = NetBoxSettings::new("https://netbox.example.com/", "token");
        let client = NetBoxClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "https://netbox.example.com");
        assert_eq!(client.transport().api_url(), "https://netbox.example.com/api");
        assert_eq!(client.page_size(), 100);
    }

    #[tokio::test]
    async fn test_query_vlans_with_cap() {
        let vlans = (1..=5)
            .map(|i| json!({"id": i, "display": format!("VLAN {i}"), "vid": 100 + i, "name": format!("v{i}")}))
            .collect();
        let client = client(PagedTransport::new().with_records("ipam/vlans/", vlans), 2);

        let result = NetBoxClientTrait::query_vlans(&client, &Filters::new(), Some(3)).await.unwrap();
        assert_eq!(result.iter().map(|v| v.vid).collect::<Vec<_>>(), vec![101, 102, 103]);
    }

    #[tokio::test]
    async fn test_query_surfaces_validation_error() {
        let client = client(
            PagedTransport::new().with_records("ipam/vrfs/", vec![json!({"id": 1, "display": "no name"})]),
            10,
        );
        let err = client.query::<Vrf>(&Filters::new(), None).await.unwrap_err();
        assert!(matches!(err, NetBoxError::Validation { kind: "VRF", .. }));
    }

    #[tokio::test]
    async fn test_get_resource_by_id() {
        let transport = PagedTransport::new().with_records(
            "ipam/prefixes/",
            vec![json!({"id": 42, "display": "10.0.0.0/8", "prefix": "10.0.0.0/8"})],
        );
        let client = client(transport, 10);

        let prefix: Prefix = client.get_resource(42).await.unwrap();
        assert_eq!(prefix.prefix, "10.0.0.0/8");

        let missing = client.get_resource::<Prefix>(7).await.unwrap_err();
        assert!(matches!(missing, NetBoxError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_probe_default_endpoints() {
        let client = client(PagedTransport::new().fail_with("ipam/vrfs/", StatusCode::UNAUTHORIZED), 10);
        let outcomes = client.probe(None).await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[4].detail, "401 Unauthorized");
    }
}
