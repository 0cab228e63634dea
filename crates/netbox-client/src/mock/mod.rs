//! Mock NetBoxClient for unit testing
//!
//! This module provides a mock implementation of NetBoxClientTrait that can be used
//! in unit tests without requiring a running NetBox instance.
//!
//! - `ipam.rs` - IPAM reads (prefixes, IP addresses, VLANs, VRFs)
//! - `transport.rs` - paged in-memory transport for exercising the real fetch loop
//! - `helpers.rs` - record builders, CIDR containment and filter matching

#![allow(clippy::unwrap_used, reason = "test double; a poisoned lock means a test already panicked")]

mod helpers;
mod ipam;
mod transport;

pub use helpers::{Helpers, address_within, network_contains, parse_cidr};
pub use transport::{PagedTransport, RecordedRequest};

use crate::common::query::{Filters, Query};
use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use crate::probe::{self, ProbeOutcome};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Mock NetBoxClient for testing
///
/// Records are returned in insertion order. Filters follow NetBox's matching
/// closely enough for reconciliation tests.
#[derive(Clone, Default)]
pub struct MockNetBoxClient {
    pub(crate) base_url: String,
    pub(crate) prefixes: Arc<Mutex<Vec<Prefix>>>,
    pub(crate) ip_addresses: Arc<Mutex<Vec<IpAddress>>>,
    pub(crate) vlans: Arc<Mutex<Vec<Vlan>>>,
    pub(crate) vrfs: Arc<Mutex<Vec<Vrf>>>,
    /// Search terms (`q`) that fail with a 500
    pub(crate) failing_searches: Arc<Mutex<HashSet<String>>>,
    /// Endpoint -> failure detail reported by `probe`
    pub(crate) probe_failures: Arc<Mutex<HashMap<String, String>>>,
    pub(crate) queries: Arc<Mutex<Vec<Query>>>,
}

impl MockNetBoxClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Add a prefix to the mock store (for test setup)
    pub fn add_prefix(&self, prefix: Prefix) {
        self.prefixes.lock().unwrap().push(prefix);
    }

    /// Add an IP address to the mock store (for test setup)
    pub fn add_ip_address(&self, ip: IpAddress) {
        self.ip_addresses.lock().unwrap().push(ip);
    }

    /// Add a VLAN
    pub fn add_vlan(&self, vlan: Vlan) {
        self.vlans.lock().unwrap().push(vlan);
    }

    /// Add a VRF
    pub fn add_vrf(&self, vrf: Vrf) {
        self.vrfs.lock().unwrap().push(vrf);
    }

    /// Make any query whose `q` equals `search` fail with a server error
    pub fn fail_search(&self, search: impl Into<String>) {
        self.failing_searches.lock().unwrap().insert(search.into());
    }

    /// Make `probe` report `endpoint` as failed with `detail`
    pub fn fail_probe(&self, endpoint: impl Into<String>, detail: impl Into<String>) {
        self.probe_failures
            .lock()
            .unwrap()
            .insert(endpoint.into(), detail.into());
    }

    /// Queries received so far, in order
    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    /// Get helpers instance
    pub fn helpers(&self) -> Helpers {
        Helpers::new(self.base_url.clone())
    }

    pub(crate) fn record_query(&self, query: Query) {
        self.queries.lock().unwrap().push(query);
    }

    pub(crate) fn check_search(&self, endpoint: &str, filters: &Filters) -> Result<(), NetBoxError> {
        match filters.get("q") {
            Some(q) if self.failing_searches.lock().unwrap().contains(q) => Err(NetBoxError::Status {
                endpoint: endpoint.to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: format!("search for {q} failed"),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl NetBoxClientTrait for MockNetBoxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Value>, NetBoxError> {
        ipam::fetch(self, query).await
    }

    async fn get_single(&self, path: &str) -> Result<Value, NetBoxError> {
        ipam::get_single(self, path).await
    }

    // IPAM Operations - delegated to ipam module
    async fn query_prefixes(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Prefix>, NetBoxError> {
        ipam::select(self, &self.prefixes, filters, cap)
    }

    async fn query_ip_addresses(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<IpAddress>, NetBoxError> {
        ipam::select(self, &self.ip_addresses, filters, cap)
    }

    async fn query_vlans(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Vlan>, NetBoxError> {
        ipam::select(self, &self.vlans, filters, cap)
    }

    async fn query_vrfs(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Vrf>, NetBoxError> {
        ipam::select(self, &self.vrfs, filters, cap)
    }

    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError> {
        ipam::get_prefix(self, id).await
    }

    async fn probe(&self, endpoints: Option<&[String]>) -> Vec<ProbeOutcome> {
        let endpoints = match endpoints {
            Some(endpoints) => endpoints.to_vec(),
            None => probe::default_endpoints(),
        };
        let failures = self.probe_failures.lock().unwrap();

        endpoints
            .into_iter()
            .map(|endpoint| match failures.get(&endpoint) {
                Some(detail) => ProbeOutcome {
                    endpoint,
                    ok: false,
                    detail: detail.clone(),
                },
                None => ProbeOutcome {
                    endpoint,
                    ok: true,
                    detail: "200 OK".to_string(),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock() -> MockNetBoxClient {
        let client = MockNetBoxClient::new("https://netbox.example.com");
        let helpers = client.helpers();
        client.add_prefix(helpers.create_prefix(1, "10.0.0.0/8", "container"));
        client.add_prefix(helpers.create_prefix(2, "10.32.16.0/20", "active"));
        client.add_prefix(helpers.create_prefix(3, "192.168.0.0/16", "active"));
        client
    }

    fn q(search: &str) -> Filters {
        Filters::from([("q".to_string(), search.to_string())])
    }

    #[tokio::test]
    async fn test_cidr_search_returns_containing_prefixes() {
        let client = mock();
        let found = client.query_prefixes(&q("10.32.16.0/20"), None).await.unwrap();
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cap_and_status_filter() {
        let client = mock();
        let mut filters = Filters::new();
        filters.insert("status".to_string(), "active".to_string());

        let found = client.query_prefixes(&filters, Some(1)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
        assert_eq!(client.queries()[0].cap, Some(1));
    }

    #[tokio::test]
    async fn test_failing_search() {
        let client = mock();
        client.fail_search("10.99.0.0/16");
        let err = client.query_prefixes(&q("10.99.0.0/16"), None).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_get_single_and_get_prefix() {
        let client = mock();
        let raw = client.get_single("ipam/prefixes/3/").await.unwrap();
        assert_eq!(raw["prefix"], "192.168.0.0/16");
        assert!(matches!(client.get_prefix(9).await, Err(NetBoxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_probe_reports_configured_failures() {
        let client = mock();
        client.fail_probe("ipam/vlans/", "403 Forbidden");
        let outcomes = client.probe(None).await;
        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().filter(|o| !o.ok).all(|o| o.endpoint == "ipam/vlans/"));
        assert_eq!(outcomes[3].detail, "403 Forbidden");
    }
}
