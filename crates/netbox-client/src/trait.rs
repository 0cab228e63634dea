//! NetBoxClient trait for mocking
//!
//! This trait abstracts the NetBoxClient to enable mocking in unit tests.
//! The concrete NetBoxClient implements this trait, and tests can use mock implementations.
//! Every operation is a read; there are no create, update or delete methods.

use crate::common::query::{Filters, Query};
use crate::error::NetBoxError;
use crate::models::*;
use crate::probe::ProbeOutcome;
use serde_json::Value;

/// Trait for read-only NetBox API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait NetBoxClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Fetch raw records for an arbitrary list endpoint
    async fn fetch(&self, query: &Query) -> Result<Vec<Value>, NetBoxError>;

    /// Fetch a single object by API path
    async fn get_single(&self, path: &str) -> Result<Value, NetBoxError>;

    // IPAM Operations
    /// List prefixes matching `filters`, at most `cap`
    async fn query_prefixes(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Prefix>, NetBoxError>;
    /// List IP addresses matching `filters`, at most `cap`
    async fn query_ip_addresses(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<IpAddress>, NetBoxError>;
    /// List VLANs matching `filters`, at most `cap`
    async fn query_vlans(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Vlan>, NetBoxError>;
    /// List VRFs matching `filters`, at most `cap`
    async fn query_vrfs(&self, filters: &Filters, cap: Option<usize>) -> Result<Vec<Vrf>, NetBoxError>;
    /// Get one prefix by ID
    async fn get_prefix(&self, id: u64) -> Result<Prefix, NetBoxError>;

    /// Probe connectivity; `None` probes the default endpoint set
    async fn probe(&self, endpoints: Option<&[String]>) -> Vec<ProbeOutcome>;
}
