//! Query utilities for NetBox API
//!
//! Provides the offset-based pagination loop shared by every list endpoint.

use crate::common::{PaginatedResponse, Transport};
use crate::error::NetBoxError;
use crate::models::{Resource, decode_all};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Filter parameters for a list query (key -> value, keys unique)
pub type Filters = BTreeMap<String, String>;

/// A list request against one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Endpoint path relative to `/api/` (e.g. `ipam/prefixes/`)
    pub endpoint: String,
    /// Caller filters; `limit` and `offset` are always owned by the fetch loop
    pub filters: Filters,
    /// Stop after this many records
    pub cap: Option<usize>,
}

impl Query {
    /// Unfiltered, uncapped query against `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            filters: Filters::new(),
            cap: None,
        }
    }

    /// Add a single filter
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Merge a set of filters, later values win
    pub fn filters(mut self, filters: &Filters) -> Self {
        self.filters
            .extend(filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Cap the number of records returned
    pub fn with_cap(mut self, cap: Option<usize>) -> Self {
        self.cap = cap;
        self
    }

    /// Page size actually requested for a configured page size
    pub fn effective_page_size(&self, configured: usize) -> usize {
        let page_size = match self.cap {
            Some(cap) => configured.min(cap),
            None => configured,
        };
        page_size.max(1)
    }

    fn page_params(&self, limit: usize, offset: usize) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .filter(|(k, _)| k.as_str() != "limit" && k.as_str() != "offset")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push(("limit".to_string(), limit.to_string()));
        params.push(("offset".to_string(), offset.to_string()));
        params
    }
}

/// Fetch pages until the server stops signalling `next` or the cap is reached
///
/// Records keep server order. With a cap, the final page is truncated so exactly
/// `min(total, cap)` records come back. Any failed page aborts the whole fetch.
pub async fn fetch_all<T: Transport + ?Sized>(
    transport: &T,
    query: &Query,
    configured_page_size: usize,
) -> Result<Vec<Value>, NetBoxError> {
    if query.cap == Some(0) {
        debug!(endpoint = %query.endpoint, "Cap of zero, skipping request");
        return Ok(Vec::new());
    }

    let page_size = query.effective_page_size(configured_page_size);
    let mut offset = 0;
    let mut all_results = Vec::new();

    loop {
        debug!(endpoint = %query.endpoint, limit = page_size, offset, "Fetching page");

        let body = transport
            .get_json(&query.endpoint, &query.page_params(page_size, offset))
            .await?;
        let page: PaginatedResponse<Value> =
            serde_json::from_value(body).map_err(|e| NetBoxError::Decode {
                endpoint: query.endpoint.clone(),
                reason: format!("not a paginated list response: {e}"),
            })?;

        let has_next = page.has_next();
        if page.results.is_empty() && has_next {
            debug!(endpoint = %query.endpoint, offset, "Empty page with next, continuing");
        }
        all_results.extend(page.results);

        if let Some(cap) = query.cap
            && all_results.len() >= cap
        {
            all_results.truncate(cap);
            break;
        }

        if !has_next {
            break;
        }

        offset += page_size;
    }

    info!("Fetched {} records from {}", all_results.len(), query.endpoint);
    Ok(all_results)
}

/// Query resources of one kind and decode them
pub async fn query_resources<R: Resource, T: Transport + ?Sized>(
    transport: &T,
    filters: &Filters,
    cap: Option<usize>,
    configured_page_size: usize,
) -> Result<Vec<R>, NetBoxError> {
    let query = Query::new(R::ENDPOINT).filters(filters).with_cap(cap);
    let raw = fetch_all(transport, &query, configured_page_size).await?;
    decode_all(raw)
}
