//! In-memory paged transport
//!
//! Serves stored records with NetBox's limit/offset semantics so the real fetch
//! loop and prober can be exercised without a server.

use crate::common::Transport;
use crate::error::NetBoxError;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A request seen by [`PagedTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Endpoint path
    pub path: String,
    /// Query parameters in request order
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of a query parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
struct Failure {
    endpoint: String,
    offset: Option<usize>,
    status: StatusCode,
}

/// Transport backed by per-endpoint record lists
#[derive(Debug, Clone, Default)]
pub struct PagedTransport {
    records: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    failures: Arc<Mutex<Vec<Failure>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl PagedTransport {
    /// Empty transport: every list is empty, every status is 200
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` from `endpoint` (e.g. `ipam/prefixes/`)
    pub fn with_records(self, endpoint: &str, records: Vec<Value>) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), records);
        self
    }

    /// Answer every request to `endpoint` with `status`
    pub fn fail_with(self, endpoint: &str, status: StatusCode) -> Self {
        self.failures.lock().unwrap().push(Failure {
            endpoint: endpoint.to_string(),
            offset: None,
            status,
        });
        self
    }

    /// Answer the page at `offset` of `endpoint` with `status`
    pub fn fail_at_offset(self, endpoint: &str, offset: usize, status: StatusCode) -> Self {
        self.failures.lock().unwrap().push(Failure {
            endpoint: endpoint.to_string(),
            offset: Some(offset),
            status,
        });
        self
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, path: &str, params: &[(String, String)]) -> RecordedRequest {
        let request = RecordedRequest {
            path: path.to_string(),
            params: params.to_vec(),
        };
        self.requests.lock().unwrap().push(request.clone());
        request
    }

    fn check_failure(&self, path: &str, offset: usize) -> Result<(), NetBoxError> {
        let failures = self.failures.lock().unwrap();
        match failures
            .iter()
            .find(|f| f.endpoint == path && f.offset.is_none_or(|o| o == offset))
        {
            Some(failure) => Err(NetBoxError::from_status(path, failure.status, "mock failure")),
            None => Ok(()),
        }
    }

    /// Resolve `<endpoint><id>/` against the stored records
    fn lookup_single(&self, path: &str) -> Option<Result<Value, NetBoxError>> {
        let (endpoint, id) = path.trim_end_matches('/').rsplit_once('/')?;
        let id: u64 = id.parse().ok()?;
        let records = self.records.lock().unwrap();
        let stored = records.get(&format!("{endpoint}/"))?;

        Some(
            stored
                .iter()
                .find(|r| r["id"].as_u64() == Some(id))
                .cloned()
                .ok_or_else(|| NetBoxError::from_status(path, StatusCode::NOT_FOUND, "{\"detail\":\"Not found.\"}")),
        )
    }
}

#[async_trait::async_trait]
impl Transport for PagedTransport {
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, NetBoxError> {
        let request = self.record(path, params);
        let offset: usize = request.param("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        self.check_failure(path, offset)?;

        if let Some(single) = self.lookup_single(path) {
            return single;
        }

        let all = self
            .records
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default();
        let limit: usize = request
            .param("limit")
            .and_then(|v| v.parse().ok())
            .unwrap_or(all.len());

        let results: Vec<Value> = all.iter().skip(offset).take(limit).cloned().collect();
        let next = if offset + limit < all.len() {
            json!(format!("/api/{path}?limit={limit}&offset={}", offset + limit))
        } else {
            Value::Null
        };

        Ok(json!({
            "count": all.len(),
            "next": next,
            "previous": null,
            "results": results,
        }))
    }

    async fn get_status(&self, path: &str, params: &[(String, String)]) -> Result<StatusCode, NetBoxError> {
        let request = self.record(path, params);
        let offset: usize = request.param("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        self.check_failure(path, offset)?;
        Ok(StatusCode::OK)
    }
}
