//! IPAM operations for MockNetBoxClient
//!
//! Handles prefixes, IP addresses, VLANs and VRFs

use super::MockNetBoxClient;
use super::helpers::matches_filters;
use crate::common::query::{Filters, Query};
use crate::error::NetBoxError;
use crate::models::*;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Filter and cap one store the way the server-side fetch would
pub(crate) fn select<R: Resource>(
    client: &MockNetBoxClient,
    store: &Arc<Mutex<Vec<R>>>,
    filters: &Filters,
    cap: Option<usize>,
) -> Result<Vec<R>, NetBoxError> {
    client.record_query(Query::new(R::ENDPOINT).filters(filters).with_cap(cap));
    client.check_search(R::ENDPOINT, filters)?;

    let records = store.lock().unwrap();
    let matched = records.iter().filter(|record| {
        serde_json::to_value(*record)
            .map(|value| matches_filters(&value, filters))
            .unwrap_or(false)
    });

    Ok(match cap {
        Some(cap) => matched.take(cap).cloned().collect(),
        None => matched.cloned().collect(),
    })
}

fn raw<R: Resource>(records: Vec<R>) -> Result<Vec<Value>, NetBoxError> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(|e| NetBoxError::Decode {
            endpoint: R::ENDPOINT.to_string(),
            reason: e.to_string(),
        }))
        .collect()
}

pub async fn fetch(client: &MockNetBoxClient, query: &Query) -> Result<Vec<Value>, NetBoxError> {
    match query.endpoint.as_str() {
        Prefix::ENDPOINT => raw(select(client, &client.prefixes, &query.filters, query.cap)?),
        IpAddress::ENDPOINT => raw(select(client, &client.ip_addresses, &query.filters, query.cap)?),
        Vlan::ENDPOINT => raw(select(client, &client.vlans, &query.filters, query.cap)?),
        Vrf::ENDPOINT => raw(select(client, &client.vrfs, &query.filters, query.cap)?),
        other => Err(NetBoxError::NotFound(format!("{other} is not served by the mock"))),
    }
}

fn find<R: Resource>(store: &Arc<Mutex<Vec<R>>>, id: u64) -> Option<R> {
    store.lock().unwrap().iter().find(|r| r.id() == id).cloned()
}

pub async fn get_single(client: &MockNetBoxClient, path: &str) -> Result<Value, NetBoxError> {
    let not_found = || NetBoxError::NotFound(format!("{path} not found"));
    let (endpoint, id) = path.trim_end_matches('/').rsplit_once('/').ok_or_else(not_found)?;
    let id: u64 = id.parse().map_err(|_| not_found())?;

    let value = match format!("{endpoint}/").as_str() {
        Prefix::ENDPOINT => find(&client.prefixes, id).map(serde_json::to_value),
        IpAddress::ENDPOINT => find(&client.ip_addresses, id).map(serde_json::to_value),
        Vlan::ENDPOINT => find(&client.vlans, id).map(serde_json::to_value),
        Vrf::ENDPOINT => find(&client.vrfs, id).map(serde_json::to_value),
        _ => None,
    };

    value.ok_or_else(not_found)?.map_err(|e| NetBoxError::Decode {
        endpoint: path.to_string(),
        reason: e.to_string(),
    })
}

pub async fn get_prefix(client: &MockNetBoxClient, id: u64) -> Result<Prefix, NetBoxError> {
    find(&client.prefixes, id).ok_or_else(|| NetBoxError::NotFound(format!("Prefix {} not found", id)))
}
