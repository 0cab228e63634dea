//! Integration tests for NetBox client
//!
//! These tests require a running NetBox instance.
//! Set NETBOX_URL and NETBOX_TOKEN environment variables to run.
//! Every call is a read; nothing is written to the instance.

use netbox_client::{Filters, NetBoxClient, NetBoxClientTrait, NetBoxSettings};

fn live_client() -> NetBoxClient {
    let url = std::env::var("NETBOX_URL").unwrap_or_else(|_| "http://localhost:8001".to_string());
    let token = std::env::var("NETBOX_TOKEN").expect("NETBOX_TOKEN environment variable must be set");

    NetBoxClient::new(&NetBoxSettings::new(url, token)).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running NetBox instance
async fn test_probe_default_endpoints() {
    let outcomes = live_client().probe(None).await;

    for outcome in &outcomes {
        println!("{:<22} {}", outcome.endpoint, outcome.detail);
    }
    assert!(outcomes[0].ok, "status/ should be reachable");
}

#[tokio::test]
#[ignore]
async fn test_query_prefixes() {
    let prefixes = live_client()
        .query_prefixes(&Filters::new(), Some(10))
        .await
        .expect("Failed to query prefixes");

    assert!(prefixes.len() <= 10);
    println!("Found {} prefixes", prefixes.len());
}

#[tokio::test]
#[ignore]
async fn test_query_ip_addresses() {
    let ips = live_client()
        .query_ip_addresses(&Filters::new(), Some(10))
        .await
        .expect("Failed to query IP addresses");

    println!("Found {} IP addresses", ips.len());
}

#[tokio::test]
#[ignore]
async fn test_query_vlans() {
    let vlans = live_client()
        .query_vlans(&Filters::new(), Some(10))
        .await
        .expect("Failed to query VLANs");

    println!("Found {} VLANs", vlans.len());
}

#[tokio::test]
#[ignore]
async fn test_query_vrfs() {
    let vrfs = live_client()
        .query_vrfs(&Filters::new(), None)
        .await
        .expect("Failed to query VRFs");

    println!("Found {} VRFs", vrfs.len());
}
