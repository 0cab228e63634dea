//! Connectivity probes
//!
//! One GET per endpoint, in order. Failures are reported as data, never raised,
//! so a single broken endpoint does not hide the state of the others.

use crate::common::Transport;
use crate::error::NetBoxError;
use tracing::{debug, warn};

/// Basic health endpoint, probed without parameters
pub const STATUS_ENDPOINT: &str = "status/";

/// Endpoints probed when the caller does not supply any
pub const DEFAULT_PROBE_ENDPOINTS: [&str; 5] = [
    STATUS_ENDPOINT,
    "ipam/prefixes/",
    "ipam/ip-addresses/",
    "ipam/vlans/",
    "ipam/vrfs/",
];

/// Result of probing a single endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Endpoint path relative to `/api/`
    pub endpoint: String,
    /// Whether the endpoint answered with a success status
    pub ok: bool,
    /// Status line or failure kind, e.g. `403 Forbidden`
    pub detail: String,
}

/// Probe each endpoint once, in input order
pub async fn probe<T: Transport + ?Sized>(transport: &T, endpoints: &[String]) -> Vec<ProbeOutcome> {
    let mut outcomes = Vec::with_capacity(endpoints.len());

    for endpoint in endpoints {
        let params = if endpoint == STATUS_ENDPOINT {
            Vec::new()
        } else {
            vec![("limit".to_string(), "1".to_string())]
        };

        debug!("PROBE GET {}", endpoint);
        let outcome = match transport.get_status(endpoint, &params).await {
            Ok(status) => ProbeOutcome {
                endpoint: endpoint.clone(),
                ok: true,
                detail: format!("{} OK", status.as_u16()),
            },
            Err(e) => {
                let detail = describe_failure(&e);
                warn!(endpoint = %endpoint, "Probe failed: {}", detail);
                ProbeOutcome {
                    endpoint: endpoint.clone(),
                    ok: false,
                    detail,
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

/// Default endpoint list as owned strings
pub fn default_endpoints() -> Vec<String> {
    DEFAULT_PROBE_ENDPOINTS.iter().map(|e| (*e).to_string()).collect()
}

fn describe_failure(err: &NetBoxError) -> String {
    match err {
        NetBoxError::Connection(_) => "Connection refused".to_string(),
        NetBoxError::Timeout(_) => "Timeout".to_string(),
        other => match other.status() {
            Some(status) => format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ),
            None => other.to_string(),
        },
    }
}
