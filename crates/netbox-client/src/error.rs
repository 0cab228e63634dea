//! NetBox client errors

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of response body characters carried in an error
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors that can occur when reading from the NetBox API
#[derive(Debug, Error)]
pub enum NetBoxError {
    /// HTTP request/response error not covered by a more specific variant
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// NetBox answered with a non-2xx status
    #[error("GET {endpoint} failed: {status} - {body}")]
    Status {
        /// Requested path
        endpoint: String,
        /// Response status
        status: StatusCode,
        /// Response body, truncated
        body: String,
    },

    /// Authentication failed (invalid token, missing permissions)
    #[error("Authentication failed for {endpoint}: {status}")]
    Authentication {
        /// Requested path
        endpoint: String,
        /// 401 or 403
        status: StatusCode,
    },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body was not the JSON shape we expected
    #[error("Error decoding response from {endpoint}: {reason}")]
    Decode {
        /// Requested path
        endpoint: String,
        /// Parser message
        reason: String,
    },

    /// A record is missing a required field or has the wrong type
    #[error("Invalid {kind} record at index {index}: {reason}")]
    Validation {
        /// Record kind, e.g. `prefix`
        kind: &'static str,
        /// Position in the result set
        index: usize,
        /// Decoder message
        reason: String,
    },

    /// Connection settings are absent or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NetBoxError {
    /// Whether this error was raised before any network call was attempted
    pub fn is_config(&self) -> bool {
        matches!(self, NetBoxError::InvalidConfig(_))
    }

    /// HTTP status code attached to the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            NetBoxError::Status { status, .. } | NetBoxError::Authentication { status, .. } => {
                Some(*status)
            }
            NetBoxError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            NetBoxError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Classify a reqwest failure into connection, timeout or generic HTTP errors
    pub(crate) fn from_request(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetBoxError::Timeout(endpoint.to_string())
        } else if err.is_connect() {
            NetBoxError::Connection(format!("{endpoint}: {err}"))
        } else {
            NetBoxError::Http(err)
        }
    }

    /// Map a non-2xx status to the matching error variant
    pub(crate) fn from_status(endpoint: &str, status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NetBoxError::Authentication {
                endpoint: endpoint.to_string(),
                status,
            },
            StatusCode::NOT_FOUND => NetBoxError::NotFound(format!("{endpoint} - {}", truncate(body))),
            _ => NetBoxError::Status {
                endpoint: endpoint.to_string(),
                status,
                body: truncate(body),
            },
        }
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_auth_codes() {
        let err = NetBoxError::from_status("ipam/prefixes/", StatusCode::FORBIDDEN, "denied");
        assert!(matches!(err, NetBoxError::Authentication { .. }));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_from_status_truncates_body() {
        let body = "x".repeat(2000);
        let err = NetBoxError::from_status("ipam/vlans/", StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            NetBoxError::Status { body, status, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_is_config() {
        assert!(NetBoxError::InvalidConfig("missing".into()).is_config());
        assert!(!NetBoxError::Timeout("status/".into()).is_config());
    }
}
