//! NetBox REST API Client
//!
//! A read-only Rust client for the NetBox IPAM API. Every request this crate
//! can issue is a GET.
//!
//! # Example
//!
//! ```no_run
//! use netbox_client::{Filters, NetBoxClient, NetBoxSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = NetBoxSettings::load(".env")?;
//! let client = NetBoxClient::new(&settings)?;
//!
//! // Query active prefixes, stopping after 50 records
//! let mut filters = Filters::new();
//! filters.insert("status".to_string(), "active".to_string());
//! let prefixes = client.query::<netbox_client::Prefix>(&filters, Some(50)).await?;
//!
//! // Check which endpoints the token can read
//! for outcome in client.probe(None).await {
//!     println!("{} {}", outcome.endpoint, outcome.detail);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Pagination**: limit/offset paging with an optional record cap
//! - **Open records**: unknown fields survive decoding and re-serialization
//! - **Connectivity probe**: per-endpoint reachability report
//! - **Test doubles**: `test-util` exposes an in-memory client and transport

pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod netbox_trait;
pub mod probe;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::NetBoxClient;
pub use common::query::{Filters, Query};
pub use common::{HttpClient, PaginatedResponse, Transport};
pub use config::NetBoxSettings;
pub use error::NetBoxError;
pub use models::*;
pub use netbox_trait::NetBoxClientTrait;
pub use probe::ProbeOutcome;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockNetBoxClient, PagedTransport};
