//! Helper functions for building NetBox records in mock implementations

use crate::common::query::Filters;
use crate::models::*;
use serde_json::{Value, json};
use std::net::IpAddr;

/// Helper functions for creating records with realistic nested references
pub struct Helpers {
    base_url: String,
}

impl Helpers {
    /// Builders whose record URLs point at `base_url`
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    /// Nested reference to any object, e.g. `create_nested("tenancy/tenants", 3, "Ops")`
    pub fn create_nested(&self, path: &str, id: u64, name: &str) -> Reference {
        let mut reference = Reference::nested(id, name);
        if let Reference::Nested { extra, .. } = &mut reference {
            extra.insert(
                "url".to_string(),
                json!(format!("{}/api/{}/{}/", self.base_url, path.trim_matches('/'), id)),
            );
            extra.insert("name".to_string(), json!(name));
            extra.insert("slug".to_string(), json!(name.to_lowercase().replace(' ', "-")));
        }
        reference
    }

    /// Choice field, label derived from the value (`"active"` -> `"Active"`)
    pub fn create_choice(&self, value: &str) -> Reference {
        let mut chars = value.chars();
        let label = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Reference::choice(value, label)
    }

    fn common_extra(&self, endpoint: &str, id: u64) -> Extra {
        let now = chrono::Utc::now().to_rfc3339();
        let mut extra = Extra::new();
        extra.insert("url".to_string(), json!(format!("{}/api/{}{}/", self.base_url, endpoint, id)));
        extra.insert("custom_fields".to_string(), json!({}));
        extra.insert("created".to_string(), json!(now));
        extra.insert("last_updated".to_string(), json!(now));
        extra
    }

    /// Prefix with the given status and no relations
    pub fn create_prefix(&self, id: u64, prefix: &str, status: &str) -> Prefix {
        Prefix {
            id,
            display: prefix.to_string(),
            prefix: prefix.to_string(),
            status: Some(self.create_choice(status)),
            vrf: None,
            tenant: None,
            site: None,
            vlan: None,
            role: None,
            is_pool: false,
            mark_utilized: false,
            description: String::new(),
            tags: Vec::new(),
            extra: self.common_extra(Prefix::ENDPOINT, id),
        }
    }

    /// IP address with the given status
    pub fn create_ip_address(&self, id: u64, address: &str, status: &str) -> IpAddress {
        IpAddress {
            id,
            display: address.to_string(),
            address: address.to_string(),
            status: Some(self.create_choice(status)),
            vrf: None,
            tenant: None,
            role: None,
            assigned_object_type: None,
            assigned_object_id: None,
            dns_name: String::new(),
            description: String::new(),
            tags: Vec::new(),
            extra: self.common_extra(IpAddress::ENDPOINT, id),
        }
    }

    /// Active VLAN
    pub fn create_vlan(&self, id: u64, vid: u16, name: &str) -> Vlan {
        Vlan {
            id,
            display: format!("{name} ({vid})"),
            vid,
            name: name.to_string(),
            status: Some(self.create_choice("active")),
            tenant: None,
            site: None,
            group: None,
            role: None,
            description: String::new(),
            tags: Vec::new(),
            extra: self.common_extra(Vlan::ENDPOINT, id),
        }
    }

    /// VRF enforcing uniqueness
    pub fn create_vrf(&self, id: u64, name: &str, rd: Option<&str>) -> Vrf {
        Vrf {
            id,
            display: name.to_string(),
            name: name.to_string(),
            rd: rd.map(str::to_string),
            tenant: None,
            enforce_unique: true,
            description: String::new(),
            tags: Vec::new(),
            extra: self.common_extra(Vrf::ENDPOINT, id),
        }
    }
}

/// Parse `addr/len` into (address bits, prefix length, address width)
pub fn parse_cidr(cidr: &str) -> Option<(u128, u8, u8)> {
    let (addr, len) = cidr.trim().split_once('/')?;
    let len: u8 = len.parse().ok()?;
    let (bits, width) = match addr.parse::<IpAddr>().ok()? {
        IpAddr::V4(v4) => (u32::from(v4) as u128, 32),
        IpAddr::V6(v6) => (u128::from(v6), 128),
    };
    (len <= width).then_some((bits, len, width))
}

fn network_bits(bits: u128, len: u8, width: u8) -> u128 {
    if len == 0 {
        return 0;
    }
    let host_bits = u32::from(width - len);
    (bits >> host_bits) << host_bits
}

/// Whether `child` (a network) lies inside or equals `parent`
pub fn network_contains(parent: &str, child: &str) -> bool {
    match (parent_and_child(parent, child), parse_cidr(child)) {
        (Some((p_bits, p_len, width, c_bits)), Some((_, c_len, _))) => {
            p_len <= c_len && network_bits(p_bits, p_len, width) == network_bits(c_bits, p_len, width)
        }
        _ => false,
    }
}

/// Whether the host part of `address` (e.g. `10.0.0.5/24`) lies inside `parent`
pub fn address_within(parent: &str, address: &str) -> bool {
    match parent_and_child(parent, address) {
        Some((p_bits, p_len, width, c_bits)) => {
            network_bits(p_bits, p_len, width) == network_bits(c_bits, p_len, width)
        }
        None => false,
    }
}

fn parent_and_child(parent: &str, child: &str) -> Option<(u128, u8, u8, u128)> {
    let (p_bits, p_len, p_width) = parse_cidr(parent)?;
    let (c_bits, _, c_width) = parse_cidr(child)?;
    (p_width == c_width).then_some((p_bits, p_len, p_width, c_bits))
}

/// Apply NetBox-style filters to a serialized record
///
/// `q` on a network-bearing record is a containment search when it parses as
/// CIDR and a case-insensitive substring search otherwise. `parent` matches
/// addresses inside the given network. Any other key compares against the
/// field of the same name, looking through nested references and tag lists.
pub fn matches_filters(record: &Value, filters: &Filters) -> bool {
    filters.iter().all(|(key, wanted)| match key.as_str() {
        "q" => matches_search(record, wanted),
        "parent" => record["address"]
            .as_str()
            .is_some_and(|address| address_within(wanted, address)),
        "limit" | "offset" => true,
        "tag" => record["tags"]
            .as_array()
            .is_some_and(|tags| tags.iter().any(|t| field_matches(t, wanted))),
        _ => match record.get(key) {
            Some(field) => field_matches(field, wanted),
            None => true,
        },
    })
}

fn matches_search(record: &Value, q: &str) -> bool {
    if parse_cidr(q).is_some() {
        if let Some(prefix) = record["prefix"].as_str() {
            return network_contains(prefix, q);
        }
        if let Some(address) = record["address"].as_str() {
            return address_within(q, address);
        }
    }

    let needle = q.to_lowercase();
    ["display", "prefix", "address", "name", "description", "dns_name", "rd"]
        .iter()
        .filter_map(|field| record[*field].as_str())
        .any(|text| text.to_lowercase().contains(&needle))
}

fn field_matches(field: &Value, wanted: &str) -> bool {
    match field {
        Value::String(s) => s.eq_ignore_ascii_case(wanted),
        Value::Number(n) => n.to_string() == wanted,
        Value::Bool(b) => b.to_string() == wanted,
        Value::Array(items) => items.iter().any(|item| field_matches(item, wanted)),
        Value::Object(map) => ["id", "value", "slug", "name", "display"]
            .iter()
            .filter_map(|k| map.get(*k))
            .any(|v| field_matches(v, wanted)),
        Value::Null => false,
    }
}
