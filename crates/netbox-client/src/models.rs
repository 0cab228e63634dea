//! NetBox API models
//!
//! These models cover the IPAM serializers nbpull reads: prefixes, IP addresses,
//! VLANs and VRFs. Only `id`, `display` and each resource's primary field are
//! required. Anything else NetBox sends (urls, timestamps, custom fields, fields
//! added by newer NetBox versions) is kept in `extra` and written back out
//! unchanged when a record is serialized.

use crate::error::NetBoxError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unknown fields preserved verbatim
pub type Extra = Map<String, Value>;

/// A list resource nbpull can read
pub trait Resource: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Endpoint path relative to `/api/`
    const ENDPOINT: &'static str;
    /// Human readable kind, used in errors and output
    const KIND: &'static str;

    /// NetBox object ID
    fn id(&self) -> u64;
    /// Server-rendered label
    fn display(&self) -> &str;
    /// Fields outside the known set
    fn extra(&self) -> &Extra;
}

/// Reference to a related object or a choice field
///
/// NetBox returns related objects as `{"id": 1, "display": "DC1", ...}` and
/// choice fields (status, IP role) as `{"value": "active", "label": "Active"}`.
/// Both render through [`Reference::display`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// Related object
    Nested {
        /// Object ID
        id: u64,
        /// Object label
        display: String,
        /// Remaining fields (url, name, slug, ...)
        #[serde(flatten)]
        extra: Extra,
    },
    /// Choice field
    Choice {
        /// Machine value, e.g. `active`
        value: String,
        /// Human label, e.g. `Active`
        label: String,
        /// Remaining fields
        #[serde(flatten)]
        extra: Extra,
    },
}

impl Reference {
    /// Reference to a related object with no extra fields
    pub fn nested(id: u64, display: impl Into<String>) -> Self {
        Reference::Nested {
            id,
            display: display.into(),
            extra: Extra::new(),
        }
    }

    /// Choice value with its label
    pub fn choice(value: impl Into<String>, label: impl Into<String>) -> Self {
        Reference::Choice {
            value: value.into(),
            label: label.into(),
            extra: Extra::new(),
        }
    }

    /// Display label (the label for choice fields)
    pub fn display(&self) -> &str {
        match self {
            Reference::Nested { display, .. } => display,
            Reference::Choice { label, .. } => label,
        }
    }

    /// Machine value of a choice field
    pub fn value(&self) -> Option<&str> {
        match self {
            Reference::Choice { value, .. } => Some(value),
            Reference::Nested { .. } => None,
        }
    }

    /// Identifier of a related object
    pub fn id(&self) -> Option<u64> {
        match self {
            Reference::Nested { id, .. } => Some(*id),
            Reference::Choice { .. } => None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// IPAM prefix (a network block in CIDR notation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefix {
    /// Object ID
    pub id: u64,
    /// Server-rendered label
    pub display: String,
    /// Network in CIDR notation, e.g. `192.168.1.0/24`
    pub prefix: String,
    /// Status choice
    #[serde(default)]
    pub status: Option<Reference>,
    /// Owning VRF
    #[serde(default)]
    pub vrf: Option<Reference>,
    /// Owning tenant
    #[serde(default)]
    pub tenant: Option<Reference>,
    /// Site scope
    #[serde(default)]
    pub site: Option<Reference>,
    /// Assigned VLAN
    #[serde(default)]
    pub vlan: Option<Reference>,
    /// Role (an object for prefixes and VLANs, a choice for IP addresses)
    #[serde(default)]
    pub role: Option<Reference>,
    /// All addresses usable, including network and broadcast
    #[serde(default)]
    pub is_pool: bool,
    /// Treat as fully utilized
    #[serde(default)]
    pub mark_utilized: bool,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Assigned tags
    #[serde(default)]
    pub tags: Vec<Reference>,
    /// Fields outside the known set, kept verbatim
    #[serde(flatten)]
    pub extra: Extra,
}

/// IPAM IP address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpAddress {
    /// Object ID
    pub id: u64,
    /// Server-rendered label
    pub display: String,
    /// Address with mask, e.g. `192.168.1.1/24`
    pub address: String,
    /// Status choice
    #[serde(default)]
    pub status: Option<Reference>,
    /// Owning VRF
    #[serde(default)]
    pub vrf: Option<Reference>,
    /// Owning tenant
    #[serde(default)]
    pub tenant: Option<Reference>,
    /// Role (an object for prefixes and VLANs, a choice for IP addresses)
    #[serde(default)]
    pub role: Option<Reference>,
    /// Content type of the assigned interface
    #[serde(default)]
    pub assigned_object_type: Option<String>,
    /// ID of the assigned interface
    #[serde(default)]
    pub assigned_object_id: Option<u64>,
    /// DNS name
    #[serde(default)]
    pub dns_name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Assigned tags
    #[serde(default)]
    pub tags: Vec<Reference>,
    /// Fields outside the known set, kept verbatim
    #[serde(flatten)]
    pub extra: Extra,
}

/// IPAM VLAN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vlan {
    /// Object ID
    pub id: u64,
    /// Server-rendered label
    pub display: String,
    /// 802.1Q VLAN ID
    pub vid: u16,
    /// Name
    pub name: String,
    /// Status choice
    #[serde(default)]
    pub status: Option<Reference>,
    /// Owning tenant
    #[serde(default)]
    pub tenant: Option<Reference>,
    /// Site scope
    #[serde(default)]
    pub site: Option<Reference>,
    /// VLAN group
    #[serde(default)]
    pub group: Option<Reference>,
    /// Role (an object for prefixes and VLANs, a choice for IP addresses)
    #[serde(default)]
    pub role: Option<Reference>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Assigned tags
    #[serde(default)]
    pub tags: Vec<Reference>,
    /// Fields outside the known set, kept verbatim
    #[serde(flatten)]
    pub extra: Extra,
}

/// IPAM VRF (routing domain)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vrf {
    /// Object ID
    pub id: u64,
    /// Server-rendered label
    pub display: String,
    /// Name
    pub name: String,
    /// Route distinguisher
    #[serde(default)]
    pub rd: Option<String>,
    /// Owning tenant
    #[serde(default)]
    pub tenant: Option<Reference>,
    /// Prevent duplicate prefixes and addresses within the VRF
    #[serde(default = "default_true")]
    pub enforce_unique: bool,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Assigned tags
    #[serde(default)]
    pub tags: Vec<Reference>,
    /// Fields outside the known set, kept verbatim
    #[serde(flatten)]
    pub extra: Extra,
}

macro_rules! impl_resource {
    ($ty:ty, $endpoint:literal, $kind:literal) => {
        impl Resource for $ty {
            const ENDPOINT: &'static str = $endpoint;
            const KIND: &'static str = $kind;

            fn id(&self) -> u64 {
                self.id
            }

            fn display(&self) -> &str {
                &self.display
            }

            fn extra(&self) -> &Extra {
                &self.extra
            }
        }
    };
}

impl_resource!(Prefix, "ipam/prefixes/", "prefix");
impl_resource!(IpAddress, "ipam/ip-addresses/", "IP address");
impl_resource!(Vlan, "ipam/vlans/", "VLAN");
impl_resource!(Vrf, "ipam/vrfs/", "VRF");

/// Decode one raw record
pub fn decode<R: Resource>(raw: Value) -> Result<R, NetBoxError> {
    decode_at(raw, 0)
}

/// Decode a result set; the first invalid record fails the whole set
pub fn decode_all<R: Resource>(raw: Vec<Value>) -> Result<Vec<R>, NetBoxError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, value)| decode_at(value, index))
        .collect()
}

fn decode_at<R: Resource>(raw: Value, index: usize) -> Result<R, NetBoxError> {
    serde_json::from_value(raw).map_err(|e| NetBoxError::Validation {
        kind: R::KIND,
        index,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_prefix() {
        let p: Prefix = decode(json!({"id": 1, "display": "10.0.0.0/8", "prefix": "10.0.0.0/8"})).unwrap();
        assert_eq!(p.prefix, "10.0.0.0/8");
        assert!(p.vrf.is_none());
        assert!(p.tags.is_empty());
        assert!(!p.is_pool);
        assert_eq!(p.description, "");
    }

    #[test]
    fn test_full_prefix_with_choice_status() {
        let p: Prefix = decode(json!({
            "id": 42,
            "display": "10.10.0.0/16",
            "prefix": "10.10.0.0/16",
            "status": {"value": "active", "label": "Active"},
            "vrf": {"id": 5, "display": "Production"},
            "tenant": {"id": 3, "display": "Ops"},
            "site": {"id": 7, "display": "DC1"},
            "vlan": {"id": 100, "display": "VLAN 100"},
            "role": {"id": 2, "display": "Production"},
            "is_pool": true,
            "mark_utilized": false,
            "description": "Core network",
            "tags": [{"id": 1, "display": "critical"}]
        }))
        .unwrap();

        let status = p.status.as_ref().unwrap();
        assert_eq!(status.display(), "Active");
        assert_eq!(status.value(), Some("active"));
        assert_eq!(p.vrf.as_ref().unwrap().display(), "Production");
        assert_eq!(p.vrf.as_ref().unwrap().id(), Some(5));
        assert!(p.is_pool);
        assert_eq!(p.tags.len(), 1);
    }

    #[test]
    fn test_container_status() {
        let p: Prefix = decode(json!({
            "id": 99,
            "display": "10.32.16.0/20",
            "prefix": "10.32.16.0/20",
            "status": {"value": "container", "label": "Container"}
        }))
        .unwrap();
        assert_eq!(p.status.unwrap().value(), Some("container"));
    }

    #[test]
    fn test_null_references_are_absent() {
        let p: Prefix = decode(json!({
            "id": 1, "display": "10.0.0.0/8", "prefix": "10.0.0.0/8",
            "vrf": null, "tenant": null
        }))
        .unwrap();
        assert!(p.vrf.is_none());
        assert!(p.tenant.is_none());
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let raw = json!({
            "id": 7,
            "display": "10.1.0.0/16",
            "prefix": "10.1.0.0/16",
            "custom_fields": {"owner": "netops", "ticket": 1234},
            "url": "https://netbox.example.com/api/ipam/prefixes/7/",
            "_depth": 1
        });
        let p: Prefix = decode(raw).unwrap();

        assert_eq!(p.extra["custom_fields"], json!({"owner": "netops", "ticket": 1234}));
        assert_eq!(p.extra["_depth"], json!(1));

        let encoded = serde_json::to_value(&p).unwrap();
        assert_eq!(encoded["custom_fields"], json!({"owner": "netops", "ticket": 1234}));
        assert_eq!(encoded["url"], "https://netbox.example.com/api/ipam/prefixes/7/");
    }

    #[test]
    fn test_nested_reference_extra_preserved() {
        let p: Prefix = decode(json!({
            "id": 1, "display": "10.0.0.0/8", "prefix": "10.0.0.0/8",
            "tenant": {"id": 3, "display": "Ops", "slug": "ops", "url": "https://nb/api/tenancy/tenants/3/"}
        }))
        .unwrap();
        let encoded = serde_json::to_value(&p).unwrap();
        assert_eq!(encoded["tenant"]["slug"], "ops");
    }

    #[test]
    fn test_missing_required_field_is_validation_error() {
        let err = decode::<Prefix>(json!({"id": 1, "display": "x"})).unwrap_err();
        match err {
            NetBoxError::Validation { kind, index, reason } => {
                assert_eq!(kind, "prefix");
                assert_eq!(index, 0);
                assert!(reason.contains("prefix"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_primitive_type_is_validation_error() {
        let err = decode::<Vlan>(json!({"id": "one", "display": "VLAN", "vid": 10, "name": "mgmt"})).unwrap_err();
        assert!(matches!(err, NetBoxError::Validation { .. }));
    }

    #[test]
    fn test_decode_all_fails_wholesale_with_index() {
        let raw = vec![
            json!({"id": 1, "display": "a", "name": "a"}),
            json!({"id": 2, "display": "b"}),
        ];
        let err = decode_all::<Vrf>(raw).unwrap_err();
        assert!(matches!(err, NetBoxError::Validation { index: 1, kind: "VRF", .. }));
    }

    #[test]
    fn test_ip_address_fields() {
        let ip: IpAddress = decode(json!({
            "id": 10,
            "display": "10.0.0.1/32",
            "address": "10.0.0.1/32",
            "dns_name": "server01.example.com",
            "status": {"value": "active", "label": "Active"},
            "role": {"value": "vip", "label": "VIP"},
            "assigned_object_type": "dcim.interface",
            "assigned_object_id": 55
        }))
        .unwrap();
        assert_eq!(ip.dns_name, "server01.example.com");
        assert_eq!(ip.role.unwrap().display(), "VIP");
        assert_eq!(ip.assigned_object_id, Some(55));
    }

    #[test]
    fn test_vlan_and_vrf_defaults() {
        let vlan: Vlan = decode(json!({"id": 1, "display": "VLAN 100", "vid": 100, "name": "Management"})).unwrap();
        assert_eq!(vlan.vid, 100);
        assert_eq!(vlan.name, "Management");

        let vrf: Vrf = decode(json!({"id": 1, "display": "Global", "name": "Global"})).unwrap();
        assert!(vrf.enforce_unique);
        assert!(vrf.rd.is_none());

        let vrf: Vrf = decode(json!({
            "id": 5, "display": "Production", "name": "Production",
            "rd": "65000:100", "enforce_unique": false,
            "tenant": {"id": 3, "display": "Ops"}
        }))
        .unwrap();
        assert_eq!(vrf.rd.as_deref(), Some("65000:100"));
        assert!(!vrf.enforce_unique);
    }

    #[test]
    fn test_resource_endpoints() {
        assert_eq!(Prefix::ENDPOINT, "ipam/prefixes/");
        assert_eq!(IpAddress::ENDPOINT, "ipam/ip-addresses/");
        assert_eq!(Vlan::ENDPOINT, "ipam/vlans/");
        assert_eq!(Vrf::ENDPOINT, "ipam/vrfs/");
    }
}
