//! Table and JSON rendering
//!
//! Every renderer returns a `String`; callers decide where it is written.
//! Missing values render as `—`.

use crate::reconciler::BatchResult;
use netbox_client::{IpAddress, Prefix, ProbeOutcome, Reference, Vlan, Vrf};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const DASH: &str = "—";
const DESCRIPTION_WIDTH: usize = 30;

fn display_or_dash(reference: Option<&Reference>) -> String {
    reference.map_or_else(|| DASH.to_string(), |r| r.display().to_string())
}

fn text_or_dash(text: &str) -> String {
    if text.is_empty() {
        DASH.to_string()
    } else {
        text.to_string()
    }
}

fn description(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_WIDTH {
        let cut: String = text.chars().take(DESCRIPTION_WIDTH - 1).collect();
        format!("{cut}…")
    } else {
        text_or_dash(text)
    }
}

fn tags(tags: &[Reference]) -> String {
    if tags.is_empty() {
        DASH.to_string()
    } else {
        tags.iter().map(Reference::display).collect::<Vec<_>>().join(", ")
    }
}

fn table<T: Tabled>(title: &str, rows: Vec<T>, count_label: &str) -> String {
    let count = rows.len();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("{title}\n{table}\n  {count} {count_label}\n")
}

/// Pretty-printed JSON array, extra fields included
pub fn render_json<T: Serialize>(records: &[T]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

#[derive(Tabled)]
struct PrefixRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Prefix")]
    prefix: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "VRF")]
    vrf: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "VLAN")]
    vlan: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

pub fn render_prefixes(records: &[Prefix]) -> String {
    let rows = records
        .iter()
        .map(|p| PrefixRow {
            id: p.id,
            prefix: p.prefix.clone(),
            status: display_or_dash(p.status.as_ref()),
            vrf: display_or_dash(p.vrf.as_ref()),
            tenant: display_or_dash(p.tenant.as_ref()),
            site: display_or_dash(p.site.as_ref()),
            vlan: display_or_dash(p.vlan.as_ref()),
            role: display_or_dash(p.role.as_ref()),
            pool: if p.is_pool { "✅".to_string() } else { DASH.to_string() },
            description: description(&p.description),
            tags: tags(&p.tags),
        })
        .collect();
    table("📡 IPAM Prefixes", rows, "prefixes")
}

#[derive(Tabled)]
struct PrefixStatusRow {
    #[tabled(rename = "Prefix")]
    prefix: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Compact prefix + status table
pub fn render_prefix_status(records: &[Prefix]) -> String {
    let rows = records
        .iter()
        .map(|p| PrefixStatusRow {
            prefix: p.prefix.clone(),
            status: display_or_dash(p.status.as_ref()),
        })
        .collect();
    table("📡 Prefix Status", rows, "prefixes")
}

#[derive(Tabled)]
struct IpAddressRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "VRF")]
    vrf: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "DNS Name")]
    dns_name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

pub fn render_ip_addresses(records: &[IpAddress]) -> String {
    let rows = records
        .iter()
        .map(|ip| IpAddressRow {
            id: ip.id,
            address: ip.address.clone(),
            status: display_or_dash(ip.status.as_ref()),
            vrf: display_or_dash(ip.vrf.as_ref()),
            tenant: display_or_dash(ip.tenant.as_ref()),
            dns_name: text_or_dash(&ip.dns_name),
            role: display_or_dash(ip.role.as_ref()),
            description: description(&ip.description),
            tags: tags(&ip.tags),
        })
        .collect();
    table("🖥️  IPAM IP Addresses", rows, "IP addresses")
}

#[derive(Tabled)]
struct VlanRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "VID")]
    vid: u16,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

pub fn render_vlans(records: &[Vlan]) -> String {
    let rows = records
        .iter()
        .map(|v| VlanRow {
            id: v.id,
            vid: v.vid,
            name: v.name.clone(),
            status: display_or_dash(v.status.as_ref()),
            tenant: display_or_dash(v.tenant.as_ref()),
            site: display_or_dash(v.site.as_ref()),
            group: display_or_dash(v.group.as_ref()),
            role: display_or_dash(v.role.as_ref()),
            description: description(&v.description),
            tags: tags(&v.tags),
        })
        .collect();
    table("🏷️  IPAM VLANs", rows, "VLANs")
}

#[derive(Tabled)]
struct VrfRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "RD")]
    rd: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Enforce Unique")]
    enforce_unique: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

pub fn render_vrfs(records: &[Vrf]) -> String {
    let rows = records
        .iter()
        .map(|v| VrfRow {
            id: v.id,
            name: v.name.clone(),
            rd: v.rd.as_deref().map_or_else(|| DASH.to_string(), text_or_dash),
            tenant: display_or_dash(v.tenant.as_ref()),
            enforce_unique: if v.enforce_unique { "✅" } else { "❌" }.to_string(),
            description: description(&v.description),
            tags: tags(&v.tags),
        })
        .collect();
    table("🔀 IPAM VRFs", rows, "VRFs")
}

#[derive(Tabled)]
struct BatchSummaryRow {
    #[tabled(rename = "Queried Prefix")]
    queried: String,
    #[tabled(rename = "Matched Prefix")]
    matched: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// One row per queried key; approximate matches are marked with `≈`
pub fn render_batch_summary(results: &[BatchResult]) -> String {
    let rows: Vec<BatchSummaryRow> = results
        .iter()
        .map(|result| match result.outcome.matched() {
            Some(p) => BatchSummaryRow {
                queried: result.query.clone(),
                matched: if result.outcome.is_approximate() {
                    format!("≈ {}", p.prefix)
                } else {
                    p.prefix.clone()
                },
                status: display_or_dash(p.status.as_ref()),
                site: display_or_dash(p.site.as_ref()),
                tenant: display_or_dash(p.tenant.as_ref()),
                description: description(&p.description),
            },
            None => BatchSummaryRow {
                queried: result.query.clone(),
                matched: DASH.to_string(),
                status: "Not Found".to_string(),
                site: DASH.to_string(),
                tenant: DASH.to_string(),
                description: DASH.to_string(),
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("📦 Batch Prefix Status\n{table}\n")
}

/// Header printed before a batch run
pub fn render_batch_header(source: &str, count: usize, filters: &netbox_client::Filters) -> String {
    let mut header = format!("📦 Batch Prefix Query\n  Source:   {source}\n  Prefixes: {count}\n");
    if !filters.is_empty() {
        let rendered = filters
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        header.push_str(&format!("  Filters:  {rendered}\n"));
    }
    header
}

/// Section heading for one queried key
pub fn render_batch_heading(query: &str) -> String {
    format!("── {query} ──")
}

/// Final `N found · M not found` line
pub fn render_batch_footer(found: usize, not_found: usize) -> String {
    if not_found == 0 {
        format!("✅ {found} found")
    } else {
        format!("✅ {found} found  ·  ⚠️  {not_found} not found")
    }
}

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

pub fn render_probe(outcomes: &[ProbeOutcome]) -> String {
    let rows = outcomes
        .iter()
        .map(|o| ProbeRow {
            endpoint: o.endpoint.clone(),
            status: if o.ok { "✅ Pass" } else { "❌ Fail" }.to_string(),
            detail: o.detail.clone(),
        })
        .collect::<Vec<_>>();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("Connection Probe Results\n{table}\n")
}
