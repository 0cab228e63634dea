//! Command handlers
//!
//! Each handler fetches through a [`NetBoxClientTrait`] and writes results to
//! `out` (stdout in `main`) and progress or diagnostics to `diag` (stderr).

use crate::batch_file::BatchFile;
use crate::error::CliError;
use crate::output;
use crate::reconciler::{self, BatchResult};
use clap::{Args, ValueEnum};
use netbox_client::{Filters, NetBoxClientTrait};
use std::io::Write;
use std::path::PathBuf;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Options shared by every list command
#[derive(Debug, Clone, Args)]
pub struct ListOptions {
    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Maximum results to return
    #[arg(long, short = 'l', default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: u64,

    /// Output format
    #[arg(long = "format", short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl ListOptions {
    fn cap(&self) -> Option<usize> {
        Some(usize::try_from(self.limit).unwrap_or(usize::MAX))
    }
}

/// Arguments for `nbpull prefixes`
#[derive(Debug, Clone, Args)]
pub struct PrefixArgs {
    /// Filter by status (e.g. active, reserved)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by VRF name
    #[arg(long)]
    pub vrf: Option<String>,
    /// Filter by tenant name
    #[arg(long)]
    pub tenant: Option<String>,
    /// Filter by site name
    #[arg(long)]
    pub site: Option<String>,
    /// Filter by tag slug
    #[arg(long)]
    pub tag: Option<String>,
    #[command(flatten)]
    pub list: ListOptions,
    /// Show only prefix and status columns
    #[arg(long)]
    pub status_only: bool,
}

/// Arguments for `nbpull ip-addresses`
#[derive(Debug, Clone, Args)]
pub struct IpAddressArgs {
    /// Filter by status (e.g. active, reserved)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by VRF name
    #[arg(long)]
    pub vrf: Option<String>,
    /// Filter by tenant name
    #[arg(long)]
    pub tenant: Option<String>,
    /// Filter by site name
    #[arg(long)]
    pub site: Option<String>,
    /// Filter by tag slug
    #[arg(long)]
    pub tag: Option<String>,
    /// Filter by parent prefix (e.g. 10.0.0.0/24)
    #[arg(long)]
    pub prefix: Option<String>,
    #[command(flatten)]
    pub list: ListOptions,
}

/// Arguments for `nbpull vlans`
#[derive(Debug, Clone, Args)]
pub struct VlanArgs {
    /// Filter by status (e.g. active, reserved)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by tenant name
    #[arg(long)]
    pub tenant: Option<String>,
    /// Filter by site name
    #[arg(long)]
    pub site: Option<String>,
    /// Filter by tag slug
    #[arg(long)]
    pub tag: Option<String>,
    #[command(flatten)]
    pub list: ListOptions,
}

/// Arguments for `nbpull vrfs`
#[derive(Debug, Clone, Args)]
pub struct VrfArgs {
    /// Filter by tenant name
    #[arg(long)]
    pub tenant: Option<String>,
    /// Filter by tag slug
    #[arg(long)]
    pub tag: Option<String>,
    #[command(flatten)]
    pub list: ListOptions,
}

/// Arguments for `nbpull batch-prefixes`
#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// Path to TOML file with prefix list
    #[arg(long, default_value = crate::batch_file::DEFAULT_BATCH_FILE)]
    pub file: PathBuf,
    /// Output format
    #[arg(long = "format", short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Show a single summary table
    #[arg(long)]
    pub status_only: bool,
}

/// Build API query parameters, dropping unset options
fn build_filters(pairs: &[(&str, &Option<String>)]) -> Filters {
    pairs
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| ((*key).to_string(), v.clone())))
        .collect()
}

impl PrefixArgs {
    pub fn filters(&self) -> Filters {
        build_filters(&[
            ("status", &self.status),
            ("vrf", &self.vrf),
            ("tenant", &self.tenant),
            ("site", &self.site),
            ("tag", &self.tag),
            ("q", &self.list.search),
        ])
    }
}

impl IpAddressArgs {
    pub fn filters(&self) -> Filters {
        build_filters(&[
            ("status", &self.status),
            ("vrf", &self.vrf),
            ("tenant", &self.tenant),
            ("site", &self.site),
            ("tag", &self.tag),
            ("q", &self.list.search),
            ("parent", &self.prefix),
        ])
    }
}

impl VlanArgs {
    pub fn filters(&self) -> Filters {
        build_filters(&[
            ("status", &self.status),
            ("tenant", &self.tenant),
            ("site", &self.site),
            ("tag", &self.tag),
            ("q", &self.list.search),
        ])
    }
}

impl VrfArgs {
    pub fn filters(&self) -> Filters {
        build_filters(&[("tenant", &self.tenant), ("tag", &self.tag), ("q", &self.list.search)])
    }
}

pub async fn prefixes(client: &dyn NetBoxClientTrait, args: &PrefixArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let records = client.query_prefixes(&args.filters(), args.list.cap()).await?;
    let rendered = match args.list.format {
        OutputFormat::Json => output::render_json(&records)?,
        OutputFormat::Table if args.status_only => output::render_prefix_status(&records),
        OutputFormat::Table => output::render_prefixes(&records),
    };
    writeln!(out, "{rendered}")?;
    Ok(())
}

pub async fn ip_addresses(
    client: &dyn NetBoxClientTrait,
    args: &IpAddressArgs,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let records = client.query_ip_addresses(&args.filters(), args.list.cap()).await?;
    let rendered = match args.list.format {
        OutputFormat::Json => output::render_json(&records)?,
        OutputFormat::Table => output::render_ip_addresses(&records),
    };
    writeln!(out, "{rendered}")?;
    Ok(())
}

pub async fn vlans(client: &dyn NetBoxClientTrait, args: &VlanArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let records = client.query_vlans(&args.filters(), args.list.cap()).await?;
    let rendered = match args.list.format {
        OutputFormat::Json => output::render_json(&records)?,
        OutputFormat::Table => output::render_vlans(&records),
    };
    writeln!(out, "{rendered}")?;
    Ok(())
}

pub async fn vrfs(client: &dyn NetBoxClientTrait, args: &VrfArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let records = client.query_vrfs(&args.filters(), args.list.cap()).await?;
    let rendered = match args.list.format {
        OutputFormat::Json => output::render_json(&records)?,
        OutputFormat::Table => output::render_vrfs(&records),
    };
    writeln!(out, "{rendered}")?;
    Ok(())
}

/// Reconcile every prefix in the batch file and render the results
pub async fn batch_prefixes(
    client: &dyn NetBoxClientTrait,
    args: &BatchArgs,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> Result<Vec<BatchResult>, CliError> {
    let batch = BatchFile::load(&args.file)?;

    writeln!(diag)?;
    write!(
        diag,
        "{}",
        output::render_batch_header(&args.file.display().to_string(), batch.prefixes.len(), &batch.filters)
    )?;
    writeln!(diag)?;

    let results = reconciler::reconcile(client, &batch.prefixes, &batch.filters).await?;

    match args.format {
        OutputFormat::Json => writeln!(out, "{}", output::render_json(&results)?)?,
        OutputFormat::Table if args.status_only => write!(out, "{}", output::render_batch_summary(&results))?,
        OutputFormat::Table => {
            for result in results.iter().filter(|r| r.outcome.is_found()) {
                writeln!(out, "\n{}", output::render_batch_heading(&result.query))?;
                write!(out, "{}", output::render_prefixes(&result.candidates))?;
            }
            for result in results.iter().filter(|r| !r.outcome.is_found()) {
                writeln!(out, "\n{}", output::render_batch_heading(&result.query))?;
                writeln!(out, "  ⚠️  No results found.")?;
            }
            out.flush()?;
        }
    }

    let (found, not_found) = reconciler::tally(&results);
    writeln!(diag, "\n{}", output::render_batch_footer(found, not_found))?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch_file::DEFAULT_BATCH_FILE;
    use clap::Parser;
    use netbox_client::MockNetBoxClient;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        prefixes: PrefixArgs,
    }

    fn mock() -> MockNetBoxClient {
        let client = MockNetBoxClient::new("http://test-netbox");
        let h = client.helpers();
        client.add_prefix(h.create_prefix(1, "10.0.0.0/8", "container"));
        client.add_prefix(h.create_prefix(2, "10.32.0.0/16", "active"));
        client.add_prefix(h.create_prefix(3, "192.168.0.0/16", "active"));
        client.add_vrf(h.create_vrf(1, "Production", Some("65000:1")));
        client
    }

    #[test]
    fn test_prefix_args_to_filters() {
        let cli = TestCli::parse_from(["nbpull", "--status", "active", "-s", "10.0.0.0/8", "--tag", "edge"]);
        let filters = cli.prefixes.filters();
        assert_eq!(filters.len(), 3);
        assert_eq!(filters.get("q").map(String::as_str), Some("10.0.0.0/8"));
        assert_eq!(cli.prefixes.list.limit, 50);
        assert_eq!(cli.prefixes.list.format, OutputFormat::Table);
    }

    #[test]
    fn test_limit_zero_rejected() {
        assert!(TestCli::try_parse_from(["nbpull", "--limit", "0"]).is_err());
        assert!(TestCli::try_parse_from(["nbpull", "-l", "1", "-f", "json"]).is_ok());
    }

    #[tokio::test]
    async fn test_prefixes_passes_limit_as_cap() {
        let client = mock();
        let cli = TestCli::parse_from(["nbpull", "--limit", "2", "--status-only"]);
        let mut out = Vec::new();

        prefixes(&client, &cli.prefixes, &mut out).await.unwrap();

        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Prefix Status"));
        assert!(rendered.contains("  2 prefixes"));
        assert_eq!(client.queries()[0].cap, Some(2));
    }

    #[tokio::test]
    async fn test_vrfs_json() {
        let client = mock();
        let args = VrfArgs {
            tenant: None,
            tag: None,
            list: ListOptions {
                search: None,
                limit: 50,
                format: OutputFormat::Json,
            },
        };
        let mut out = Vec::new();

        vrfs(&client, &args, &mut out).await.unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["name"], "Production");
        assert_eq!(parsed[0]["rd"], "65000:1");
    }

    #[tokio::test]
    async fn test_batch_prefixes_status_only() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(DEFAULT_BATCH_FILE);
        std::fs::write(&file, "prefixes = [\"10.32.16.0/20\", \"10.0.0.0/8\", \"99.99.99.0/24\"]\n").unwrap();

        let args = BatchArgs {
            file,
            format: OutputFormat::Table,
            status_only: true,
        };
        let (mut out, mut diag) = (Vec::new(), Vec::new());

        let results = batch_prefixes(&mock(), &args, &mut out, &mut diag).await.unwrap();
        assert_eq!(results.len(), 3);

        let table = String::from_utf8(out).unwrap();
        assert!(table.contains("≈ 10.32.0.0/16"));
        assert!(table.contains("Not Found"));

        let diag = String::from_utf8(diag).unwrap();
        assert!(diag.contains("Prefixes: 3"));
        assert!(diag.contains("✅ 2 found  ·  ⚠️  1 not found"));
    }

    #[tokio::test]
    async fn test_batch_prefixes_table_labels_each_query_on_stdout() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(DEFAULT_BATCH_FILE);
        std::fs::write(&file, "prefixes = [\"10.32.16.0/20\", \"99.99.99.0/24\"]\n").unwrap();

        let args = BatchArgs {
            file,
            format: OutputFormat::Table,
            status_only: false,
        };
        let (mut out, mut diag) = (Vec::new(), Vec::new());
        batch_prefixes(&mock(), &args, &mut out, &mut diag).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("── 10.32.16.0/20 ──"));
        assert!(out.contains("10.32.0.0/16"));
        assert!(out.contains("── 99.99.99.0/24 ──"));
        assert!(out.contains("No results found"));

        let diag = String::from_utf8(diag).unwrap();
        assert!(!diag.contains("──"));
        assert!(diag.contains("✅ 1 found  ·  ⚠️  1 not found"));
    }

    #[tokio::test]
    async fn test_batch_prefixes_missing_file() {
        let dir = TempDir::new().unwrap();
        let args = BatchArgs {
            file: dir.path().join("missing.toml"),
            format: OutputFormat::Table,
            status_only: false,
        };
        let (mut out, mut diag) = (Vec::new(), Vec::new());

        let err = batch_prefixes(&mock(), &args, &mut out, &mut diag).await.unwrap_err();
        assert!(matches!(err, CliError::BatchFileMissing(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_FAILURE);
    }

    #[tokio::test]
    async fn test_batch_prefixes_json_is_one_document() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(DEFAULT_BATCH_FILE);
        std::fs::write(&file, "prefixes = [\"10.0.0.0/8\"]\n[filters]\nstatus = \"container\"\n").unwrap();

        let args = BatchArgs {
            file,
            format: OutputFormat::Json,
            status_only: false,
        };
        let (mut out, mut diag) = (Vec::new(), Vec::new());
        batch_prefixes(&mock(), &args, &mut out, &mut diag).await.unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["query"], "10.0.0.0/8");
        assert_eq!(parsed[0]["outcome"]["match"], "exact_match");
        assert_eq!(parsed[0]["candidates"][0]["id"], 1);
    }
}
