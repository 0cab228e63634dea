//! Interactive setup wizard
//!
//! Walks through:
//! 1. Creating a `.env` file with the NetBox URL and API token
//! 2. Probing the API with those credentials
//! 3. Optionally creating a batch prefixes file
//!
//! The wizard reads answers from any `BufRead` and writes prompts to any
//! `Write`, so it runs against the terminal in `main` and against buffers in
//! tests.

use crate::batch_file::BatchFile;
use crate::error::CliError;
use crate::output;
use netbox_client::config::{ENV_TOKEN, ENV_URL, parse_env_file};
use netbox_client::{Filters, NetBoxClientTrait, NetBoxError, NetBoxSettings};
use std::fs;
use std::io::{BufRead, Write};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::debug;

/// Mask an API token, showing only the last 4 characters
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    if len <= 4 {
        return "****".to_string();
    }
    let tail: String = token.chars().skip(len - 4).collect();
    format!("{}{}", "*".repeat(len - 4), tail)
}

/// Trim, drop trailing slashes and default the scheme to `https://`
pub fn normalize_url(raw: &str) -> String {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Whether `value` looks like `address/mask`
pub fn looks_like_cidr(value: &str) -> bool {
    let Some((addr, mask)) = value.split_once('/') else {
        return false;
    };
    let Ok(mask) = mask.parse::<u8>() else {
        return false;
    };
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => mask <= 32,
        Ok(IpAddr::V6(_)) => mask <= 128,
        Err(_) => false,
    }
}

/// Contents of a generated `.env` file
pub fn render_env_file(url: &str, token: &str) -> String {
    format!(
        "# NetBox connection settings\n\
         # Generated by: nbpull setup\n\
         #\n\
         # These values are READ from NetBox; no data is ever written.\n\
         \n\
         {ENV_URL}={url}\n\
         {ENV_TOKEN}={token}\n\
         \n\
         # Optional: Results per API page (default: 100)\n\
         # NETBOX_PAGE_SIZE=100\n\
         \n\
         # Optional: Request timeout in seconds (default: 30)\n\
         # NETBOX_TIMEOUT=30\n\
         \n\
         # Optional: Verify SSL certificates (default: true)\n\
         # NETBOX_VERIFY_SSL=true\n"
    )
}

/// Builds a client for the probe step
pub type Connect = dyn Fn(&NetBoxSettings) -> Result<Box<dyn NetBoxClientTrait>, NetBoxError>;

/// Interactive setup wizard
pub struct SetupWizard<R, W> {
    input: R,
    output: W,
    env_path: PathBuf,
    batch_path: PathBuf,
}

impl<R: BufRead, W: Write> SetupWizard<R, W> {
    pub fn new(input: R, output: W, env_path: impl Into<PathBuf>, batch_path: impl Into<PathBuf>) -> Self {
        Self {
            input,
            output,
            env_path: env_path.into(),
            batch_path: batch_path.into(),
        }
    }

    /// Run every step; the `.env` file is written before probing
    pub async fn run(&mut self, connect: &Connect) -> Result<(), CliError> {
        writeln!(self.output)?;
        writeln!(self.output, "🛠️  Welcome to nbpull setup!")?;
        writeln!(self.output, "This wizard will configure your NetBox connection and verify everything works.")?;
        writeln!(self.output, "🔒 nbpull is read-only; no data will be written to NetBox.")?;
        writeln!(self.output)?;

        let (url, token) = self.collect_credentials()?;

        fs::write(&self.env_path, render_env_file(&url, &token))?;
        writeln!(self.output)?;
        writeln!(self.output, "✅ .env written to {}", self.env_path.display())?;
        writeln!(
            self.output,
            "Tip: You can also set NETBOX_PAGE_SIZE, NETBOX_TIMEOUT, and NETBOX_VERIFY_SSL as environment variables."
        )?;
        writeln!(self.output)?;

        self.connection_test(&url, &token, connect).await?;
        self.batch_file()?;

        writeln!(self.output)?;
        writeln!(self.output, "🎉 Setup complete! Try these commands:")?;
        writeln!(self.output, "  nbpull prefixes           list prefixes")?;
        writeln!(self.output, "  nbpull ip-addresses       list IPs")?;
        writeln!(self.output, "  nbpull vlans              list VLANs")?;
        writeln!(self.output, "  nbpull vrfs               list VRFs")?;
        writeln!(self.output, "  nbpull batch-prefixes     batch query")?;
        Ok(())
    }

    fn collect_credentials(&mut self) -> Result<(String, String), CliError> {
        let mut existing_url = String::new();
        let mut url = String::new();
        let mut token = String::new();

        if self.env_path.exists() {
            let existing = parse_env_file(&fs::read_to_string(&self.env_path)?);
            existing_url = existing.get(ENV_URL).cloned().unwrap_or_default();
            let existing_token = existing.get(ENV_TOKEN).cloned().unwrap_or_default();

            writeln!(self.output, "⚠️  An existing .env file was found.")?;
            if !existing_url.is_empty() {
                writeln!(self.output, "  URL:   {existing_url}")?;
            }
            if !existing_token.is_empty() {
                writeln!(self.output, "  Token: {}", mask_token(&existing_token))?;
            }
            writeln!(self.output)?;

            if !self.confirm("Overwrite existing .env?", false)? {
                writeln!(self.output, "Keeping existing .env.")?;
                url = existing_url.clone();
                token = existing_token;
            }
        }

        if url.is_empty() {
            writeln!(self.output, "Step 1: NetBox Connection")?;
            let default = (!existing_url.is_empty()).then_some(existing_url.as_str());
            let answer = self.prompt("NetBox URL", default)?;
            url = normalize_url(&answer);
        }
        if token.is_empty() {
            token = self.prompt("API Token", None)?;
        }

        if url.is_empty() || token.is_empty() {
            return Err(CliError::Setup("URL and Token are required.".to_string()));
        }
        Ok((url, token))
    }

    async fn connection_test(&mut self, url: &str, token: &str, connect: &Connect) -> Result<(), CliError> {
        writeln!(self.output, "Step 2: Connection Test")?;

        let settings = NetBoxSettings::new(url, token);
        settings.validate()?;
        let client = connect(&settings).map_err(|e| CliError::Setup(format!("Connection failed: {e}")))?;

        debug!("Probing {}", url);
        let outcomes = client.probe(None).await;
        write!(self.output, "{}", output::render_probe(&outcomes))?;
        writeln!(self.output)?;

        if outcomes.iter().all(|o| o.ok) {
            writeln!(self.output, "✅ All endpoints reachable!")?;
        } else {
            writeln!(self.output, "⚠️  Some endpoints failed. Check your token permissions.")?;
        }
        writeln!(self.output)?;
        Ok(())
    }

    fn batch_file(&mut self) -> Result<(), CliError> {
        writeln!(self.output, "Step 3: Batch Prefixes File")?;

        if self.batch_path.exists() {
            writeln!(self.output, "{} already exists, skipping.", self.batch_path.display())?;
            return Ok(());
        }
        if !self.confirm("Create a batch_prefixes.toml file?", true)? {
            writeln!(self.output, "Skipping batch file creation.")?;
            return Ok(());
        }

        writeln!(self.output, "Enter prefixes one per line (CIDR notation, e.g. 10.0.0.0/8).")?;
        writeln!(self.output, "Press Enter on an empty line when done.")?;

        let mut prefixes = Vec::new();
        loop {
            let value = self.prompt(&format!("Prefix {}", prefixes.len() + 1), None)?;
            if value.is_empty() {
                break;
            }
            if !looks_like_cidr(&value) {
                writeln!(self.output, "⚠️  '{value}' doesn't look like a valid CIDR, added anyway.")?;
            }
            prefixes.push(value);
        }

        if prefixes.is_empty() {
            writeln!(self.output, "No prefixes entered, skipping.")?;
            return Ok(());
        }

        let mut filters = Filters::new();
        if self.confirm("Add global filters? (status, vrf, tenant)", false)? {
            for (key, label) in [
                ("status", "Status filter (active/reserved/deprecated/container, blank to skip)"),
                ("vrf", "VRF filter (blank to skip)"),
                ("tenant", "Tenant filter (blank to skip)"),
            ] {
                let value = self.prompt(label, None)?;
                if !value.is_empty() {
                    filters.insert(key.to_string(), value);
                }
            }
        }

        BatchFile::save(&self.batch_path, &prefixes, &filters)?;
        writeln!(
            self.output,
            "✅ {} created with {} prefix(es).",
            self.batch_path.display(),
            prefixes.len()
        )?;
        Ok(())
    }

    /// Ask for a line of input; end of input counts as an empty answer
    fn prompt(&mut self, label: &str, default: Option<&str>) -> std::io::Result<String> {
        match default {
            Some(default) => write!(self.output, "{label} [{default}]: ")?,
            None => write!(self.output, "{label}: ")?,
        }
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let answer = line.trim();

        Ok(match (answer.is_empty(), default) {
            (true, Some(default)) => default.to_string(),
            _ => answer.to_string(),
        })
    }

    fn confirm(&mut self, label: &str, default: bool) -> std::io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        let answer = self.prompt(&format!("{label} [{hint}]"), None)?.to_lowercase();
        Ok(match answer.as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }
}
