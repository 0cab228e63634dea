//! nbpull
//!
//! Read-only CLI to pull IPAM data from NetBox:
//! - `prefixes`, `ip-addresses`, `vlans`, `vrfs`: list records with filters
//! - `batch-prefixes`: reconcile a file of CIDRs against NetBox prefixes
//! - `setup`: interactive first-run configuration
//!
//! Results go to stdout; logs, progress and errors go to stderr.

mod batch_file;
mod commands;
mod error;
mod output;
mod reconciler;
mod setup;

use crate::error::CliError;
use clap::{Parser, Subcommand};
use commands::{BatchArgs, IpAddressArgs, PrefixArgs, VlanArgs, VrfArgs};
use netbox_client::{NetBoxClient, NetBoxClientTrait, NetBoxSettings};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Settings file read from the working directory
const ENV_FILE: &str = ".env";

/// 🔍 Read-only CLI to pull IPAM data from NetBox.
#[derive(Parser)]
#[command(name = "nbpull", version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 📡 List IPAM prefixes from NetBox
    Prefixes(PrefixArgs),
    /// 🖥️  List IPAM IP addresses from NetBox
    IpAddresses(IpAddressArgs),
    /// 🏷️  List IPAM VLANs from NetBox
    Vlans(VlanArgs),
    /// 🔀 List IPAM VRFs from NetBox
    Vrfs(VrfArgs),
    /// 📦 Query NetBox for multiple prefixes defined in a TOML file
    BatchPrefixes(BatchArgs),
    /// 🛠️  Interactive setup wizard for configuring nbpull
    Setup,
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "nbpull=debug,netbox_client=debug,warn"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn connect(settings: &NetBoxSettings) -> Result<NetBoxClient, CliError> {
    let client = NetBoxClient::new(settings)?;
    debug!("Connected client for {}", client.base_url());
    Ok(client)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    if let Commands::Setup = cli.command {
        let mut wizard = setup::SetupWizard::new(
            std::io::stdin().lock(),
            stderr,
            ENV_FILE,
            batch_file::DEFAULT_BATCH_FILE,
        );
        return wizard
            .run(&|settings: &NetBoxSettings| {
                NetBoxClient::new(settings).map(|c| Box::new(c) as Box<dyn NetBoxClientTrait>)
            })
            .await;
    }

    let settings = NetBoxSettings::load(ENV_FILE)?;
    let client = connect(&settings)?;

    match &cli.command {
        Commands::Prefixes(args) => commands::prefixes(&client, args, &mut stdout).await,
        Commands::IpAddresses(args) => commands::ip_addresses(&client, args, &mut stdout).await,
        Commands::Vlans(args) => commands::vlans(&client, args, &mut stdout).await,
        Commands::Vrfs(args) => commands::vrfs(&client, args, &mut stdout).await,
        Commands::BatchPrefixes(args) => commands::batch_prefixes(&client, args, &mut stdout, &mut stderr)
            .await
            .map(|_| ()),
        Commands::Setup => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            if let Some(hint) = e.hint() {
                eprintln!("\n{hint}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommand_names() {
        let cli = Cli::parse_from(["nbpull", "ip-addresses", "--prefix", "10.0.0.0/24", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::IpAddresses(args) => {
                assert_eq!(args.filters().get("parent").map(String::as_str), Some("10.0.0.0/24"));
            }
            _ => panic!("expected ip-addresses"),
        }

        let cli = Cli::parse_from(["nbpull", "batch-prefixes"]);
        match cli.command {
            Commands::BatchPrefixes(args) => {
                assert_eq!(args.file, std::path::PathBuf::from(batch_file::DEFAULT_BATCH_FILE));
            }
            _ => panic!("expected batch-prefixes"),
        }
    }
}
