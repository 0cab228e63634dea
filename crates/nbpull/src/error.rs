//! CLI error types.
//!
//! Wraps library errors and adds the failures that only the command line can
//! hit (batch files, terminal I/O). Each error maps to a process exit status.

use netbox_client::NetBoxError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status for configuration and pre-flight failures
pub const EXIT_CONFIG: u8 = 2;
/// Exit status for every other failure
pub const EXIT_FAILURE: u8 = 1;

/// Errors that can occur while running an `nbpull` command.
#[derive(Debug, Error)]
pub enum CliError {
    /// NetBox API or settings error
    #[error("{0}")]
    NetBox(#[from] NetBoxError),

    /// Batch file does not exist
    #[error("File not found: {0}\n\nCreate a batch_prefixes.toml or pass --file /path/to/file.toml")]
    BatchFileMissing(PathBuf),

    /// Batch file exists but is not usable
    #[error("Invalid batch file {path}: {reason}")]
    InvalidBatchFile { path: PathBuf, reason: String },

    /// Batch file is not valid TOML
    #[error("Failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Setup could not continue (missing URL or token, failed probe)
    #[error("Setup aborted: {0}")]
    Setup(String),

    /// Reading from or writing to the terminal or a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering failed
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::NetBox(e) if e.is_config() => EXIT_CONFIG,
            CliError::Setup(_) => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }

    /// Extra guidance printed after the error message
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::NetBox(e) if e.is_config() => Some(
                "Make sure NETBOX_URL and NETBOX_TOKEN are set in your .env file or environment variables.\n\
                 Run `nbpull setup` to create one.",
            ),
            CliError::NetBox(NetBoxError::Authentication { .. }) => {
                Some("Check that the API token is valid and has read permission for IPAM.")
            }
            CliError::Setup(_) => Some("Check your URL and token, then run `nbpull setup` again."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_exit_with_two() {
        let err = CliError::from(NetBoxError::InvalidConfig("NETBOX_TOKEN is not set".into()));
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert!(err.hint().unwrap().contains("nbpull setup"));
    }

    #[test]
    fn test_runtime_errors_exit_with_one() {
        let err = CliError::from(NetBoxError::Timeout("ipam/prefixes/".into()));
        assert_eq!(err.exit_code(), EXIT_FAILURE);

        let err = CliError::BatchFileMissing(PathBuf::from("batch_prefixes.toml"));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert!(err.to_string().contains("batch_prefixes.toml"));
    }
}
