//! Batch prefix file support
//!
//! A batch file lists the CIDRs to reconcile plus optional filters applied to
//! every query:
//!
//! ```toml
//! prefixes = ["10.32.16.0/20", "172.16.0.0/12"]
//!
//! [filters]
//! status = "active"
//! ```

use crate::error::CliError;
use netbox_client::Filters;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default batch file in the working directory
pub const DEFAULT_BATCH_FILE: &str = "batch_prefixes.toml";

#[derive(Debug, Deserialize)]
struct RawBatchFile {
    #[serde(default)]
    prefixes: Vec<String>,
    #[serde(default)]
    filters: toml::Table,
}

/// A validated batch file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub prefixes: Vec<String>,
    /// Filter values already converted to query-string form
    pub filters: Filters,
}

impl BatchFile {
    /// Load and validate a batch file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CliError::BatchFileMissing(path.to_path_buf()));
            }
            Err(e) => return Err(CliError::Io(e)),
        };
        Self::parse(path, &content)
    }

    /// Parse batch file contents; `path` is only used in error messages
    pub fn parse(path: &Path, content: &str) -> Result<Self, CliError> {
        let raw: RawBatchFile = toml::from_str(content).map_err(|source| CliError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        if raw.prefixes.is_empty() {
            return Err(CliError::InvalidBatchFile {
                path: path.to_path_buf(),
                reason: "TOML file must contain a non-empty 'prefixes' list".to_string(),
            });
        }

        let mut filters = Filters::new();
        for (key, value) in raw.filters {
            let value = scalar_to_string(&value).ok_or_else(|| CliError::InvalidBatchFile {
                path: path.to_path_buf(),
                reason: format!("filter '{key}' must be a string, number or boolean"),
            })?;
            filters.insert(key, value);
        }

        Ok(Self {
            prefixes: raw.prefixes,
            filters,
        })
    }

    /// Render a batch file; without filters a commented example table is written
    pub fn render(prefixes: &[String], filters: &Filters) -> String {
        let mut lines = vec!["prefixes = [".to_string()];
        for prefix in prefixes {
            lines.push(format!("    {},", toml::Value::String(prefix.clone())));
        }
        lines.push("]".to_string());
        lines.push(String::new());
        lines.push("[filters]".to_string());
        if filters.is_empty() {
            lines.push("# status = \"active\"".to_string());
            lines.push("# vrf = \"Production\"".to_string());
            lines.push("# tenant = \"Ops\"".to_string());
        } else {
            for (key, value) in filters {
                lines.push(format!("{key} = {}", toml::Value::String(value.clone())));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }

    /// Write a batch file
    pub fn save(path: impl AsRef<Path>, prefixes: &[String], filters: &Filters) -> Result<(), CliError> {
        fs::write(path, Self::render(prefixes, filters))?;
        Ok(())
    }
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}
