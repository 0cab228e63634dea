//! Connection settings
//!
//! Settings come from `NETBOX_*` environment variables, falling back to a `.env`
//! file in the working directory. Process environment always wins.

use crate::error::NetBoxError;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Results requested per API page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Per-request timeout unless configured otherwise
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// NetBox base URL
pub const ENV_URL: &str = "NETBOX_URL";
/// API token
pub const ENV_TOKEN: &str = "NETBOX_TOKEN";
/// Records per page
pub const ENV_PAGE_SIZE: &str = "NETBOX_PAGE_SIZE";
/// Request timeout in seconds
pub const ENV_TIMEOUT: &str = "NETBOX_TIMEOUT";
/// TLS certificate verification toggle
pub const ENV_VERIFY_SSL: &str = "NETBOX_VERIFY_SSL";

/// NetBox connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct NetBoxSettings {
    /// Base URL without the `/api` suffix (e.g. `https://netbox.example.com`)
    pub url: String,
    /// Static API token
    pub token: String,
    /// Records requested per page
    pub page_size: usize,
    /// Per-request timeout
    pub timeout: Duration,
    /// Verify TLS certificates
    pub verify_ssl: bool,
}

impl fmt::Debug for NetBoxSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetBoxSettings")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl NetBoxSettings {
    /// Settings with defaults for everything but URL and token
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_ssl: true,
        }
    }

    /// Load settings from the process environment, then the given `.env` file
    ///
    /// A missing `.env` file is not an error; missing required keys are.
    pub fn load(env_file: impl AsRef<Path>) -> Result<Self, NetBoxError> {
        let path = env_file.as_ref();
        let file_values = match std::fs::read_to_string(path) {
            Ok(contents) => parse_env_file(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(NetBoxError::InvalidConfig(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file_values.get(key).cloned()))
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NetBoxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = get(ENV_URL)
            .ok_or_else(|| NetBoxError::InvalidConfig(format!("{ENV_URL} is not set")))?;
        let token = get(ENV_TOKEN)
            .ok_or_else(|| NetBoxError::InvalidConfig(format!("{ENV_TOKEN} is not set")))?;

        let mut settings = Self::new(url.trim_end_matches('/'), token);

        if let Some(raw) = get(ENV_PAGE_SIZE) {
            settings.page_size = raw.parse().map_err(|_| {
                NetBoxError::InvalidConfig(format!("{ENV_PAGE_SIZE} must be a positive integer, got '{raw}'"))
            })?;
        }
        if let Some(raw) = get(ENV_TIMEOUT) {
            let secs: u64 = raw.parse().map_err(|_| {
                NetBoxError::InvalidConfig(format!("{ENV_TIMEOUT} must be a number of seconds, got '{raw}'"))
            })?;
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get(ENV_VERIFY_SSL) {
            settings.verify_ssl = parse_bool(&raw).ok_or_else(|| {
                NetBoxError::InvalidConfig(format!("{ENV_VERIFY_SSL} must be true or false, got '{raw}'"))
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), NetBoxError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(NetBoxError::InvalidConfig(format!(
                "{ENV_URL} must start with http:// or https://, got '{}'",
                self.url
            )));
        }
        if self.token.is_empty() {
            return Err(NetBoxError::InvalidConfig(format!("{ENV_TOKEN} is empty")));
        }
        if self.page_size == 0 {
            return Err(NetBoxError::InvalidConfig(format!("{ENV_PAGE_SIZE} must be at least 1")));
        }
        if self.timeout.is_zero() {
            return Err(NetBoxError::InvalidConfig(format!("{ENV_TIMEOUT} must be at least 1 second")));
        }
        Ok(())
    }
}

/// Parse `.env` file contents into a key/value map
///
/// Blank lines and `#` comments are skipped, keys are upper-cased and a single
/// pair of surrounding quotes is stripped from values.
pub fn parse_env_file(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim().trim_start_matches("export ").trim().to_uppercase();
            (key, unquote(value.trim()).to_string())
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let settings = NetBoxSettings::from_lookup(lookup(&[
            (ENV_URL, "https://netbox.example.com/"),
            (ENV_TOKEN, "abc123"),
        ]))
        .unwrap();

        assert_eq!(settings.url, "https://netbox.example.com");
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(settings.verify_ssl);
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let err = NetBoxSettings::from_lookup(lookup(&[(ENV_URL, "https://netbox.example.com")]))
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains(ENV_TOKEN));
    }

    #[test]
    fn test_optional_values_parsed() {
        let settings = NetBoxSettings::from_lookup(lookup(&[
            (ENV_URL, "http://localhost:8000"),
            (ENV_TOKEN, "abc"),
            (ENV_PAGE_SIZE, "250"),
            (ENV_TIMEOUT, "5"),
            (ENV_VERIFY_SSL, "False"),
        ]))
        .unwrap();

        assert_eq!(settings.page_size, 250);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert!(!settings.verify_ssl);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for (key, value) in [
            (ENV_PAGE_SIZE, "0"),
            (ENV_PAGE_SIZE, "lots"),
            (ENV_TIMEOUT, "0"),
            (ENV_VERIFY_SSL, "maybe"),
        ] {
            let result = NetBoxSettings::from_lookup(lookup(&[
                (ENV_URL, "https://netbox.example.com"),
                (ENV_TOKEN, "abc"),
                (key, value),
            ]));
            assert!(result.is_err(), "{key}={value} should be rejected");
        }

        let bad_url = NetBoxSettings::from_lookup(lookup(&[(ENV_URL, "netbox.example.com"), (ENV_TOKEN, "abc")]));
        assert!(bad_url.unwrap_err().is_config());
    }

    #[test]
    fn test_parse_env_file() {
        let values = parse_env_file(
            "# NetBox connection settings\n\
             \n\
             NETBOX_URL=https://netbox.example.com\n\
             netbox_token = \"quoted-token\"\n\
             # NETBOX_PAGE_SIZE=100\n\
             export NETBOX_TIMEOUT='10'\n",
        );

        assert_eq!(values.get(ENV_URL).unwrap(), "https://netbox.example.com");
        assert_eq!(values.get(ENV_TOKEN).unwrap(), "quoted-token");
        assert_eq!(values.get(ENV_TIMEOUT).unwrap(), "10");
        assert!(!values.contains_key(ENV_PAGE_SIZE));
    }

    #[test]
    fn test_load_reads_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "NETBOX_URL=https://from-file.example.com\nNETBOX_TOKEN=file-token\nNETBOX_PAGE_SIZE=7\n",
        )
        .unwrap();

        // Only meaningful when the test environment does not set these itself
        if std::env::var(ENV_URL).is_err() && std::env::var(ENV_TOKEN).is_err() {
            let settings = NetBoxSettings::load(&path).unwrap();
            assert_eq!(settings.url, "https://from-file.example.com");
            assert_eq!(settings.token, "file-token");
        }
    }

    #[test]
    fn test_env_overrides_file() {
        let file = parse_env_file("NETBOX_URL=https://file.example.com\nNETBOX_TOKEN=file\n");
        let env = lookup(&[(ENV_TOKEN, "from-env")]);
        let settings =
            NetBoxSettings::from_lookup(|key| env(key).or_else(|| file.get(key).cloned())).unwrap();

        assert_eq!(settings.url, "https://file.example.com");
        assert_eq!(settings.token, "from-env");
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = NetBoxSettings::new("https://netbox.example.com", "super-secret");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
