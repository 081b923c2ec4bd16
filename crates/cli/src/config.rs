//! Configuration management for the CLI
//!
//! Settings are layered: built-in defaults, then the configuration file,
//! then `BOOKSHOP_*` environment variables. Command-line flags are applied
//! on top by the caller.

use anyhow::{bail, Context, Result};
use bookshop_lib::{ClientConfig, ClientConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://localhost:8443/rest";

/// CLI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// REST API base URI
    pub api_url: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Settings {
    /// Load settings; an explicit file must exist, the default one may be absent
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("request_timeout_secs", 30_i64)?
            .set_default("connect_timeout_secs", 10_i64)?;

        match file {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file {} does not exist", path.display());
                }
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(path) = Self::config_path() {
                    builder = builder.add_source(config::File::from(path).required(false));
                }
            }
        }

        let config = builder
            .add_source(config::Environment::with_prefix("BOOKSHOP"))
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Client configuration, with `api_url` overriding the configured base URI
    pub fn client_config(&self, api_url: Option<&str>) -> Result<ClientConfig> {
        let base_uri = api_url.unwrap_or(&self.api_url);
        url::Url::parse(base_uri).with_context(|| format!("Invalid API URL: {}", base_uri))?;

        ClientConfigBuilder::new()
            .base_uri(base_uri)
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .build()
            .context("Invalid client configuration")
    }

    /// Default configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("bookshop").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_url = \"http://buecher.example:8080/rest\"").unwrap();
        writeln!(file, "request_timeout_secs = 5").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.api_url, "http://buecher.example:8080/rest");
        assert_eq!(settings.request_timeout_secs, 5);
        assert_eq!(settings.connect_timeout_secs, 10);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_flag_overrides_configured_url() {
        let settings = Settings {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        };

        let config = settings.client_config(Some("http://localhost:3000/rest")).unwrap();
        assert_eq!(config.base_uri, "http://localhost:3000/rest");
        assert_eq!(config.request_timeout, Duration::from_secs(30));

        assert!(settings.client_config(Some("not a url")).is_err());
    }
}
