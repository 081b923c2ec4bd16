//! Client configuration

use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URI of the REST API (e.g., "https://localhost:8443/rest")
    pub base_uri: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: "https://localhost:8443/rest".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default timeouts for the given base URI
    pub fn with_base_uri(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            ..Self::default()
        }
    }

    /// Parse the base URI, normalized to end with `/` so relative paths extend it
    pub fn base_url(&self) -> SyncResult<url::Url> {
        let mut raw = self.base_uri.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = url::Url::parse(&raw)
            .map_err(|e| SyncError::Config(format!("invalid base URI {}: {}", self.base_uri, e)))?;
        if url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "base URI {} cannot carry paths",
                self.base_uri
            )));
        }
        Ok(url)
    }
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.config.base_uri = base_uri.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> SyncResult<ClientConfig> {
        self.config.base_url()?;
        Ok(self.config)
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_uri, "https://localhost:8443/rest");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::with_base_uri("http://api.test/rest");
        let url = config.base_url().unwrap();
        assert_eq!(url.as_str(), "http://api.test/rest/");
        assert_eq!(
            url.join("buecher/42").unwrap().as_str(),
            "http://api.test/rest/buecher/42"
        );
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfigBuilder::new()
            .base_uri("http://api.test")
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.base_uri, "http://api.test");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_rejects_invalid_uri() {
        let result = ClientConfigBuilder::new().base_uri("not a uri").build();
        assert!(matches!(result, Err(SyncError::Config(_))));
    }
}
