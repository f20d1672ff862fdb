//! API client configuration.
//!
//! # Example
//!
//! ```rust
//! use telegraph_core::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://api.telegra.ph/")
//!     .timeout(10)
//!     .build();
//! assert_eq!(config.timeout, 10);
//! ```

/// Default Telegraph API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.telegra.ph/";

/// HTTP settings for [`crate::TelegraphClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; method names are appended to it.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: 30,
            user_agent: format!("telegraph-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }
}

/// Builder for ClientConfig.
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ClientConfig::default() }
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.config.base_url = value.into();
        self
    }

    pub fn timeout(mut self, value: u64) -> Self {
        self.config.timeout = value;
        self
    }

    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
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
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.starts_with("telegraph-core/"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::builder().timeout(5).user_agent("test-agent").build();
        assert_eq!(config.timeout, 5);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
