//! Storage configuration types.

use std::time::Duration;

use corkboard_shared::config::{StorageProvider, StorageSettings};

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Prefix joined with a key to form the public URL.
    pub public_base_url: String,
    /// Upper bound for one blob write, applied by the submission pipeline.
    pub put_timeout: Duration,
}

impl StorageConfig {
    /// Default public base URL, served by the files route.
    pub const DEFAULT_PUBLIC_BASE_URL: &'static str = "/api/v1/files";
    /// Default put timeout: 30 seconds.
    pub const DEFAULT_PUT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            public_base_url: Self::DEFAULT_PUBLIC_BASE_URL.to_string(),
            put_timeout: Self::DEFAULT_PUT_TIMEOUT,
        }
    }

    /// Set the public base URL.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Set the put timeout.
    #[must_use]
    pub fn with_put_timeout(mut self, timeout: Duration) -> Self {
        self.put_timeout = timeout;
        self
    }

    /// Public URL for a stored key.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url.trim_end_matches('/'))
    }
}

impl From<StorageSettings> for StorageConfig {
    fn from(settings: StorageSettings) -> Self {
        Self::new(settings.provider)
            .with_public_base_url(settings.public_base_url)
            .with_put_timeout(Duration::from_secs(settings.put_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new(StorageProvider::Memory);
        assert_eq!(config.public_base_url, StorageConfig::DEFAULT_PUBLIC_BASE_URL);
        assert_eq!(config.put_timeout, StorageConfig::DEFAULT_PUT_TIMEOUT);
    }

    #[test]
    fn test_public_url_joins_without_double_slash() {
        let config = StorageConfig::new(StorageProvider::Memory)
            .with_public_base_url("https://cdn.example.com/");
        assert_eq!(
            config.public_url("messages/abc-1.png"),
            "https://cdn.example.com/messages/abc-1.png"
        );
    }

    #[test]
    fn test_from_settings() {
        let settings = StorageSettings {
            provider: StorageProvider::local_fs("./data"),
            public_base_url: "https://files.example.com".to_string(),
            put_timeout_secs: 5,
        };
        let config = StorageConfig::from(settings);
        assert_eq!(config.provider.name(), "local");
        assert_eq!(config.put_timeout, Duration::from_secs(5));
    }
}
