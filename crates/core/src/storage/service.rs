//! Storage service implementation using Apache OpenDAL.

use std::future::Future;

use bytes::Bytes;
use opendal::{Operator, services};
use tracing::{debug, warn};

use corkboard_shared::config::StorageProvider;

use super::config::StorageConfig;
use super::error::StorageError;

/// A blob that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Storage key it was written under.
    pub key: String,
    /// Publicly fetchable URL.
    pub url: String,
}

/// Write side of the blob store.
///
/// Each call is attempted once; callers decide what a failure means and
/// how long to wait for it.
pub trait BlobStore: Send + Sync {
    /// Put `bytes` under `key` and return its public URL.
    fn put(
        &self,
        key: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> impl Future<Output = Result<StoredObject, StorageError>> + Send;
}

/// Storage service for uploaded files.
#[derive(Debug, Clone)]
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder).map(|op| op.finish())
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);
                Operator::new(builder).map(|op| op.finish())
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root)).map(|op| op.finish())
            }
            StorageProvider::Memory => {
                Operator::new(services::Memory::default()).map(|op| op.finish())
            }
        };

        operator.map_err(|e| StorageError::configuration(e.to_string()))
    }

    /// Read a blob back, for deployments that serve files themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or the blob cannot be read.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        validate_key(key)?;
        let buffer = self.operator.read(key).await.map_err(|e| match e.kind() {
            opendal::ErrorKind::NotFound => StorageError::not_found(key),
            _ => StorageError::from(e),
        })?;
        Ok(buffer.to_bytes())
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl BlobStore for StorageService {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        let size = bytes.len();

        let written = if self
            .operator
            .info()
            .full_capability()
            .write_with_content_type
        {
            self.operator
                .write_with(key, bytes)
                .content_type(mime_type)
                .await
        } else {
            self.operator.write(key, bytes).await
        };

        match written {
            Ok(_) => {
                debug!(key, size, provider = self.provider_name(), "Blob stored");
                Ok(StoredObject {
                    key: key.to_string(),
                    url: self.config.public_url(key),
                })
            }
            Err(e) => {
                warn!(key, error = %e, "Blob write rejected");
                Err(StorageError::from(e))
            }
        }
    }
}

/// Reject keys that could escape the store root.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let escapes = key.is_empty()
        || key.starts_with('/')
        || key.ends_with('/')
        || key.split('/').any(|segment| segment.is_empty() || segment == "..");

    if escapes {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_service() -> StorageService {
        let config = StorageConfig::new(StorageProvider::Memory)
            .with_public_base_url("https://cdn.example.com");
        StorageService::from_config(config).expect("should create service")
    }

    #[tokio::test]
    async fn test_put_returns_public_url_and_read_back() {
        let service = memory_service();

        let stored = service
            .put("messages/abc-1.png", Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .unwrap();

        assert_eq!(stored.key, "messages/abc-1.png");
        assert_eq!(stored.url, "https://cdn.example.com/messages/abc-1.png");
        let read = service.read("messages/abc-1.png").await.unwrap();
        assert_eq!(read.as_ref(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_put_rejects_traversal_key() {
        let service = memory_service();
        let err = service
            .put("../escape.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let service = memory_service();
        let err = service.read("messages/missing.png").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { key } if key == "messages/missing.png"));
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("messages/a.png").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("dir/").is_err());
    }

    #[test]
    fn test_local_fs_provider_name() {
        let config = StorageConfig::new(StorageProvider::local_fs("./test_uploads"));
        let service = StorageService::from_config(config).expect("should create service");
        assert_eq!(service.provider_name(), "local");
    }
}
