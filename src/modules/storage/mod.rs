mod backend;
mod local_storage;
mod minio_client;

pub use backend::{BackendKind, ByteStream, StorageBackend, StorageError};
pub use local_storage::{LocalStorage, PUBLIC_UPLOADS_PREFIX};
pub use minio_client::MinIOClient;

use std::sync::Arc;

use crate::core::config::{CloudStorageConfig, StorageConfig};

/// Providers served through the S3-compatible client
const S3_COMPATIBLE_PROVIDERS: &[&str] = &["minio", "s3", "aws"];

/// Chooses the process-wide storage backend.
///
/// Object storage is used when configured and reachable; otherwise the local
/// backend is returned and the degradation is logged. Only a failure to set
/// up the local backend is an error.
pub async fn init_storage_backend(
    storage: &StorageConfig,
    cloud: &CloudStorageConfig,
) -> Result<Arc<dyn StorageBackend>, StorageError> {
    if cloud.is_enabled() {
        if S3_COMPATIBLE_PROVIDERS.contains(&cloud.provider.as_str()) {
            match tokio::time::timeout(storage.operation_timeout(), MinIOClient::connect(cloud))
                .await
            {
                Ok(Ok(client)) => {
                    tracing::info!(
                        "Using object storage backend (provider={}, bucket={})",
                        cloud.provider,
                        client.bucket_name()
                    );
                    return Ok(Arc::new(client));
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        "Object storage initialization failed ({}), falling back to local storage",
                        e
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "Object storage initialization timed out after {:?}, falling back to local storage",
                        storage.operation_timeout()
                    );
                }
            }
        } else {
            tracing::warn!(
                "Cloud storage provider '{}' is not supported, falling back to local storage",
                cloud.provider
            );
        }
    }

    let local = LocalStorage::new(&storage.path)?;
    tracing::info!("Using local storage backend at {}", local.root().display());
    Ok(Arc::new(local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_config(dir: &TempDir) -> StorageConfig {
        StorageConfig {
            path: dir.path().to_string_lossy().into_owned(),
            max_upload_size: 1024,
            min_throughput_bytes: 1024,
            upload_timeout_base_secs: 5,
            operation_timeout_secs: 3,
        }
    }

    fn cloud_config(provider: &str, endpoint: &str) -> CloudStorageConfig {
        CloudStorageConfig {
            provider: provider.to_string(),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
            bucket: "nexushub".to_string(),
            endpoint: endpoint.to_string(),
            region: "us-east-1".to_string(),
            public_endpoint: None,
        }
    }

    #[tokio::test]
    async fn test_local_when_no_provider() {
        let dir = TempDir::new().unwrap();
        let backend = init_storage_backend(&storage_config(&dir), &cloud_config("", ""))
            .await
            .unwrap();
        assert_eq!(backend.kind(), BackendKind::Local);
    }

    #[tokio::test]
    async fn test_unsupported_provider_falls_back_to_local() {
        let dir = TempDir::new().unwrap();
        let backend = init_storage_backend(
            &storage_config(&dir),
            &cloud_config("aliyun", "http://127.0.0.1:1"),
        )
        .await
        .unwrap();
        assert_eq!(backend.kind(), BackendKind::Local);
    }

    #[tokio::test]
    async fn test_incomplete_cloud_config_falls_back_to_local() {
        let dir = TempDir::new().unwrap();
        let backend = init_storage_backend(&storage_config(&dir), &cloud_config("minio", ""))
            .await
            .unwrap();
        assert_eq!(backend.kind(), BackendKind::Local);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back_and_local_uploads_work() {
        let dir = TempDir::new().unwrap();
        let backend = init_storage_backend(
            &storage_config(&dir),
            &cloud_config("minio", "http://127.0.0.1:1"),
        )
        .await
        .unwrap();
        assert_eq!(backend.kind(), BackendKind::Local);

        let key = backend.generate_key(1, "document", "notes.txt", 1);
        let written = backend
            .put(&key, Box::new(&b"0123456789"[..]), "text/plain")
            .await
            .unwrap();
        assert_eq!(written, 10);
        assert!(key.starts_with(&*dir.path().to_string_lossy()));
    }
}
