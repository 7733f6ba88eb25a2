//! MinIO/S3-compatible object storage.
//!
//! Uses rust-s3 with path-style addressing. The crate is built without
//! `fail-on-err`, so every response status is checked here.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use super::backend::{BackendKind, ByteStream, StorageBackend, StorageError};
use crate::core::config::CloudStorageConfig;
use crate::shared::validation::sanitize_file_name;

type HmacSha256 = Hmac<Sha256>;

pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: Option<String>,
    access_key: String,
    secret_key: String,
    region_name: String,
    http_client: Client,
}

impl MinIOClient {
    /// Builds the client without touching the network
    pub fn new(config: &CloudStorageConfig) -> Result<Self, StorageError> {
        if let Some(field) = config.missing_field() {
            return Err(StorageError::Unavailable(format!("{} is not set", field)));
        }

        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("Failed to create credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| StorageError::Backend(format!("Failed to create bucket handle: {}", e)))?;

        // http://endpoint/bucket instead of http://bucket.endpoint
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| StorageError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint.clone(),
            public_endpoint: config.public_endpoint.clone(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            region_name: config.region.clone(),
            http_client,
        })
    }

    /// Builds the client and makes sure its bucket is usable
    pub async fn connect(config: &CloudStorageConfig) -> Result<Self, StorageError> {
        let client = Self::new(config)?;
        client.ensure_bucket_exists().await?;

        if client.public_endpoint.is_some() {
            client.set_public_read_policy().await;
        }

        info!(
            "Object storage ready: endpoint={}, bucket={}",
            client.endpoint,
            client.bucket.name()
        );
        Ok(client)
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Creates the bucket, then confirms it exists.
    ///
    /// "Already exists" answers from the create call are expected; only the
    /// existence probe decides success.
    async fn ensure_bucket_exists(&self) -> Result<(), StorageError> {
        match Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(response) if response.success() => {
                info!("Bucket '{}' created", self.bucket.name());
            }
            Ok(response) => {
                let body = response.response_text.to_string();
                if body.contains("BucketAlreadyOwnedByYou") || body.contains("BucketAlreadyExists")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    debug!(
                        "Create bucket '{}' returned {}: {}",
                        self.bucket.name(),
                        response.response_code,
                        body
                    );
                }
            }
            Err(e) => {
                debug!("Create bucket '{}' failed: {}", self.bucket.name(), e);
            }
        }

        let exists = self.bucket.exists().await.map_err(|e| {
            StorageError::Unavailable(format!(
                "Failed to reach bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        if exists {
            Ok(())
        } else {
            Err(StorageError::Unavailable(format!(
                "Bucket '{}' does not exist and could not be created",
                self.bucket.name()
            )))
        }
    }

    /// Grants anonymous read on the bucket so resolved URLs are fetchable.
    ///
    /// Failure is logged only; the policy can be applied manually.
    async fn set_public_read_policy(&self) {
        let bucket_name = self.bucket.name();

        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"AWS": "*"},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{bucket_name}/*")]
                }
            ]
        });

        match self
            .put_bucket_policy_with_sigv4(&bucket_name, &policy.to_string())
            .await
        {
            Ok(()) => info!("Set public read policy for {}/*", bucket_name),
            Err(e) => warn!(
                "Failed to set bucket policy for '{}': {}. \
                Set it manually with: mc anonymous set download <alias>/{}",
                bucket_name, e, bucket_name
            ),
        }
    }

    /// Put bucket policy using AWS Signature v4
    async fn put_bucket_policy_with_sigv4(
        &self,
        bucket_name: &str,
        policy: &str,
    ) -> Result<(), StorageError> {
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let endpoint_url = Url::parse(&self.endpoint)
            .map_err(|e| StorageError::Backend(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| StorageError::Backend("Endpoint URL has no host".to_string()))?;
        let host_header = match endpoint_url.port() {
            Some(p) => format!("{}:{}", host, p),
            None => host.to_string(),
        };

        let url = format!("{}/{}?policy", self.endpoint, bucket_name);
        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));

        let canonical_uri = format!("/{}", bucket_name);
        let canonical_querystring = "policy=";
        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            host_header, payload_hash, amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";

        let canonical_request = format!(
            "PUT\n{}\n{}\n{}\n{}\n{}",
            canonical_uri, canonical_querystring, canonical_headers, signed_headers, payload_hash
        );

        let algorithm = "AWS4-HMAC-SHA256";
        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region_name);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            algorithm, amz_date, credential_scope, canonical_request_hash
        );

        let signature = self.calculate_signature(&date_stamp, &string_to_sign)?;

        let authorization_header = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            algorithm, self.access_key, credential_scope, signed_headers, signature
        );

        let response = self
            .http_client
            .put(&url)
            .header("Host", &host_header)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &authorization_header)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to send policy request: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(StorageError::Backend(format!(
                "Failed to set bucket policy: {} - {}",
                status, body
            )))
        }
    }

    fn calculate_signature(
        &self,
        date_stamp: &str,
        string_to_sign: &str,
    ) -> Result<String, StorageError> {
        let k_date = Self::hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        let k_region = Self::hmac_sha256(&k_date, self.region_name.as_bytes())?;
        let k_service = Self::hmac_sha256(&k_region, b"s3")?;
        let k_signing = Self::hmac_sha256(&k_service, b"aws4_request")?;

        let signature = Self::hmac_sha256(&k_signing, string_to_sign.as_bytes())?;
        Ok(hex::encode(signature))
    }

    fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| StorageError::Backend(format!("HMAC key error: {}", e)))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn check_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|s| s == "..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl StorageBackend for MinIOClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Object
    }

    fn generate_key(&self, owner_id: i64, category: &str, file_name: &str, timestamp: i64) -> String {
        format!(
            "{}_{}_{}/{}",
            owner_id,
            sanitize_file_name(category),
            timestamp,
            sanitize_file_name(file_name)
        )
    }

    async fn put(
        &self,
        key: &str,
        mut reader: ByteStream,
        content_type: &str,
    ) -> Result<u64, StorageError> {
        Self::check_key(key)?;

        // Objects are written in one request so a failed upload never leaves a partial object
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;

        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to upload '{}': {}", key, e)))?;

        if !is_success(response.status_code()) {
            return Err(StorageError::Backend(format!(
                "Upload of '{}' returned status {}",
                key,
                response.status_code()
            )));
        }

        debug!(
            "Uploaded '{}' ({} bytes) to bucket '{}'",
            key,
            data.len(),
            self.bucket.name()
        );
        Ok(data.len() as u64)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        Self::check_key(key)?;

        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to download '{}': {}", key, e)))?;

        match response.status_code() {
            status if is_success(status) => Ok(response.to_vec()),
            404 => Err(StorageError::NotFound(key.to_string())),
            status => Err(StorageError::Backend(format!(
                "Download of '{}' returned status {}",
                key, status
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        Self::check_key(key)?;

        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to delete '{}': {}", key, e)))?;

        match response.status_code() {
            status if is_success(status) || status == 404 => {
                debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
                Ok(())
            }
            status => Err(StorageError::Backend(format!(
                "Delete of '{}' returned status {}",
                key, status
            ))),
        }
    }

    fn resolve_url(&self, key: &str) -> Result<String, StorageError> {
        Self::check_key(key)?;
        let public_endpoint = self.public_endpoint.as_ref().ok_or_else(|| {
            StorageError::Unavailable("no public endpoint configured".to_string())
        })?;

        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        Ok(format!(
            "{}/{}/{}",
            public_endpoint,
            self.bucket.name(),
            encoded.join("/")
        ))
    }

    async fn rename(&self, key: &str, _new_name: &str) -> Result<String, StorageError> {
        Err(StorageError::Unsupported(format!(
            "rename of object '{}' is not supported",
            key
        )))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Self::check_key(key)?;

        let (_, status) = self
            .bucket
            .head_object(key)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to stat '{}': {}", key, e)))?;

        match status {
            status if is_success(status) => Ok(true),
            404 => Ok(false),
            status => Err(StorageError::Backend(format!(
                "Stat of '{}' returned status {}",
                key, status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(public_endpoint: Option<&str>) -> CloudStorageConfig {
        CloudStorageConfig {
            provider: "minio".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket: "nexushub".to_string(),
            endpoint: "http://127.0.0.1:9000".to_string(),
            region: "us-east-1".to_string(),
            public_endpoint: public_endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_generate_key_layout() {
        let client = MinIOClient::new(&config(None)).unwrap();
        assert_eq!(
            client.generate_key(5, "document", "../notes.txt", 1_700_000_000),
            "5_document_1700000000/notes.txt"
        );
    }

    #[test]
    fn test_resolve_url_requires_public_endpoint() {
        let client = MinIOClient::new(&config(None)).unwrap();
        assert!(matches!(
            client.resolve_url("5_media_1/a.png"),
            Err(StorageError::Unavailable(_))
        ));

        let client = MinIOClient::new(&config(Some("https://cdn.example.com"))).unwrap();
        assert_eq!(
            client.resolve_url("5_media_1/my photo.png").unwrap(),
            "https://cdn.example.com/nexushub/5_media_1/my%20photo.png"
        );
    }

    #[test]
    fn test_new_requires_complete_config() {
        let mut incomplete = config(None);
        incomplete.secret_key.clear();
        assert!(matches!(
            MinIOClient::new(&incomplete),
            Err(StorageError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_is_unsupported() {
        let client = MinIOClient::new(&config(None)).unwrap();
        assert!(matches!(
            client.rename("5_media_1/a.png", "b.png").await,
            Err(StorageError::Unsupported(_))
        ));
    }

    #[test]
    fn test_check_key() {
        assert!(MinIOClient::check_key("1_code_2/main.rs").is_ok());
        assert!(MinIOClient::check_key("").is_err());
        assert!(MinIOClient::check_key("/abs/key").is_err());
        assert!(MinIOClient::check_key("a/../b").is_err());
    }

    #[test]
    fn test_signature_is_hex_sha256() {
        let client = MinIOClient::new(&config(None)).unwrap();
        let first = client.calculate_signature("20250101", "payload").unwrap();
        let second = client.calculate_signature("20250101", "payload").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(
            first,
            client.calculate_signature("20250102", "payload").unwrap()
        );
    }
}
