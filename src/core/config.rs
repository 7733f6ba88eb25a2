use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub cloud_storage: CloudStorageConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Local storage root and upload limits
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base directory; local artifacts live under `{path}/uploads/{category}`
    pub path: String,
    /// Largest accepted upload in bytes
    pub max_upload_size: u64,
    /// Slowest acceptable upload throughput, used to size the upload deadline
    pub min_throughput_bytes: u64,
    /// Fixed allowance added to every upload deadline
    pub upload_timeout_base_secs: u64,
    /// Deadline applied to every other backend call
    pub operation_timeout_secs: u64,
}

/// S3-compatible object storage settings
///
/// An empty `provider` means local storage only.
#[derive(Debug, Clone)]
pub struct CloudStorageConfig {
    pub provider: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    /// Public base URL used to build object URLs; `None` leaves URLs unavailable
    pub public_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Owner assigned to requests without a valid bearer token
    pub default_user_id: i64,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            cloud_storage: CloudStorageConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl StorageConfig {
    const DEFAULT_PATH: &'static str = "./storage";
    const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024; // 100MB
    const DEFAULT_MIN_THROUGHPUT_BYTES: u64 = 1024 * 1024; // 1MB/s
    const DEFAULT_UPLOAD_TIMEOUT_BASE_SECS: u64 = 30;
    const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;
    const LARGE_UPLOAD_WARNING: u64 = 1024 * 1024 * 1024; // 1GB

    pub fn from_env() -> Result<Self, String> {
        let path = env::var("STORAGE_PATH").unwrap_or_else(|_| Self::DEFAULT_PATH.to_string());
        if path.trim().is_empty() {
            return Err("STORAGE_PATH cannot be empty".to_string());
        }

        let max_upload_size = env::var("MAX_UPLOAD_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_UPLOAD_SIZE.to_string())
            .parse::<u64>()
            .map_err(|_| "MAX_UPLOAD_SIZE must be a valid number".to_string())?;
        if max_upload_size == 0 {
            return Err("MAX_UPLOAD_SIZE must be greater than 0".to_string());
        }
        if max_upload_size > Self::LARGE_UPLOAD_WARNING {
            tracing::warn!(
                "MAX_UPLOAD_SIZE is set to {} bytes (over 1GB), uploads may exhaust memory or disk",
                max_upload_size
            );
        }

        let min_throughput_bytes = env::var("UPLOAD_MIN_THROUGHPUT_BYTES")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_THROUGHPUT_BYTES.to_string())
            .parse::<u64>()
            .map_err(|_| "UPLOAD_MIN_THROUGHPUT_BYTES must be a valid number".to_string())?;
        if min_throughput_bytes == 0 {
            return Err("UPLOAD_MIN_THROUGHPUT_BYTES must be greater than 0".to_string());
        }

        let upload_timeout_base_secs = env::var("UPLOAD_TIMEOUT_BASE_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_UPLOAD_TIMEOUT_BASE_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "UPLOAD_TIMEOUT_BASE_SECS must be a valid number".to_string())?;

        let operation_timeout_secs = env::var("STORAGE_OPERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_OPERATION_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "STORAGE_OPERATION_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            path,
            max_upload_size,
            min_throughput_bytes,
            upload_timeout_base_secs,
            operation_timeout_secs,
        })
    }

    /// Deadline for streaming one upload into the backend
    pub fn upload_timeout(&self) -> Duration {
        let transfer_secs = self.max_upload_size / self.min_throughput_bytes.max(1);
        Duration::from_secs(self.upload_timeout_base_secs.saturating_add(transfer_secs))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl CloudStorageConfig {
    const DEFAULT_REGION: &'static str = "us-east-1";

    pub fn from_env() -> Result<Self, String> {
        let provider = env::var("CLOUD_STORAGE_PROVIDER")
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let access_key = env::var("CLOUD_STORAGE_ACCESS_KEY").unwrap_or_default();
        let secret_key = env::var("CLOUD_STORAGE_SECRET_KEY").unwrap_or_default();
        let bucket = env::var("CLOUD_STORAGE_BUCKET").unwrap_or_default();
        let endpoint = env::var("CLOUD_STORAGE_ENDPOINT")
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        let region = env::var("CLOUD_STORAGE_REGION")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_REGION.to_string());
        let public_endpoint = env::var("CLOUD_STORAGE_PUBLIC_ENDPOINT")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            provider,
            access_key,
            secret_key,
            bucket,
            endpoint,
            region,
            public_endpoint,
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.provider.is_empty()
    }

    /// Returns the first missing required setting, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.endpoint.is_empty() {
            Some("CLOUD_STORAGE_ENDPOINT")
        } else if self.bucket.is_empty() {
            Some("CLOUD_STORAGE_BUCKET")
        } else if self.access_key.is_empty() {
            Some("CLOUD_STORAGE_ACCESS_KEY")
        } else if self.secret_key.is_empty() {
            Some("CLOUD_STORAGE_SECRET_KEY")
        } else {
            None
        }
    }
}

impl AuthConfig {
    const DEFAULT_JWT_SECRET: &'static str = "nexushub-development-secret";
    const DEFAULT_USER_ID: i64 = 1;
    const MIN_SECRET_LENGTH: usize = 32;

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret =
            env::var("JWT_SECRET").unwrap_or_else(|_| Self::DEFAULT_JWT_SECRET.to_string());
        if jwt_secret == Self::DEFAULT_JWT_SECRET {
            tracing::warn!("JWT_SECRET is not set, using the development default");
        } else if jwt_secret.len() < Self::MIN_SECRET_LENGTH {
            tracing::warn!(
                "JWT_SECRET is shorter than {} characters",
                Self::MIN_SECRET_LENGTH
            );
        }

        let default_user_id = env::var("DEFAULT_USER_ID")
            .unwrap_or_else(|_| Self::DEFAULT_USER_ID.to_string())
            .parse::<i64>()
            .map_err(|_| "DEFAULT_USER_ID must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            default_user_id,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "NexusHub API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for NexusHub".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
