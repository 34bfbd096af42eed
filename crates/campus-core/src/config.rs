//! Configuration module
//!
//! Process configuration (database, storage backend) and the explicit
//! `InlineMediaConfig` object handed to the inline media lifecycle service.
//! Environment variables are read once in `Config::from_env`; nothing else in
//! the workspace consults process state.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const TEMP_TTL_MINUTES: i64 = 60;
const PURGE_BATCH_SIZE: i64 = 100;
/// Upper bound for the TEMP time-to-live: one year.
const MAX_TEMP_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Settings that govern the inline media lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineMediaConfig {
    /// Public base URL under which managed media is served, without trailing slash.
    /// `None` falls back to the legacy path-segment rule.
    pub public_media_base_url: Option<String>,
    /// Time-to-live of a TEMP upload before it becomes purge-eligible.
    pub temp_ttl_minutes: i64,
    /// Default number of rows examined by one purge sweep.
    pub purge_batch_size: i64,
    /// Deployment environment name (`production`, `staging`, `development`, ...).
    pub environment: String,
}

impl InlineMediaConfig {
    pub fn new(public_media_base_url: Option<String>, environment: impl Into<String>) -> Self {
        Self {
            public_media_base_url: normalize_base_url(public_media_base_url),
            temp_ttl_minutes: TEMP_TTL_MINUTES,
            purge_batch_size: PURGE_BATCH_SIZE,
            environment: environment.into(),
        }
    }

    pub fn with_temp_ttl_minutes(mut self, minutes: i64) -> Self {
        self.temp_ttl_minutes = minutes;
        self
    }

    pub fn with_purge_batch_size(mut self, batch_size: i64) -> Self {
        self.purge_batch_size = batch_size;
        self
    }

    /// Check if the lifecycle runs in a production-classified environment.
    ///
    /// Governs whether a physical delete without a configured storage backend
    /// is an error or a silent no-op.
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn public_media_base_url(&self) -> Option<&str> {
        self.public_media_base_url.as_deref()
    }

    /// TEMP time-to-live, `None` when the configured minutes are out of range.
    pub fn temp_ttl(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_minutes(self.temp_ttl_minutes)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.temp_ttl_minutes <= 0 || self.temp_ttl_minutes > MAX_TEMP_TTL_MINUTES {
            return Err(anyhow::anyhow!(
                "INLINE_MEDIA_TEMP_TTL_MINUTES must be between 1 and {} minutes",
                MAX_TEMP_TTL_MINUTES
            ));
        }

        if self.purge_batch_size <= 0 {
            return Err(anyhow::anyhow!(
                "INLINE_MEDIA_PURGE_BATCH_SIZE must be a positive number"
            ));
        }

        if let Some(base) = self.public_media_base_url() {
            let absolute = base.starts_with("http://") || base.starts_with("https://");
            if !absolute && !base.starts_with('/') {
                return Err(anyhow::anyhow!(
                    "PUBLIC_MEDIA_BASE_URL must be an http(s) URL or a path starting with '/'"
                ));
            }
        }

        Ok(())
    }

    fn from_env(environment: String) -> Self {
        let base = non_empty_var("PUBLIC_MEDIA_BASE_URL");

        Self::new(base, environment)
            .with_temp_ttl_minutes(
                env::var("INLINE_MEDIA_TEMP_TTL_MINUTES")
                    .ok()
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(TEMP_TTL_MINUTES),
            )
            .with_purge_batch_size(
                env::var("INLINE_MEDIA_PURGE_BATCH_SIZE")
                    .ok()
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(PURGE_BATCH_SIZE),
            )
    }
}

/// Campus media service configuration
#[derive(Clone, Debug)]
pub struct CampusMediaConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub inline_media: InlineMediaConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<CampusMediaConfig>);

impl Config {
    fn as_media(&self) -> &CampusMediaConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = CampusMediaConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_media().validate()
    }

    pub fn is_production(&self) -> bool {
        self.as_media().inline_media.is_production()
    }

    pub fn environment(&self) -> &str {
        &self.as_media().inline_media.environment
    }

    pub fn database_url(&self) -> &str {
        &self.as_media().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_media().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_media().db_timeout_seconds
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_media().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_media().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_media().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_media().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_media().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_media().local_storage_base_url.as_deref()
    }

    pub fn inline_media(&self) -> &InlineMediaConfig {
        &self.as_media().inline_media
    }
}

impl CampusMediaConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = non_empty_var("STORAGE_BACKEND")
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?;

        let config = CampusMediaConfig {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: non_empty_var("S3_BUCKET"),
            s3_region: non_empty_var("S3_REGION").or_else(|| non_empty_var("AWS_REGION")),
            s3_endpoint: non_empty_var("S3_ENDPOINT"),
            local_storage_path: non_empty_var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty_var("LOCAL_STORAGE_BASE_URL"),
            inline_media: InlineMediaConfig::from_env(environment),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        self.inline_media.validate()?;

        match self.storage_backend {
            Some(StorageBackend::S3) => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            Some(StorageBackend::Local) => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            None => {
                if self.inline_media.is_production() {
                    tracing::warn!(
                        "No STORAGE_BACKEND configured in production; physical deletes will fail"
                    );
                }
            }
        }

        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn normalize_base_url(base: Option<String>) -> Option<String> {
    base.map(|b| b.trim().trim_end_matches('/').to_string())
        .filter(|b| !b.is_empty())
}
