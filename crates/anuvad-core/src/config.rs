//! Configuration module
//!
//! Application configuration is read from the environment once at startup and
//! validated before anything else runs. Accessors are provided instead of raw
//! field access so defaults and derived values stay in one place.

use std::env;
use std::time::Duration;

use crate::constants;
use crate::storage_types::StorageBackend;

// Common defaults
const SERVER_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const ZIP_TEXT_COMPRESSION_LEVEL: i32 = 2;
const MAX_SELECTED_DOWNLOADS: usize = 20;

/// Application configuration for the document API.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub signed_url_ttl_minutes: u64,
    // Conversion configuration
    pub chromium_path: Option<String>,
    pub font_name: String,
    pub font_asset_dir: String,
    pub zip_text_compression_level: i32,
    pub max_selected_downloads: usize,
}

/// Application configuration handle shared across crates.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn inner(&self) -> &AppConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Load .env in development; ignored when absent
        dotenvy::dotenv().ok();

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "s3" => Some(StorageBackend::S3),
                "local" => Some(StorageBackend::Local),
                _ => None,
            });

        let config = AppConfig {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()?,
            cors_origins,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()?,
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or(env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            signed_url_ttl_minutes: env::var("SIGNED_URL_TTL_MINUTES")
                .unwrap_or_else(|_| constants::SIGNED_URL_TTL_MINUTES.to_string())
                .parse()?,
            chromium_path: env::var("CHROMIUM_PATH").ok(),
            font_name: env::var("FONT_NAME")
                .unwrap_or_else(|_| constants::DEFAULT_FONT_NAME.to_string()),
            font_asset_dir: env::var("FONT_ASSET_DIR").unwrap_or_else(|_| "assets".to_string()),
            zip_text_compression_level: env::var("ZIP_TEXT_COMPRESSION_LEVEL")
                .unwrap_or_else(|_| ZIP_TEXT_COMPRESSION_LEVEL.to_string())
                .parse()?,
            max_selected_downloads: env::var("MAX_SELECTED_DOWNLOADS")
                .unwrap_or_else(|_| MAX_SELECTED_DOWNLOADS.to_string())
                .parse()?,
        };

        Ok(Config(Box::new(config)))
    }

    /// Fail fast on combinations that cannot serve requests.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend() {
            Some(StorageBackend::S3) => {
                if self.s3_bucket().is_none() {
                    anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
                }
                if self.s3_region().is_none() {
                    anyhow::bail!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    );
                }
            }
            Some(StorageBackend::Local) => {
                if self.local_storage_path().is_none() {
                    anyhow::bail!("LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local");
                }
            }
            None => anyhow::bail!("STORAGE_BACKEND must be set to 's3' or 'local'"),
        }
        if self.signed_url_ttl_minutes() == 0 {
            anyhow::bail!("SIGNED_URL_TTL_MINUTES must be greater than zero");
        }
        if !(0..=9).contains(&self.zip_text_compression_level()) {
            anyhow::bail!("ZIP_TEXT_COMPRESSION_LEVEL must be between 0 and 9");
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn signed_url_ttl_minutes(&self) -> u64 {
        self.inner().signed_url_ttl_minutes
    }

    /// Validity window for signed URLs as a `Duration`.
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.inner().signed_url_ttl_minutes * 60)
    }

    pub fn chromium_path(&self) -> Option<&str> {
        self.inner().chromium_path.as_deref()
    }

    pub fn font_name(&self) -> &str {
        &self.inner().font_name
    }

    pub fn font_asset_dir(&self) -> &str {
        &self.inner().font_asset_dir
    }

    /// Deflate level for text-like ZIP entries (converted DOCX). Binary
    /// entries (PDFs) are always stored uncompressed.
    pub fn zip_text_compression_level(&self) -> i32 {
        self.inner().zip_text_compression_level
    }

    pub fn max_selected_downloads(&self) -> usize {
        self.inner().max_selected_downloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(backend: Option<StorageBackend>) -> Config {
        Config(Box::new(AppConfig {
            server_port: 8080,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            database_url: "postgres://localhost/anuvad".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 30,
            storage_backend: backend,
            s3_bucket: Some("anuvad-test".to_string()),
            s3_region: Some("ap-south-1".to_string()),
            s3_endpoint: None,
            local_storage_path: Some("/tmp/anuvad".to_string()),
            local_storage_base_url: Some("http://localhost:8080/files".to_string()),
            signed_url_ttl_minutes: 15,
            chromium_path: None,
            font_name: "Nirmala UI".to_string(),
            font_asset_dir: "assets".to_string(),
            zip_text_compression_level: 2,
            max_selected_downloads: 20,
        }))
    }

    #[test]
    fn test_validate_requires_backend() {
        let config = test_config(None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_s3_backend() {
        let config = test_config(Some(StorageBackend::S3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_signed_url_ttl_duration() {
        let config = test_config(Some(StorageBackend::Local));
        assert_eq!(config.signed_url_ttl(), Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config(Some(StorageBackend::S3));
        assert!(!config.is_production());
        config.0.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
