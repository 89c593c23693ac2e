//! Configuration module
//!
//! Settings are read from the environment (after loading an optional `.env`
//! file) and validated once at startup.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    BYTES_PER_MB, DEFAULT_AWS_REGION, DEFAULT_FILE_MAPPINGS_PATH, DEFAULT_JPEG_QUALITY,
    DEFAULT_MAX_IMAGE_SIZE_MB, DEFAULT_MAX_RAW_SIZE_MB, DEFAULT_THUMBNAIL_MAX_EDGE,
    DEFAULT_THUMBNAIL_QUALITY,
};
use crate::storage_types::StorageBackend;

/// Lightbox configuration as loaded from the environment.
#[derive(Clone, Debug)]
pub struct LightboxConfig {
    pub environment: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Mapping ledger
    pub file_mappings_path: PathBuf,
    // Upload processing
    pub upload: UploadSettings,
}

/// Limits and encoder settings consumed by the upload pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSettings {
    pub max_image_size_bytes: usize,
    pub max_raw_size_bytes: usize,
    pub jpeg_quality: u8,
    pub thumbnail_quality: u8,
    pub thumbnail_max_edge: u32,
    /// Longest edge of the processed RAW conversion; `None` keeps full resolution.
    pub processed_max_edge: Option<u32>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_image_size_bytes: DEFAULT_MAX_IMAGE_SIZE_MB * BYTES_PER_MB,
            max_raw_size_bytes: DEFAULT_MAX_RAW_SIZE_MB * BYTES_PER_MB,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            thumbnail_max_edge: DEFAULT_THUMBNAIL_MAX_EDGE,
            processed_max_edge: None,
        }
    }
}

impl UploadSettings {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, quality) in [
            ("JPEG_QUALITY", self.jpeg_quality),
            ("THUMBNAIL_QUALITY", self.thumbnail_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(anyhow::anyhow!("{} must be between 1 and 100", name));
            }
        }

        if self.thumbnail_max_edge == 0 {
            return Err(anyhow::anyhow!("THUMBNAIL_MAX_EDGE must be greater than 0"));
        }

        if self.processed_max_edge == Some(0) {
            return Err(anyhow::anyhow!("PROCESSED_MAX_EDGE must be greater than 0"));
        }

        if self.max_image_size_bytes == 0 || self.max_raw_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_IMAGE_SIZE_MB and MAX_RAW_SIZE_MB must be greater than 0"
            ));
        }

        Ok(())
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<LightboxConfig>);

impl Config {
    fn inner(&self) -> &LightboxConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = LightboxConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
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

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn file_mappings_path(&self) -> &PathBuf {
        &self.inner().file_mappings_path
    }

    pub fn upload_settings(&self) -> &UploadSettings {
        &self.inner().upload
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl LightboxConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env_opt("STORAGE_BACKEND") {
            Some(value) => Some(value.parse::<StorageBackend>()?),
            None => None,
        };

        let max_image_size_mb = env::var("MAX_IMAGE_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_IMAGE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_IMAGE_SIZE_MB);
        let max_raw_size_mb = env::var("MAX_RAW_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_RAW_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_RAW_SIZE_MB);

        let upload = UploadSettings {
            max_image_size_bytes: max_image_size_mb * BYTES_PER_MB,
            max_raw_size_bytes: max_raw_size_mb * BYTES_PER_MB,
            jpeg_quality: env::var("JPEG_QUALITY")
                .unwrap_or_else(|_| DEFAULT_JPEG_QUALITY.to_string())
                .parse()
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            thumbnail_quality: env::var("THUMBNAIL_QUALITY")
                .unwrap_or_else(|_| DEFAULT_THUMBNAIL_QUALITY.to_string())
                .parse()
                .unwrap_or(DEFAULT_THUMBNAIL_QUALITY),
            thumbnail_max_edge: env::var("THUMBNAIL_MAX_EDGE")
                .unwrap_or_else(|_| DEFAULT_THUMBNAIL_MAX_EDGE.to_string())
                .parse()
                .unwrap_or(DEFAULT_THUMBNAIL_MAX_EDGE),
            processed_max_edge: env_opt("PROCESSED_MAX_EDGE")
                .map(|s| {
                    s.parse::<u32>()
                        .map_err(|_| anyhow::anyhow!("PROCESSED_MAX_EDGE must be a valid number"))
                })
                .transpose()?,
        };

        let config = LightboxConfig {
            environment,
            storage_backend,
            s3_bucket: env_opt("S3_BUCKET").or_else(|| env_opt("S3_BUCKET_NAME")),
            s3_region: env_opt("S3_REGION"),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            aws_region: env_opt("AWS_REGION").or_else(|| Some(DEFAULT_AWS_REGION.to_string())),
            local_storage_path: env_opt("LOCAL_STORAGE_PATH"),
            local_storage_base_url: env_opt("LOCAL_STORAGE_BASE_URL"),
            file_mappings_path: env_opt("FILE_MAPPINGS_PATH")
                .unwrap_or_else(|| DEFAULT_FILE_MAPPINGS_PATH.to_string())
                .into(),
            upload,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.upload.validate()?;

        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
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
        }

        Ok(())
    }
}
