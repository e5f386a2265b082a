use std::env;
use std::time::Duration;

use crate::{BlobError, BlobResult};

/// Configuration for blob upload operations
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// How long generated SAS URIs stay valid
    pub sas_expiry: Duration,

    /// Rules for the in-memory stream pool
    pub pool: PoolConfig,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            sas_expiry: Duration::from_secs(60 * 60), // 1 hour
            pool: PoolConfig::default(),
        }
    }
}

impl UploadConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set SAS URI lifetime
    pub fn with_sas_expiry(mut self, expiry: Duration) -> Self {
        self.sas_expiry = expiry;
        self
    }

    /// Set pool rules
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}

/// Rules for pooled in-memory streams
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Size of each chunk a pooled stream yields (bytes)
    pub chunk_size: usize,

    /// Maximum number of idle buffers kept for reuse
    pub max_retained: usize,

    /// Buffers that grew beyond this capacity are dropped instead of retained
    pub max_retained_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024, // 64KB
            max_retained: 16,
            max_retained_capacity: 8 * 1024 * 1024, // 8MB
        }
    }
}

impl PoolConfig {
    /// Create new pool rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk size (clamped to at least one byte)
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    /// Set how many idle buffers are retained
    pub fn with_max_retained(mut self, max: usize) -> Self {
        self.max_retained = max;
        self
    }

    /// Set the largest buffer capacity worth retaining
    pub fn with_max_retained_capacity(mut self, bytes: usize) -> Self {
        self.max_retained_capacity = bytes;
        self
    }
}

/// Connection settings for an S3-compatible object store
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
}

impl S3Config {
    /// Create a config for a region, using the default credential chain
    pub fn new<S: Into<String>>(region: S) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }

    /// Load from `BLOB_S3_*` environment variables.
    ///
    /// `BLOB_S3_REGION` is required. `BLOB_S3_ENDPOINT_URL`,
    /// `BLOB_S3_ACCESS_KEY_ID`, `BLOB_S3_SECRET_ACCESS_KEY` and
    /// `BLOB_S3_FORCE_PATH_STYLE` are optional.
    pub fn from_env() -> BlobResult<Self> {
        fn optional(key: &str) -> Option<String> {
            env::var(key).ok().filter(|v| !v.is_empty())
        }

        let region = optional("BLOB_S3_REGION")
            .ok_or_else(|| BlobError::invalid("BLOB_S3_REGION environment variable required"))?;

        let force_path_style = match optional("BLOB_S3_FORCE_PATH_STYLE") {
            Some(raw) => raw.parse::<bool>().map_err(|_| {
                BlobError::invalid(format!("BLOB_S3_FORCE_PATH_STYLE must be true or false, got {}", raw))
            })?,
            None => false,
        };

        let config = Self {
            region,
            endpoint_url: optional("BLOB_S3_ENDPOINT_URL"),
            access_key_id: optional("BLOB_S3_ACCESS_KEY_ID"),
            secret_access_key: optional("BLOB_S3_SECRET_ACCESS_KEY"),
            force_path_style,
        };
        config.validate()?;
        Ok(config)
    }

    /// Point at a custom endpoint (MinIO, RustFS, ...)
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint_url: S) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Use static credentials instead of the default chain
    pub fn with_credentials<A: Into<String>, S: Into<String>>(mut self, access_key_id: A, secret_access_key: S) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Address buckets as `endpoint/bucket` rather than `bucket.endpoint`
    pub fn force_path_style(mut self) -> Self {
        self.force_path_style = true;
        self
    }

    /// Static credentials must come as a pair
    pub fn validate(&self) -> BlobResult<()> {
        if self.region.trim().is_empty() {
            return Err(BlobError::invalid("S3 region must not be empty"));
        }
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) | (None, Some(_)) => Err(BlobError::invalid(
                "S3 access key id and secret access key must be set together",
            )),
            _ => Ok(()),
        }
    }
}
