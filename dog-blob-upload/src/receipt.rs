use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Receipt returned after a blob was written.
///
/// Carries whatever the store reported back; the uploader passes it through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub container: String,
    pub path: String,
    pub size_bytes: u64,
    pub etag: Option<String>,
    pub version_id: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
}

impl UploadReceipt {
    /// Create a new upload receipt
    pub fn new<C: Into<String>, P: Into<String>>(container: C, path: P, size_bytes: u64) -> Self {
        Self {
            container: container.into(),
            path: path.into(),
            size_bytes,
            etag: None,
            version_id: None,
            last_modified: None,
            content_type: None,
        }
    }

    /// Set etag
    pub fn with_etag<S: Into<String>>(mut self, etag: S) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Set version id
    pub fn with_version_id<S: Into<String>>(mut self, version_id: S) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    /// Set last modified time
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Set content type
    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}
