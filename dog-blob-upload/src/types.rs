use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;

use crate::BlobError;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Anonymous read access granted to a container when it is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicAccess {
    /// Private: every read needs credentials or a SAS URI
    #[default]
    None,
    /// Individual blobs are anonymously readable, listing is not
    Blob,
    /// Blobs and the container listing are anonymously readable
    Container,
}

impl PublicAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicAccess::None => "none",
            PublicAccess::Blob => "blob",
            PublicAccess::Container => "container",
        }
    }
}

impl FromStr for PublicAccess {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "private" => Ok(PublicAccess::None),
            "blob" => Ok(PublicAccess::Blob),
            "container" => Ok(PublicAccess::Container),
            _ => Err(BlobError::invalid(format!("Invalid public access policy: {}", s))),
        }
    }
}

impl fmt::Display for PublicAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP headers stored with a blob.
///
/// Only ever built when there is something to put in it; an absent value
/// leaves the store's defaults alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobHttpHeaders {
    pub content_type: String,
}

impl BlobHttpHeaders {
    /// Headers carrying a content type, or `None` when there is none to send
    pub fn for_content_type(content_type: Option<&str>) -> Option<Self> {
        content_type.map(|ct| Self {
            content_type: ct.to_string(),
        })
    }
}

/// Options passed to a blob client for a single upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub overwrite: bool,
    pub headers: Option<BlobHttpHeaders>,
}

impl UploadOptions {
    /// Unconditional overwrite, with headers only when a content type is given
    pub fn overwrite(content_type: Option<&str>) -> Self {
        Self {
            overwrite: true,
            headers: BlobHttpHeaders::for_content_type(content_type),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.as_ref().map(|h| h.content_type.as_str())
    }
}

/// Content for an upload, in any of the accepted shapes
pub enum UploadContent {
    Bytes(Bytes),
    Text(String),
    Stream(ByteStream),
    File(PathBuf),
}

impl fmt::Debug for UploadContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadContent::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            UploadContent::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            UploadContent::Stream(_) => f.write_str("Stream(..)"),
            UploadContent::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// A single upload, described as data
#[derive(Debug)]
pub struct UploadRequest {
    pub container: String,
    pub relative_path: String,
    pub content: UploadContent,
    pub content_type: Option<String>,
    pub access: PublicAccess,
}

impl UploadRequest {
    pub fn new<C, P>(container: C, relative_path: P, content: UploadContent) -> Self
    where
        C: Into<String>,
        P: Into<String>,
    {
        Self {
            container: container.into(),
            relative_path: relative_path.into(),
            content,
            content_type: None,
            access: PublicAccess::None,
        }
    }

    pub fn bytes<C: Into<String>, P: Into<String>, B: Into<Bytes>>(container: C, relative_path: P, bytes: B) -> Self {
        Self::new(container, relative_path, UploadContent::Bytes(bytes.into()))
    }

    pub fn text<C: Into<String>, P: Into<String>, T: Into<String>>(container: C, relative_path: P, text: T) -> Self {
        Self::new(container, relative_path, UploadContent::Text(text.into()))
    }

    pub fn stream<C: Into<String>, P: Into<String>>(container: C, relative_path: P, stream: ByteStream) -> Self {
        Self::new(container, relative_path, UploadContent::Stream(stream))
    }

    pub fn file<C: Into<String>, P: Into<String>, F: Into<PathBuf>>(container: C, relative_path: P, path: F) -> Self {
        Self::new(container, relative_path, UploadContent::File(path.into()))
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_access(mut self, access: PublicAccess) -> Self {
        self.access = access;
        self
    }
}
