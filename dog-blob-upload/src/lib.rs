//! # dog-blob-upload: Blob upload helpers
//!
//! `dog-blob-upload` puts content into object storage containers with as little
//! ceremony as possible. Hand it a stream, bytes, text or a file path plus a
//! container and relative path; it resolves a client (creating the container if
//! needed), uploads with overwrite semantics and hands back the store's receipt.
//! It can also return a SAS URI for what it just uploaded.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dog_blob_upload::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! // 1. Pick collaborators (here: the in-memory store)
//! let store = MemoryBlobStore::new();
//! let collaborators = UploadCollaborators::new(
//!     Arc::new(store.clone()),
//!     Arc::new(store.clone()),
//!     Arc::new(RecyclingStreamPool::default()),
//! );
//!
//! // 2. Register once at the entry point
//! let uploader = BlobUploadRegistrar::singleton(collaborators);
//!
//! // 3. Upload
//! let receipt = uploader
//!     .upload_text("reports", "q1.txt", "Hello, world!", Some("text/plain"), PublicAccess::None, None)
//!     .await?;
//! assert_eq!(receipt.size_bytes, 13);
//!
//! // 4. Upload and get a signed URI back
//! let uri = uploader
//!     .upload_and_get_sas_uri("reports", "q1.pdf", b"%PDF-1.7", None, PublicAccess::None, None)
//!     .await?;
//! assert!(!uri.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    Your Service     │
//! ├─────────────────────┤
//! │    BlobUploader     │  ← normalize input, set headers, delegate
//! ├──────┬──────┬───────┤
//! │Client│ SAS  │Stream │  ← collaborators (S3, memory, your own)
//! │Provid│ Gen  │ Pool  │
//! └──────┴──────┴───────┘
//! ```
//!
//! The uploader does no retries and no rollbacks: errors from collaborators
//! reach the caller unchanged. Every call accepts an optional
//! [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod cancel;
pub mod client;
mod config;
mod error;
pub mod memory_store;
mod receipt;
pub mod registrar;
pub mod s3_store;
pub mod sas;
pub mod stream_pool;
mod types;
pub mod uploader;

// Re-export main types for clean API
pub use client::{BlobClient, BlobClientProvider};
pub use config::{PoolConfig, S3Config, UploadConfig};
pub use error::{BlobError, BlobResult};
pub use memory_store::{MemoryBlobStore, StoredBlob};
pub use receipt::UploadReceipt;
pub use registrar::{
    BlobUploadRegistrar, RegisteredUploader, ScopedUploaderFactory, UploadCollaborators, UploaderLifetime,
};
pub use s3_store::{S3BlobClient, S3ClientProvider, S3SasGenerator};
pub use sas::SasUriGenerator;
pub use stream_pool::{MemoryStreamPool, PooledStream, RecyclingStreamPool};
pub use types::{BlobHttpHeaders, ByteStream, PublicAccess, UploadContent, UploadOptions, UploadRequest};
pub use uploader::{BlobUploader, DefaultBlobUploader};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobError, BlobResult, BlobUploadRegistrar, BlobUploader, ByteStream, MemoryBlobStore, PublicAccess,
        RecyclingStreamPool, UploadCollaborators, UploadReceipt, UploadRequest,
    };
}
