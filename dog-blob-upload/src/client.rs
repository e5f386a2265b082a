use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{BlobResult, ByteStream, PublicAccess, UploadOptions, UploadReceipt};

/// A client bound to one blob: a single container and relative path.
#[async_trait]
pub trait BlobClient: Send + Sync {
    /// Container the client writes into
    fn container(&self) -> &str;

    /// Relative path of the blob inside the container
    fn path(&self) -> &str;

    /// Store a blob from a stream
    async fn upload(
        &self,
        stream: ByteStream,
        options: UploadOptions,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt>;

    /// Store a blob straight from a local file
    async fn upload_from_path(
        &self,
        path: &Path,
        options: UploadOptions,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt>;
}

/// Resolves clients for container/path pairs.
///
/// Creates the container with the given access policy when it does not exist.
#[async_trait]
pub trait BlobClientProvider: Send + Sync {
    async fn get(
        &self,
        container: &str,
        relative_path: &str,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<Arc<dyn BlobClient>>;
}
