use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::BlobResult;

/// Generates shared access signature URIs for existing blobs.
#[async_trait]
pub trait SasUriGenerator: Send + Sync {
    /// Signed URI for `container/file_name`.
    ///
    /// `Ok(None)` means the generator has no URI to give for this blob.
    async fn sas_uri_with_client(
        &self,
        container: &str,
        file_name: &str,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<Option<String>>;
}
