use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::cancel::run_cancellable;
use crate::{
    BlobClientProvider, BlobError, BlobResult, ByteStream, MemoryStreamPool, PublicAccess, SasUriGenerator,
    UploadContent, UploadOptions, UploadReceipt, UploadRequest,
};

/// Uploads content to containers.
///
/// Every method overwrites whatever is already stored at the target path.
#[async_trait]
pub trait BlobUploader: Send + Sync {
    /// Upload a stream
    async fn upload_stream(
        &self,
        container: &str,
        relative_path: &str,
        stream: ByteStream,
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt>;

    /// Upload a byte slice through a pooled in-memory stream
    async fn upload_bytes(
        &self,
        container: &str,
        relative_path: &str,
        bytes: &[u8],
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt>;

    /// Upload text through a pooled in-memory stream
    async fn upload_text(
        &self,
        container: &str,
        relative_path: &str,
        text: &str,
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt>;

    /// Upload a local file, handing its path straight to the client
    async fn upload_from_file(
        &self,
        container: &str,
        relative_path: &str,
        absolute_path: &Path,
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt>;

    /// Upload bytes, then return a SAS URI for the stored blob.
    ///
    /// An upload that succeeds is not undone if the URI cannot be produced.
    async fn upload_and_get_sas_uri(
        &self,
        container: &str,
        file_name: &str,
        bytes: &[u8],
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<String>;

    /// Dispatch a request to the matching upload method
    async fn submit(&self, request: UploadRequest, cancel: Option<&CancellationToken>) -> BlobResult<UploadReceipt> {
        let UploadRequest {
            container,
            relative_path,
            content,
            content_type,
            access,
        } = request;
        let content_type = content_type.as_deref();

        match content {
            UploadContent::Bytes(bytes) => {
                self.upload_bytes(&container, &relative_path, &bytes, content_type, access, cancel)
                    .await
            }
            UploadContent::Text(text) => {
                self.upload_text(&container, &relative_path, &text, content_type, access, cancel)
                    .await
            }
            UploadContent::Stream(stream) => {
                self.upload_stream(&container, &relative_path, stream, content_type, access, cancel)
                    .await
            }
            UploadContent::File(path) => {
                self.upload_from_file(&container, &relative_path, &path, content_type, access, cancel)
                    .await
            }
        }
    }
}

/// The default uploader: resolves a client, uploads, returns the receipt.
///
/// Holds nothing but its collaborators, so one instance can serve any number
/// of concurrent uploads.
#[derive(Clone)]
pub struct DefaultBlobUploader {
    clients: Arc<dyn BlobClientProvider>,
    sas: Arc<dyn SasUriGenerator>,
    streams: Arc<dyn MemoryStreamPool>,
}

impl DefaultBlobUploader {
    pub fn new(
        clients: Arc<dyn BlobClientProvider>,
        sas: Arc<dyn SasUriGenerator>,
        streams: Arc<dyn MemoryStreamPool>,
    ) -> Self {
        Self { clients, sas, streams }
    }

    fn validate_target(container: &str, relative_path: &str) -> BlobResult<()> {
        if container.trim().is_empty() {
            return Err(BlobError::invalid("Container name must not be empty"));
        }
        if relative_path.trim().is_empty() {
            return Err(BlobError::invalid("Relative path must not be empty"));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobUploader for DefaultBlobUploader {
    #[instrument(skip(self, stream, cancel))]
    async fn upload_stream(
        &self,
        container: &str,
        relative_path: &str,
        stream: ByteStream,
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        Self::validate_target(container, relative_path)?;
        info!("Uploading blob to container ({}), path {} ...", container, relative_path);

        let client = run_cancellable(cancel, self.clients.get(container, relative_path, access, cancel)).await?;
        let options = UploadOptions::overwrite(content_type);
        let receipt = run_cancellable(cancel, client.upload(stream, options, cancel)).await?;

        debug!("Finished blob upload to container ({}), path {}", client.container(), client.path());
        Ok(receipt)
    }

    #[instrument(skip(self, bytes, cancel), fields(size_bytes = bytes.len()))]
    async fn upload_bytes(
        &self,
        container: &str,
        relative_path: &str,
        bytes: &[u8],
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        let stream = run_cancellable(cancel, self.streams.get_bytes(bytes, cancel)).await?;
        self.upload_stream(container, relative_path, Box::pin(stream), content_type, access, cancel)
            .await
    }

    #[instrument(skip(self, text, cancel), fields(size_bytes = text.len()))]
    async fn upload_text(
        &self,
        container: &str,
        relative_path: &str,
        text: &str,
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        let stream = run_cancellable(cancel, self.streams.get_text(text, cancel)).await?;
        self.upload_stream(container, relative_path, Box::pin(stream), content_type, access, cancel)
            .await
    }

    #[instrument(skip(self, cancel))]
    async fn upload_from_file(
        &self,
        container: &str,
        relative_path: &str,
        absolute_path: &Path,
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        Self::validate_target(container, relative_path)?;
        info!(
            "Uploading blob ({}) to container ({}) at {} ...",
            absolute_path.display(),
            container,
            relative_path
        );

        let client = run_cancellable(cancel, self.clients.get(container, relative_path, access, cancel)).await?;
        let options = UploadOptions::overwrite(content_type);
        let receipt = run_cancellable(cancel, client.upload_from_path(absolute_path, options, cancel)).await?;

        debug!(
            "Finished blob upload ({}) to container ({}) at {}",
            absolute_path.display(),
            client.container(),
            client.path()
        );
        Ok(receipt)
    }

    #[instrument(skip(self, bytes, cancel), fields(size_bytes = bytes.len()))]
    async fn upload_and_get_sas_uri(
        &self,
        container: &str,
        file_name: &str,
        bytes: &[u8],
        content_type: Option<&str>,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<String> {
        self.upload_bytes(container, file_name, bytes, content_type, access, cancel)
            .await?;

        let uri = run_cancellable(cancel, self.sas.sas_uri_with_client(container, file_name, cancel)).await?;

        match uri {
            Some(uri) if !uri.is_empty() => Ok(uri),
            _ => Err(BlobError::sas_unavailable(container, file_name)),
        }
    }
}
