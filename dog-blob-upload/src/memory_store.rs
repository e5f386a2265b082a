use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cancel::{ensure_not_cancelled, run_cancellable};
use crate::{
    BlobClient, BlobClientProvider, BlobError, BlobHttpHeaders, BlobResult, ByteStream, PublicAccess,
    SasUriGenerator, UploadOptions, UploadReceipt,
};

/// A blob as held by [`MemoryBlobStore`]
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Bytes,
    pub headers: Option<BlobHttpHeaders>,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryContainer {
    access: PublicAccess,
    blobs: HashMap<String, StoredBlob>,
}

#[derive(Default)]
struct Faults {
    client: AtomicBool,
    upload: AtomicBool,
    sas: AtomicBool,
    sas_none: AtomicBool,
    sas_blank: AtomicBool,
}

struct MemoryInner {
    containers: RwLock<HashMap<String, MemoryContainer>>,
    faults: Faults,
    sas_requests: AtomicUsize,
    sas_expiry: Duration,
}

/// In-process object store.
///
/// Acts as both client provider and SAS generator so an uploader can be wired
/// against it without any network. Faults can be switched on to drive error
/// paths.
#[derive(Clone)]
pub struct MemoryBlobStore {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::with_sas_expiry(Duration::from_secs(60 * 60))
    }

    pub fn with_sas_expiry(sas_expiry: Duration) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                containers: RwLock::new(HashMap::new()),
                faults: Faults::default(),
                sas_requests: AtomicUsize::new(0),
                sas_expiry,
            }),
        }
    }

    /// Content of a stored blob
    pub fn read(&self, container: &str, path: &str) -> Option<Bytes> {
        self.blob(container, path).map(|b| b.data)
    }

    /// Full stored record of a blob
    pub fn blob(&self, container: &str, path: &str) -> Option<StoredBlob> {
        self.inner
            .containers
            .read()
            .get(container)
            .and_then(|c| c.blobs.get(path).cloned())
    }

    /// Content type stored with a blob, if one was set
    pub fn content_type(&self, container: &str, path: &str) -> Option<String> {
        self.blob(container, path)
            .and_then(|b| b.headers.map(|h| h.content_type))
    }

    pub fn contains(&self, container: &str, path: &str) -> bool {
        self.blob(container, path).is_some()
    }

    /// Access policy the container was created with
    pub fn container_access(&self, container: &str) -> Option<PublicAccess> {
        self.inner.containers.read().get(container).map(|c| c.access)
    }

    /// Number of SAS URIs requested so far
    pub fn sas_requests(&self) -> usize {
        self.inner.sas_requests.load(Ordering::SeqCst)
    }

    /// Make client acquisition fail
    pub fn fail_client_acquisition(&self, fail: bool) {
        self.inner.faults.client.store(fail, Ordering::SeqCst);
    }

    /// Make uploads fail
    pub fn fail_uploads(&self, fail: bool) {
        self.inner.faults.upload.store(fail, Ordering::SeqCst);
    }

    /// Make SAS generation return an error
    pub fn fail_sas(&self, fail: bool) {
        self.inner.faults.sas.store(fail, Ordering::SeqCst);
    }

    /// Make SAS generation return no URI
    pub fn withhold_sas(&self, withhold: bool) {
        self.inner.faults.sas_none.store(withhold, Ordering::SeqCst);
    }

    /// Make SAS generation return an empty URI
    pub fn blank_sas(&self, blank: bool) {
        self.inner.faults.sas_blank.store(blank, Ordering::SeqCst);
    }

    fn store_blob(&self, container: &str, path: &str, data: Bytes, options: &UploadOptions) -> BlobResult<UploadReceipt> {
        if self.inner.faults.upload.load(Ordering::SeqCst) {
            return Err(BlobError::transfer(path, injected("upload")));
        }

        let mut containers = self.inner.containers.write();
        let entry = containers
            .get_mut(container)
            .ok_or_else(|| BlobError::invalid(format!("Container {} does not exist", container)))?;

        if !options.overwrite && entry.blobs.contains_key(path) {
            return Err(BlobError::invalid(format!("Blob {}/{} already exists", container, path)));
        }

        let blob = StoredBlob {
            data,
            headers: options.headers.clone(),
            etag: format!("\"{}\"", Uuid::new_v4().simple()),
            last_modified: Utc::now(),
        };

        let mut receipt = UploadReceipt::new(container, path, blob.data.len() as u64)
            .with_etag(blob.etag.clone())
            .with_last_modified(blob.last_modified);
        if let Some(ct) = options.content_type() {
            receipt = receipt.with_content_type(ct);
        }

        entry.blobs.insert(path.to_string(), blob);
        Ok(receipt)
    }
}

fn injected(what: &str) -> std::io::Error {
    std::io::Error::other(format!("injected {} failure", what))
}

#[async_trait]
impl BlobClientProvider for MemoryBlobStore {
    async fn get(
        &self,
        container: &str,
        relative_path: &str,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<Arc<dyn BlobClient>> {
        ensure_not_cancelled(cancel)?;

        if self.inner.faults.client.load(Ordering::SeqCst) {
            return Err(BlobError::client_unavailable(container, injected("client")));
        }

        self.inner
            .containers
            .write()
            .entry(container.to_string())
            .or_insert_with(|| MemoryContainer {
                access,
                blobs: HashMap::new(),
            });

        Ok(Arc::new(MemoryBlobClient {
            store: self.clone(),
            container: container.to_string(),
            path: relative_path.to_string(),
        }))
    }
}

#[async_trait]
impl SasUriGenerator for MemoryBlobStore {
    async fn sas_uri_with_client(
        &self,
        container: &str,
        file_name: &str,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<Option<String>> {
        ensure_not_cancelled(cancel)?;
        self.inner.sas_requests.fetch_add(1, Ordering::SeqCst);

        if self.inner.faults.sas.load(Ordering::SeqCst) {
            return Err(BlobError::backend(injected("sas")));
        }
        if self.inner.faults.sas_none.load(Ordering::SeqCst) || !self.contains(container, file_name) {
            return Ok(None);
        }
        if self.inner.faults.sas_blank.load(Ordering::SeqCst) {
            return Ok(Some(String::new()));
        }

        let expires = Utc::now() + chrono::Duration::seconds(self.inner.sas_expiry.as_secs() as i64);
        Ok(Some(format!(
            "memory://{}/{}?se={}&sp=r&sig={}",
            container,
            file_name,
            expires.format("%Y-%m-%dT%H:%M:%SZ"),
            Uuid::new_v4().simple()
        )))
    }
}

/// Client for one blob in a [`MemoryBlobStore`]
struct MemoryBlobClient {
    store: MemoryBlobStore,
    container: String,
    path: String,
}

#[async_trait]
impl BlobClient for MemoryBlobClient {
    fn container(&self) -> &str {
        &self.container
    }

    fn path(&self) -> &str {
        &self.path
    }

    async fn upload(
        &self,
        mut stream: ByteStream,
        options: UploadOptions,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        let path = self.path.clone();
        let data = run_cancellable(cancel, async move {
            let mut data = Vec::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| BlobError::transfer(path.as_str(), e))?;
                data.extend_from_slice(&chunk);
            }
            Ok::<_, BlobError>(data)
        })
        .await?;

        self.store.store_blob(&self.container, &self.path, Bytes::from(data), &options)
    }

    async fn upload_from_path(
        &self,
        path: &Path,
        options: UploadOptions,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        let data = run_cancellable(cancel, async { Ok::<_, BlobError>(tokio::fs::read(path).await?) }).await?;
        self.store.store_blob(&self.container, &self.path, Bytes::from(data), &options)
    }
}
