use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use aws_sdk_s3::types::{BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl};
use aws_sdk_s3::Client;
use futures_util::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::run_cancellable;
use crate::{
    BlobClient, BlobClientProvider, BlobError, BlobResult, ByteStream, PublicAccess, S3Config, SasUriGenerator,
    UploadOptions, UploadReceipt,
};

/// Region S3 treats as the default; bucket creation there takes no location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// Client provider for S3-compatible storage (AWS, MinIO, RustFS, ...).
///
/// A container maps to a bucket and a relative path to an object key.
#[derive(Clone)]
pub struct S3ClientProvider {
    client: Client,
    region: String,
}

impl S3ClientProvider {
    pub async fn new(config: S3Config) -> BlobResult<Self> {
        config.validate()?;
        let client = Self::create_client(&config).await;
        Ok(Self {
            client,
            region: config.region,
        })
    }

    /// Wrap an already configured SDK client
    pub fn from_client<S: Into<String>>(client: Client, region: S) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// SAS generator sharing this provider's SDK client.
    ///
    /// `expiry` must not exceed seven days.
    pub fn sas_generator(&self, expiry: Duration) -> S3SasGenerator {
        S3SasGenerator {
            client: self.client.clone(),
            expiry,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn create_client(config: &S3Config) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) = (&config.access_key_id, &config.secret_access_key) {
            let credentials = Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                "dog-blob-upload",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url.clone());
        }

        let shared = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&shared)
                .force_path_style(config.force_path_style)
                .build(),
        )
    }

    /// Make sure the bucket exists, creating it with the given policy if not
    async fn ensure_bucket(&self, bucket: &str, access: PublicAccess) -> BlobResult<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => return Ok(()),
            Err(err) => {
                let missing = err.as_service_error().map(|e| e.is_not_found()).unwrap_or(false);
                if !missing {
                    warn!(bucket, error = %err, "Could not check container");
                    return Err(BlobError::client_unavailable(bucket, err));
                }
            }
        }

        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(acl) = bucket_acl(access) {
            request = request.acl(acl);
        }
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!(bucket, access = %access, "Created container");
                Ok(())
            }
            Err(err) if err.as_service_error().map(|e| e.is_bucket_already_owned_by_you()).unwrap_or(false) => {
                debug!(bucket, "Container created concurrently");
                Ok(())
            }
            Err(err) => {
                warn!(bucket, error = %err, "Could not create container");
                Err(BlobError::client_unavailable(bucket, err))
            }
        }
    }
}

fn bucket_acl(access: PublicAccess) -> Option<BucketCannedAcl> {
    match access {
        PublicAccess::None => None,
        PublicAccess::Blob => Some(BucketCannedAcl::Private),
        PublicAccess::Container => Some(BucketCannedAcl::PublicRead),
    }
}

fn object_acl(access: PublicAccess) -> Option<ObjectCannedAcl> {
    match access {
        PublicAccess::None => None,
        PublicAccess::Blob | PublicAccess::Container => Some(ObjectCannedAcl::PublicRead),
    }
}

#[async_trait]
impl BlobClientProvider for S3ClientProvider {
    async fn get(
        &self,
        container: &str,
        relative_path: &str,
        access: PublicAccess,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<Arc<dyn BlobClient>> {
        run_cancellable(cancel, self.ensure_bucket(container, access)).await?;

        Ok(Arc::new(S3BlobClient {
            client: self.client.clone(),
            bucket: container.to_string(),
            key: relative_path.to_string(),
            object_acl: object_acl(access),
        }))
    }
}

/// Client for one object in one bucket
#[derive(Clone)]
pub struct S3BlobClient {
    client: Client,
    bucket: String,
    key: String,
    object_acl: Option<ObjectCannedAcl>,
}

impl S3BlobClient {
    async fn collect_stream(&self, mut stream: ByteStream) -> BlobResult<Vec<u8>> {
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| BlobError::transfer(self.key.as_str(), e))?;
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }

    async fn put(
        &self,
        body: AwsByteStream,
        size_bytes: u64,
        options: &UploadOptions,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .content_length(size_bytes as i64)
            .body(body);

        if let Some(ct) = options.content_type() {
            request = request.content_type(ct);
        }
        if let Some(acl) = &self.object_acl {
            request = request.acl(acl.clone());
        }
        if !options.overwrite {
            request = request.if_none_match("*");
        }

        let output = run_cancellable(cancel, async {
            request.send().await.map_err(|e| {
                warn!(bucket = %self.bucket, key = %self.key, error = %e, "Object upload failed");
                BlobError::transfer(self.key.as_str(), e)
            })
        })
        .await?;

        let mut receipt = UploadReceipt::new(self.bucket.as_str(), self.key.as_str(), size_bytes);
        if let Some(etag) = output.e_tag() {
            receipt = receipt.with_etag(etag);
        }
        if let Some(version_id) = output.version_id() {
            receipt = receipt.with_version_id(version_id);
        }
        if let Some(ct) = options.content_type() {
            receipt = receipt.with_content_type(ct);
        }

        Ok(receipt)
    }
}

#[async_trait]
impl BlobClient for S3BlobClient {
    fn container(&self) -> &str {
        &self.bucket
    }

    fn path(&self) -> &str {
        &self.key
    }

    async fn upload(
        &self,
        stream: ByteStream,
        options: UploadOptions,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        // PutObject needs the length up front.
        let data = run_cancellable(cancel, self.collect_stream(stream)).await?;
        let size_bytes = data.len() as u64;
        self.put(AwsByteStream::from(data), size_bytes, &options, cancel).await
    }

    async fn upload_from_path(
        &self,
        path: &Path,
        options: UploadOptions,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<UploadReceipt> {
        let size_bytes = tokio::fs::metadata(path).await?.len();
        let body = AwsByteStream::from_path(path)
            .await
            .map_err(|e| BlobError::transfer(self.key.as_str(), e))?;
        self.put(body, size_bytes, &options, cancel).await
    }
}

/// SAS generator backed by presigned `GetObject` requests
#[derive(Clone)]
pub struct S3SasGenerator {
    client: Client,
    expiry: Duration,
}

impl S3SasGenerator {
    pub fn new(client: Client, expiry: Duration) -> Self {
        Self { client, expiry }
    }
}

#[async_trait]
impl SasUriGenerator for S3SasGenerator {
    async fn sas_uri_with_client(
        &self,
        container: &str,
        file_name: &str,
        cancel: Option<&CancellationToken>,
    ) -> BlobResult<Option<String>> {
        let presigning = PresigningConfig::expires_in(self.expiry).map_err(BlobError::backend)?;
        let request = self.client.get_object().bucket(container).key(file_name);

        // Missing signing credentials surface here as a backend error.
        let presigned = run_cancellable(cancel, async move {
            request.presigned(presigning).await.map_err(|e| {
                warn!(bucket = container, key = file_name, error = %e, "Could not presign object URL");
                BlobError::backend(e)
            })
        })
        .await?;

        debug!(bucket = container, key = file_name, "Presigned object URL");
        Ok(Some(presigned.uri().to_string()))
    }
}
