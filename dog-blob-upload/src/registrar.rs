//! Wiring the uploader to its collaborators.
//!
//! Applications pick a lifetime once, at their entry point:
//!
//! - [`UploaderLifetime::Singleton`]: one uploader shared by the whole process
//! - [`UploaderLifetime::Scoped`]: a fresh uploader per request or session,
//!   sharing the same collaborators

use std::sync::Arc;

use crate::{
    BlobClientProvider, BlobResult, BlobUploader, DefaultBlobUploader, MemoryStreamPool, RecyclingStreamPool,
    S3ClientProvider, S3Config, SasUriGenerator, UploadConfig,
};

/// How long a registered uploader lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploaderLifetime {
    Singleton,
    /// Recommended
    #[default]
    Scoped,
}

/// The three collaborators an uploader needs
#[derive(Clone)]
pub struct UploadCollaborators {
    pub clients: Arc<dyn BlobClientProvider>,
    pub sas: Arc<dyn SasUriGenerator>,
    pub streams: Arc<dyn MemoryStreamPool>,
}

impl UploadCollaborators {
    pub fn new(
        clients: Arc<dyn BlobClientProvider>,
        sas: Arc<dyn SasUriGenerator>,
        streams: Arc<dyn MemoryStreamPool>,
    ) -> Self {
        Self { clients, sas, streams }
    }

    fn build(&self) -> Arc<dyn BlobUploader> {
        Arc::new(DefaultBlobUploader::new(
            self.clients.clone(),
            self.sas.clone(),
            self.streams.clone(),
        ))
    }
}

/// Produces one uploader per scope
#[derive(Clone)]
pub struct ScopedUploaderFactory {
    collaborators: UploadCollaborators,
}

impl ScopedUploaderFactory {
    /// Uploader for a new request or session
    pub fn create_scope(&self) -> Arc<dyn BlobUploader> {
        self.collaborators.build()
    }
}

/// An uploader registration, resolved per the chosen lifetime
#[derive(Clone)]
pub enum RegisteredUploader {
    Singleton(Arc<dyn BlobUploader>),
    Scoped(ScopedUploaderFactory),
}

impl RegisteredUploader {
    /// Singleton: the shared instance. Scoped: a new instance.
    pub fn resolve(&self) -> Arc<dyn BlobUploader> {
        match self {
            RegisteredUploader::Singleton(uploader) => uploader.clone(),
            RegisteredUploader::Scoped(factory) => factory.create_scope(),
        }
    }

    pub fn lifetime(&self) -> UploaderLifetime {
        match self {
            RegisteredUploader::Singleton(_) => UploaderLifetime::Singleton,
            RegisteredUploader::Scoped(_) => UploaderLifetime::Scoped,
        }
    }
}

/// Composition root for blob uploads
pub struct BlobUploadRegistrar;

impl BlobUploadRegistrar {
    /// One uploader for the whole process
    pub fn singleton(collaborators: UploadCollaborators) -> Arc<dyn BlobUploader> {
        collaborators.build()
    }

    /// One uploader per scope
    pub fn scoped(collaborators: UploadCollaborators) -> ScopedUploaderFactory {
        ScopedUploaderFactory { collaborators }
    }

    /// Register with the given lifetime
    pub fn register(collaborators: UploadCollaborators, lifetime: UploaderLifetime) -> RegisteredUploader {
        match lifetime {
            UploaderLifetime::Singleton => RegisteredUploader::Singleton(Self::singleton(collaborators)),
            UploaderLifetime::Scoped => RegisteredUploader::Scoped(Self::scoped(collaborators)),
        }
    }

    /// Wire S3 client provider, presigned SAS and a recycling stream pool
    pub async fn s3(
        s3: S3Config,
        config: UploadConfig,
        lifetime: UploaderLifetime,
    ) -> BlobResult<RegisteredUploader> {
        let provider = S3ClientProvider::new(s3).await?;
        let sas = provider.sas_generator(config.sas_expiry);
        let streams = RecyclingStreamPool::new(config.pool);

        let collaborators = UploadCollaborators::new(Arc::new(provider), Arc::new(sas), Arc::new(streams));
        Ok(Self::register(collaborators, lifetime))
    }
}
