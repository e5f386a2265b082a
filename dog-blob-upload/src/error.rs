use thiserror::Error;

/// Result type for blob upload operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob upload operations
///
/// The uploader never recovers from or rewrites these: whatever a collaborator
/// returns is what the caller receives.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Could not acquire a client for container {container}: {source}")]
    ClientUnavailable {
        container: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Transfer to {path} failed: {source}")]
    Transfer {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No SAS URI could be generated for {container}/{file_name}")]
    SasUnavailable { container: String, file_name: String },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a client acquisition error for a container
    pub fn client_unavailable<S, E>(container: S, error: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ClientUnavailable {
            container: container.into(),
            source: Box::new(error),
        }
    }

    /// Create a transfer error for a blob path
    pub fn transfer<S, E>(path: S, error: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transfer {
            path: path.into(),
            source: Box::new(error),
        }
    }

    /// Create a SAS unavailable error
    pub fn sas_unavailable<C: Into<String>, F: Into<String>>(container: C, file_name: F) -> Self {
        Self::SasUnavailable {
            container: container.into(),
            file_name: file_name.into(),
        }
    }

    /// True when the operation ended because its cancellation token fired
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
