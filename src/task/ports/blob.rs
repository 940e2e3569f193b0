//! Blob store port for task attachments.

use crate::task::domain::{AttachmentKey, UploadFile};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for blob store operations.
pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

/// Receives cumulative byte counts while an object is being written.
pub trait TransferProgress: Send + Sync {
    /// Reports that `loaded` of `total` bytes have been transferred.
    fn report(&self, loaded: u64, total: u64);
}

/// Progress sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreProgress;

impl TransferProgress for IgnoreProgress {
    fn report(&self, _loaded: u64, _total: u64) {}
}

/// Key-addressed object storage contract.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `file` under `key`.
    ///
    /// Progress is reported with cumulative byte counts. A failed write
    /// leaves no object visible under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError`] when the write is rejected.
    async fn put(
        &self,
        key: &AttachmentKey,
        file: &UploadFile,
        progress: &dyn TransferProgress,
    ) -> BlobStoreResult<()>;

    /// Resolves a key to a fetchable URL. The URL may expire.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError`] when the key cannot be resolved.
    async fn url(&self, key: &AttachmentKey) -> BlobStoreResult<String>;

    /// Deletes the object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::NotFound`] when nothing is stored under
    /// `key`.
    async fn remove(&self, key: &AttachmentKey) -> BlobStoreResult<()>;
}

/// Errors returned by blob store implementations.
#[derive(Debug, Clone, Error)]
pub enum BlobStoreError {
    /// No object exists under the key.
    #[error("object not found: {0}")]
    NotFound(AttachmentKey),

    /// The storage service answered with a non-success status.
    #[error("blob store rejected the request with status {status}: {message}")]
    Rejected {
        /// HTTP-style status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Transport-layer failure.
    #[error("blob store unavailable: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl BlobStoreError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
