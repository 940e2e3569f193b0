//! In-memory blob store with signed, expiring URLs.

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as _};
use std::sync::{Arc, RwLock};

use super::journal::{RecordedCall, RequestJournal};
use crate::task::{
    domain::{AttachmentKey, UploadFile},
    ports::{BlobStore, BlobStoreError, BlobStoreResult, TransferProgress},
};

/// Bytes reported per progress callback during [`BlobStore::put`].
pub const PROGRESS_CHUNK_BYTES: usize = 64 * 1024;

const DEFAULT_BASE_URL: &str = "https://blobs.invalid";
const DEFAULT_URL_TTL_MINUTES: i64 = 15;

/// Blob store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOperation {
    /// [`BlobStore::put`].
    Put,
    /// [`BlobStore::url`].
    Url,
    /// [`BlobStore::remove`].
    Remove,
}

/// Object held by [`InMemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// MIME type supplied on upload.
    pub content_type: String,
    /// Object contents.
    pub bytes: Vec<u8>,
}

/// Thread-safe in-memory blob store.
///
/// Resolved URLs carry an expiry timestamp and a SHA-256 signature over the
/// key and expiry. Like a presigning object store, resolution does not check
/// that the object exists.
pub struct InMemoryBlobStore<C>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<InMemoryBlobState>>,
    journal: RequestJournal,
    clock: Arc<C>,
    base_url: String,
    url_ttl: Duration,
    signing_secret: String,
}

impl<C> Clone for InMemoryBlobStore<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            journal: self.journal.clone(),
            clock: Arc::clone(&self.clock),
            base_url: self.base_url.clone(),
            url_ttl: self.url_ttl,
            signing_secret: self.signing_secret.clone(),
        }
    }
}

impl<C> fmt::Debug for InMemoryBlobStore<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("base_url", &self.base_url)
            .field("url_ttl", &self.url_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct InMemoryBlobState {
    objects: HashMap<AttachmentKey, StoredObject>,
    failing: HashSet<BlobOperation>,
}

fn lock_error(err: impl std::fmt::Display) -> BlobStoreError {
    BlobStoreError::transport(std::io::Error::other(err.to_string()))
}

impl InMemoryBlobState {
    fn check(&self, operation: BlobOperation) -> BlobStoreResult<()> {
        if self.failing.contains(&operation) {
            return Err(BlobStoreError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                format!("injected {operation:?} failure"),
            )));
        }
        Ok(())
    }
}

impl<C> InMemoryBlobStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store with its own journal.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self::with_journal(clock, RequestJournal::new())
    }

    /// Creates an empty store that records into `journal`.
    #[must_use]
    pub fn with_journal(clock: C, journal: RequestJournal) -> Self {
        Self {
            state: Arc::default(),
            journal,
            clock: Arc::new(clock),
            base_url: DEFAULT_BASE_URL.to_owned(),
            url_ttl: Duration::minutes(DEFAULT_URL_TTL_MINUTES),
            signing_secret: "in-memory".to_owned(),
        }
    }

    /// Sets the origin used for resolved URLs.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Sets how long resolved URLs stay valid.
    #[must_use]
    pub const fn with_url_ttl(mut self, url_ttl: Duration) -> Self {
        self.url_ttl = url_ttl;
        self
    }

    /// Returns the journal this store records into.
    #[must_use]
    pub const fn journal(&self) -> &RequestJournal {
        &self.journal
    }

    /// Returns the object stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns blob store errors when lock acquisition fails.
    pub fn object(&self, key: &AttachmentKey) -> BlobStoreResult<Option<StoredObject>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.objects.get(key).cloned())
    }

    /// Returns every stored key.
    ///
    /// # Errors
    ///
    /// Returns blob store errors when lock acquisition fails.
    pub fn keys(&self) -> BlobStoreResult<Vec<AttachmentKey>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.objects.keys().cloned().collect())
    }

    /// Stores an object directly, without journalling a request.
    ///
    /// # Errors
    ///
    /// Returns blob store errors when lock acquisition fails.
    pub fn seed(&self, key: AttachmentKey, object: StoredObject) -> BlobStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.objects.insert(key, object);
        Ok(())
    }

    /// Makes every later call of `operation` fail with a transport error.
    ///
    /// # Errors
    ///
    /// Returns blob store errors when lock acquisition fails.
    pub fn fail_on(&self, operation: BlobOperation) -> BlobStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failing.insert(operation);
        Ok(())
    }

    /// Clears all injected failures.
    ///
    /// # Errors
    ///
    /// Returns blob store errors when lock acquisition fails.
    pub fn clear_failures(&self) -> BlobStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failing.clear();
        Ok(())
    }

    /// Signature appended to resolved URLs.
    #[must_use]
    pub fn signature(&self, key: &AttachmentKey, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_secret.as_bytes());
        hasher.update(b"\n");
        hasher.update(key.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(expires.to_string().as_bytes());
        hasher
            .finalize()
            .iter()
            .fold(String::with_capacity(64), |mut hex, byte| {
                // Writing to a String cannot fail.
                write!(hex, "{byte:02x}").ok();
                hex
            })
    }
}

#[async_trait]
impl<C> BlobStore for InMemoryBlobStore<C>
where
    C: Clock + Send + Sync,
{
    async fn put(
        &self,
        key: &AttachmentKey,
        file: &UploadFile,
        progress: &dyn TransferProgress,
    ) -> BlobStoreResult<()> {
        self.journal.record(RecordedCall::PutBlob(key.clone()));
        self.state.read().map_err(lock_error)?.check(BlobOperation::Put)?;

        let total = file.len();
        let mut loaded = 0_u64;
        for chunk in file.bytes().chunks(PROGRESS_CHUNK_BYTES) {
            loaded = loaded.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
            progress.report(loaded, total);
        }
        if file.is_empty() {
            progress.report(0, 0);
        }

        let mut state = self.state.write().map_err(lock_error)?;
        state.objects.insert(
            key.clone(),
            StoredObject {
                content_type: file.content_type().to_owned(),
                bytes: file.bytes().to_vec(),
            },
        );
        Ok(())
    }

    async fn url(&self, key: &AttachmentKey) -> BlobStoreResult<String> {
        self.journal.record(RecordedCall::ResolveBlob(key.clone()));
        self.state.read().map_err(lock_error)?.check(BlobOperation::Url)?;
        let expires = (self.clock.utc() + self.url_ttl).timestamp();
        Ok(format!(
            "{}/{key}?expires={expires}&sig={}",
            self.base_url,
            self.signature(key, expires)
        ))
    }

    async fn remove(&self, key: &AttachmentKey) -> BlobStoreResult<()> {
        self.journal.record(RecordedCall::RemoveBlob(key.clone()));
        let mut state = self.state.write().map_err(lock_error)?;
        state.check(BlobOperation::Remove)?;
        state
            .objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobStoreError::NotFound(key.clone()))
    }
}
