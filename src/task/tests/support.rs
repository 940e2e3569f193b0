//! Shared fixtures for controller tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::fixture;
use tokio::sync::Notify;

use crate::identity::{adapters::StaticSession, domain::UserId};
use crate::task::{
    adapters::memory::{InMemoryBlobStore, InMemoryTaskStore, RequestJournal},
    domain::{
        AttachmentKey, TaskContent, TaskId, TaskPatch, TaskRecord, TaskStats, UploadFile,
        UploadProgress,
    },
    ports::{BlobStore, BlobStoreResult, TaskStore, TaskStoreResult, TransferProgress},
    services::TaskListController,
};

pub(super) type MemoryController = TaskListController<
    InMemoryTaskStore,
    InMemoryBlobStore<DefaultClock>,
    StaticSession,
    DefaultClock,
>;

pub(super) const SIGNED_IN_USER: &str = "alice";

pub(super) struct Harness {
    pub journal: RequestJournal,
    pub store: Arc<InMemoryTaskStore>,
    pub blobs: Arc<InMemoryBlobStore<DefaultClock>>,
    pub controller: MemoryController,
}

#[fixture]
pub(super) fn harness() -> Harness {
    let journal = RequestJournal::new();
    let store = Arc::new(InMemoryTaskStore::with_journal(journal.clone()));
    let blobs = Arc::new(
        InMemoryBlobStore::with_journal(DefaultClock, journal.clone())
            .with_base_url("https://blobs.test"),
    );
    let controller = TaskListController::new(
        Arc::clone(&store),
        Arc::clone(&blobs),
        Arc::new(session()),
        Arc::new(DefaultClock),
    );
    Harness {
        journal,
        store,
        blobs,
        controller,
    }
}

pub(super) fn session() -> StaticSession {
    StaticSession::new(UserId::new(SIGNED_IN_USER).expect("valid user"))
}

pub(super) fn task_id(value: &str) -> TaskId {
    TaskId::new(value).expect("valid task id")
}

pub(super) fn key(value: &str) -> AttachmentKey {
    AttachmentKey::new(value).expect("valid key")
}

pub(super) fn record(id: &str, content: &str) -> TaskRecord {
    TaskRecord::new(task_id(id), content)
}

pub(super) fn text_file(name: &str, len: usize) -> UploadFile {
    UploadFile::new(name, "text/plain", vec![b'x'; len]).expect("valid file")
}

/// Collects progress values passed to an upload observer.
#[derive(Debug, Clone, Default)]
pub(super) struct ProgressLog(Arc<Mutex<Vec<u8>>>);

impl ProgressLog {
    pub(super) fn observer(&self) -> impl Fn(UploadProgress) + Send + Sync {
        let values = Arc::clone(&self.0);
        move |progress| values.lock().expect("progress lock").push(progress.percent())
    }

    pub(super) fn values(&self) -> Vec<u8> {
        self.0.lock().expect("progress lock").clone()
    }
}

/// Blob store that serves fixed CDN URLs and holds uploads until released.
#[derive(Debug, Default)]
pub(super) struct GatedBlobStore {
    gate: Notify,
}

impl GatedBlobStore {
    pub(super) fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl BlobStore for GatedBlobStore {
    async fn put(
        &self,
        _key: &AttachmentKey,
        file: &UploadFile,
        progress: &dyn TransferProgress,
    ) -> BlobStoreResult<()> {
        self.gate.notified().await;
        progress.report(file.len(), file.len());
        Ok(())
    }

    async fn url(&self, key: &AttachmentKey) -> BlobStoreResult<String> {
        Ok(format!("https://cdn.test/{key}"))
    }

    async fn remove(&self, _key: &AttachmentKey) -> BlobStoreResult<()> {
        Ok(())
    }
}

/// Task store whose first `list` waits until released; later calls pass
/// straight through to the wrapped in-memory store.
#[derive(Debug, Default)]
pub(super) struct FirstListGatedStore {
    inner: InMemoryTaskStore,
    gate: Notify,
    first_list_taken: AtomicBool,
}

impl FirstListGatedStore {
    pub(super) const fn inner(&self) -> &InMemoryTaskStore {
        &self.inner
    }

    pub(super) fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl TaskStore for FirstListGatedStore {
    async fn list(&self) -> TaskStoreResult<Vec<TaskRecord>> {
        if !self.first_list_taken.swap(true, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        self.inner.list().await
    }

    async fn get(&self, id: &TaskId) -> TaskStoreResult<TaskRecord> {
        self.inner.get(id).await
    }

    async fn create(&self, content: &TaskContent) -> TaskStoreResult<TaskRecord> {
        self.inner.create(content).await
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskStoreResult<TaskRecord> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &TaskId) -> TaskStoreResult<()> {
        self.inner.delete(id).await
    }

    async fn stats(&self) -> TaskStoreResult<TaskStats> {
        self.inner.stats().await
    }
}

/// Blob store that holds resolution of one key until another key has
/// resolved, and records the order in which URLs were produced.
#[derive(Debug)]
pub(super) struct OutOfOrderBlobStore {
    held: AttachmentKey,
    released_by: AttachmentKey,
    gate: Notify,
    resolved: Mutex<Vec<AttachmentKey>>,
}

impl OutOfOrderBlobStore {
    pub(super) fn new(held: AttachmentKey, released_by: AttachmentKey) -> Self {
        Self {
            held,
            released_by,
            gate: Notify::new(),
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn resolved(&self) -> Vec<AttachmentKey> {
        self.resolved.lock().expect("resolved lock").clone()
    }
}

#[async_trait]
impl BlobStore for OutOfOrderBlobStore {
    async fn put(
        &self,
        _key: &AttachmentKey,
        _file: &UploadFile,
        _progress: &dyn TransferProgress,
    ) -> BlobStoreResult<()> {
        Ok(())
    }

    async fn url(&self, key: &AttachmentKey) -> BlobStoreResult<String> {
        if *key == self.held {
            self.gate.notified().await;
        }
        self.resolved.lock().expect("resolved lock").push(key.clone());
        if *key == self.released_by {
            self.gate.notify_one();
        }
        Ok(format!("https://cdn.test/{key}"))
    }

    async fn remove(&self, _key: &AttachmentKey) -> BlobStoreResult<()> {
        Ok(())
    }
}
