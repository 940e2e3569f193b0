//! Task list controller: fetches the list, applies mutations and uploads
//! attachments, holding the state a presentation layer renders.

use super::state::{OperationOutcome, TaskListState};
use crate::identity::ports::{IdentityError, SessionContext};
use crate::task::{
    domain::{
        AttachmentKey, ResolvedAttachment, Task, TaskContent, TaskId, TaskPatch, TaskRecord,
        UploadFile, UploadProgress,
    },
    ports::{BlobStore, BlobStoreError, TaskStore, TaskStoreError, TransferProgress},
};
use futures::future::try_join_all;
use mockable::Clock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Message recorded when the task list cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load tasks. Please try again.";

/// Message recorded when an attachment cannot be uploaded or linked.
pub const UPLOAD_FAILED_MESSAGE: &str = "File upload failed. Please try again.";

/// Failures caught at the controller boundary.
#[derive(Debug, Error)]
pub enum TaskListError {
    /// Listing tasks failed.
    #[error("failed to list tasks: {0}")]
    List(#[source] TaskStoreError),

    /// An attachment URL could not be resolved during a fetch.
    #[error("failed to resolve attachment {key}: {source}")]
    ResolveAttachment {
        /// Key being resolved.
        key: AttachmentKey,
        /// Blob store failure.
        #[source]
        source: BlobStoreError,
    },

    /// Creating a task failed.
    #[error("failed to create task: {0}")]
    Create(#[source] TaskStoreError),

    /// Updating a task failed.
    #[error("failed to update task {task_id}: {source}")]
    Update {
        /// Task being updated.
        task_id: TaskId,
        /// Store failure.
        #[source]
        source: TaskStoreError,
    },

    /// Looking up a task that is not held locally failed.
    #[error("failed to look up task {task_id}: {source}")]
    Lookup {
        /// Task being looked up.
        task_id: TaskId,
        /// Store failure.
        #[source]
        source: TaskStoreError,
    },

    /// Removing a task's attachment failed; the task was not deleted.
    #[error("failed to remove attachment {key}: {source}")]
    RemoveAttachment {
        /// Key being removed.
        key: AttachmentKey,
        /// Blob store failure.
        #[source]
        source: BlobStoreError,
    },

    /// Deleting a task failed.
    #[error("failed to delete task {task_id}: {source}")]
    Delete {
        /// Task being deleted.
        task_id: TaskId,
        /// Store failure.
        #[source]
        source: TaskStoreError,
    },

    /// The signed-in user could not be determined.
    #[error("failed to determine the signed-in user: {0}")]
    Session(#[source] IdentityError),

    /// Writing an attachment to the blob store failed.
    #[error("failed to upload attachment {key}: {source}")]
    Upload {
        /// Key being written.
        key: AttachmentKey,
        /// Blob store failure.
        #[source]
        source: BlobStoreError,
    },

    /// The attachment was stored but the task could not reference it.
    #[error("failed to link attachment to task {task_id}: {source}")]
    LinkAttachment {
        /// Task being linked.
        task_id: TaskId,
        /// Store failure.
        #[source]
        source: TaskStoreError,
    },
}

impl TaskListError {
    /// Returns the message recorded in [`TaskListState::error`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::List(_) | Self::ResolveAttachment { .. } => LOAD_FAILED_MESSAGE.to_owned(),
            Self::Session(_) | Self::Upload { .. } | Self::LinkAttachment { .. } => {
                UPLOAD_FAILED_MESSAGE.to_owned()
            }
            Self::Create(source)
            | Self::Update { source, .. }
            | Self::Lookup { source, .. }
            | Self::Delete { source, .. } => format!("Operation failed: {source}"),
            Self::RemoveAttachment { source, .. } => format!("Operation failed: {source}"),
        }
    }
}

/// Result type for controller internals.
pub type TaskListResult<T> = Result<T, TaskListError>;

/// Forwards blob store progress to the state and the caller's observer.
///
/// Reports that would move progress backwards are dropped.
struct ProgressRelay<'a, F> {
    state: &'a Mutex<TaskListState>,
    observer: &'a F,
}

impl<F> ProgressRelay<'_, F>
where
    F: Fn(UploadProgress) + Send + Sync,
{
    fn advance(&self, progress: UploadProgress) {
        let advanced = {
            let mut state = self.state.lock();
            let moved = progress > state.upload_progress;
            if moved {
                state.upload_progress = progress;
            }
            moved
        };
        if advanced {
            (self.observer)(progress);
        }
    }
}

impl<F> TransferProgress for ProgressRelay<'_, F>
where
    F: Fn(UploadProgress) + Send + Sync,
{
    fn report(&self, loaded: u64, total: u64) {
        self.advance(UploadProgress::from_bytes(loaded, total));
    }
}

/// Marks an upload in flight; resets upload state when dropped, including
/// when the operation future is cancelled.
struct UploadSlot<'a> {
    state: &'a Mutex<TaskListState>,
}

impl<'a> UploadSlot<'a> {
    fn acquire(state: &'a Mutex<TaskListState>) -> Option<Self> {
        let mut guard = state.lock();
        if guard.uploading {
            return None;
        }
        guard.uploading = true;
        guard.upload_progress = UploadProgress::ZERO;
        drop(guard);
        Some(Self { state })
    }
}

impl Drop for UploadSlot<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.uploading = false;
        state.upload_progress = UploadProgress::ZERO;
    }
}

/// Counts a fetch as in flight; `loading` stays set until the last
/// overlapping fetch finishes or is cancelled.
///
/// The counter only changes while the state lock is held, so `loading`
/// always equals `in_flight > 0`.
struct FetchGuard<'a> {
    state: &'a Mutex<TaskListState>,
    in_flight: &'a AtomicUsize,
}

impl<'a> FetchGuard<'a> {
    fn enter(state: &'a Mutex<TaskListState>, in_flight: &'a AtomicUsize) -> Self {
        let mut guard = state.lock();
        in_flight.fetch_add(1, Ordering::Relaxed);
        guard.loading = true;
        drop(guard);
        Self { state, in_flight }
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        let previous = self.in_flight.fetch_sub(1, Ordering::Relaxed);
        state.loading = previous > 1;
    }
}

/// Holds the task list and mediates every change through the task store.
///
/// Mutations never patch the local list: on success they refetch, so the
/// list always mirrors the store. Failures are caught here, logged, and
/// recorded as a single message in the state's `error`, which stays until
/// [`TaskListController::clear_error`] is called.
pub struct TaskListController<S, B, U, C>
where
    S: TaskStore,
    B: BlobStore,
    U: SessionContext,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    blobs: Arc<B>,
    session: Arc<U>,
    clock: Arc<C>,
    state: Mutex<TaskListState>,
    fetches_in_flight: AtomicUsize,
}

impl<S, B, U, C> TaskListController<S, B, U, C>
where
    S: TaskStore,
    B: BlobStore,
    U: SessionContext,
    C: Clock + Send + Sync,
{
    /// Creates a controller with an empty list.
    #[must_use]
    pub fn new(store: Arc<S>, blobs: Arc<B>, session: Arc<U>, clock: Arc<C>) -> Self {
        Self {
            store,
            blobs,
            session,
            clock,
            state: Mutex::new(TaskListState::default()),
            fetches_in_flight: AtomicUsize::new(0),
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> TaskListState {
        self.state.lock().clone()
    }

    /// Returns the tasks from the last successful fetch.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// Returns the task with `task_id` from the last successful fetch.
    #[must_use]
    pub fn task(&self, task_id: &TaskId) -> Option<Task> {
        self.state
            .lock()
            .tasks
            .iter()
            .find(|task| task.id() == task_id)
            .cloned()
    }

    /// Returns `true` while at least one fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Returns the recorded error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Returns `true` while an attachment upload is in flight.
    #[must_use]
    pub fn is_uploading(&self) -> bool {
        self.state.lock().uploading
    }

    /// Returns the progress of the in-flight upload.
    #[must_use]
    pub fn upload_progress(&self) -> UploadProgress {
        self.state.lock().upload_progress
    }

    /// Dismisses the recorded error.
    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    /// Replaces the list with the store's current tasks.
    ///
    /// Attachment URLs are resolved concurrently; the list keeps the store's
    /// order. On failure the previous list is kept.
    pub async fn fetch(&self) -> OperationOutcome {
        if self.refresh().await {
            OperationOutcome::Completed
        } else {
            OperationOutcome::Failed
        }
    }

    /// Creates a task from `content` after trimming it.
    ///
    /// Blank content is skipped without contacting the store.
    pub async fn add_task(&self, content: &str) -> OperationOutcome {
        let Ok(task_content) = TaskContent::new(content) else {
            debug!("skipping blank task content");
            return OperationOutcome::Skipped;
        };
        let result = self
            .store
            .create(&task_content)
            .await
            .map(|record| debug!(task_id = %record.task_id, "task created"))
            .map_err(TaskListError::Create);
        self.finish_mutation(result).await
    }

    /// Deletes a task, removing its attachment from the blob store first.
    ///
    /// When the attachment cannot be removed the task is left in place.
    pub async fn delete_task(&self, task_id: &TaskId) -> OperationOutcome {
        let result = self.remove_task(task_id).await;
        self.finish_mutation(result).await
    }

    /// Flips the completion flag, given the flag the caller currently shows.
    pub async fn toggle_complete(&self, task_id: &TaskId, completed: bool) -> OperationOutcome {
        let patch = TaskPatch::completed(!completed);
        let result = self.patch_task(task_id, &patch).await;
        self.finish_mutation(result).await
    }

    /// Replaces a task's text with `content` after trimming it.
    ///
    /// Blank content is skipped without contacting the store.
    pub async fn save_edit(&self, task_id: &TaskId, content: &str) -> OperationOutcome {
        let Ok(task_content) = TaskContent::new(content) else {
            debug!(%task_id, "skipping blank edit");
            return OperationOutcome::Skipped;
        };
        let result = self
            .patch_task(task_id, &TaskPatch::content(task_content))
            .await;
        self.finish_mutation(result).await
    }

    /// Uploads `file` and links it to the task.
    ///
    /// `observer` receives non-decreasing progress, starting at 0 and ending
    /// at 100 when the upload succeeds. Only one upload runs at a time; a
    /// call made while another is in flight returns
    /// [`OperationOutcome::Rejected`]. The list is not refetched.
    pub async fn attach<F>(
        &self,
        task_id: &TaskId,
        file: &UploadFile,
        observer: F,
    ) -> OperationOutcome
    where
        F: Fn(UploadProgress) + Send + Sync,
    {
        let Some(slot) = UploadSlot::acquire(&self.state) else {
            debug!(%task_id, "upload already in flight");
            return OperationOutcome::Rejected;
        };
        observer(UploadProgress::ZERO);
        let result = self.upload_and_link(task_id, file, &observer).await;
        drop(slot);
        match result {
            Ok(key) => {
                info!(%task_id, %key, "attachment linked");
                OperationOutcome::Completed
            }
            Err(err) => self.record_failure(&err),
        }
    }

    async fn refresh(&self) -> bool {
        let fetching = FetchGuard::enter(&self.state, &self.fetches_in_flight);
        let result = self.load_tasks().await;
        let loaded = {
            let mut state = self.state.lock();
            match result {
                Ok(tasks) => {
                    debug!(count = tasks.len(), "tasks fetched");
                    state.tasks = tasks;
                    true
                }
                Err(err) => {
                    warn!(error = %err, "task fetch failed");
                    state.error = Some(err.user_message());
                    false
                }
            }
        };
        drop(fetching);
        loaded
    }

    async fn load_tasks(&self) -> TaskListResult<Vec<Task>> {
        let records = self.store.list().await.map_err(TaskListError::List)?;
        try_join_all(records.into_iter().map(|record| self.resolve(record))).await
    }

    async fn resolve(&self, record: TaskRecord) -> TaskListResult<Task> {
        let Some(key) = record.attachment.clone() else {
            return Ok(Task::without_attachment(record));
        };
        match self.blobs.url(&key).await {
            Ok(url) => Ok(Task::with_resolved_attachment(
                record,
                ResolvedAttachment::new(key, url),
            )),
            Err(source) => Err(TaskListError::ResolveAttachment { key, source }),
        }
    }

    async fn patch_task(&self, task_id: &TaskId, patch: &TaskPatch) -> TaskListResult<()> {
        self.store
            .update(task_id, patch)
            .await
            .map(|_| debug!(%task_id, "task updated"))
            .map_err(|source| TaskListError::Update {
                task_id: task_id.clone(),
                source,
            })
    }

    async fn remove_task(&self, task_id: &TaskId) -> TaskListResult<()> {
        if let Some(key) = self.attachment_of(task_id).await?
            && let Err(source) = self.blobs.remove(&key).await
        {
            return Err(TaskListError::RemoveAttachment { key, source });
        }
        self.store
            .delete(task_id)
            .await
            .map(|()| debug!(%task_id, "task deleted"))
            .map_err(|source| TaskListError::Delete {
                task_id: task_id.clone(),
                source,
            })
    }

    /// Finds the attachment key of a task, asking the store when the task
    /// is not in the local list.
    async fn attachment_of(&self, task_id: &TaskId) -> TaskListResult<Option<AttachmentKey>> {
        if let Some(task) = self.task(task_id) {
            return Ok(task.attachment().cloned());
        }
        debug!(%task_id, "task not held locally; looking it up");
        let record = self
            .store
            .get(task_id)
            .await
            .map_err(|source| TaskListError::Lookup {
                task_id: task_id.clone(),
                source,
            })?;
        Ok(record.attachment)
    }

    async fn upload_and_link<F>(
        &self,
        task_id: &TaskId,
        file: &UploadFile,
        observer: &F,
    ) -> TaskListResult<AttachmentKey>
    where
        F: Fn(UploadProgress) + Send + Sync,
    {
        let user = self
            .session
            .current_user()
            .await
            .map_err(TaskListError::Session)?;
        let key = AttachmentKey::derive(&user, task_id, self.clock.utc(), file.file_name());
        let relay = ProgressRelay {
            state: &self.state,
            observer,
        };
        if let Err(source) = self.blobs.put(&key, file, &relay).await {
            return Err(TaskListError::Upload { key, source });
        }
        relay.advance(UploadProgress::COMPLETE);

        let patch = TaskPatch::attachment(key.clone());
        if let Err(source) = self.store.update(task_id, &patch).await {
            warn!(%task_id, %key, "attachment stored but not linked; object is orphaned");
            return Err(TaskListError::LinkAttachment {
                task_id: task_id.clone(),
                source,
            });
        }
        Ok(key)
    }

    async fn finish_mutation(&self, result: TaskListResult<()>) -> OperationOutcome {
        match result {
            Ok(()) => {
                self.refresh().await;
                OperationOutcome::Completed
            }
            Err(err) => self.record_failure(&err),
        }
    }

    fn record_failure(&self, err: &TaskListError) -> OperationOutcome {
        warn!(error = %err, "task list operation failed");
        self.state.lock().error = Some(err.user_message());
        OperationOutcome::Failed
    }
}
