//! In-memory task store for tests and local runs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::journal::{RecordedCall, RequestJournal};
use crate::task::{
    domain::{TaskContent, TaskId, TaskPatch, TaskRecord, TaskStats},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// Task store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// [`TaskStore::list`].
    List,
    /// [`TaskStore::get`].
    Get,
    /// [`TaskStore::create`].
    Create,
    /// [`TaskStore::update`].
    Update,
    /// [`TaskStore::delete`].
    Delete,
    /// [`TaskStore::stats`].
    Stats,
}

/// Thread-safe in-memory task store.
///
/// Records keep insertion order, mirroring a store that lists tasks in
/// creation order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryStoreState>>,
    journal: RequestJournal,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    records: Vec<TaskRecord>,
    failing: HashSet<StoreOperation>,
}

fn lock_error(err: impl std::fmt::Display) -> TaskStoreError {
    TaskStoreError::transport(std::io::Error::other(err.to_string()))
}

fn injected_failure(operation: StoreOperation) -> TaskStoreError {
    TaskStoreError::transport(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        format!("injected {operation:?} failure"),
    ))
}

impl InMemoryStoreState {
    fn check(&self, operation: StoreOperation) -> TaskStoreResult<()> {
        if self.failing.contains(&operation) {
            return Err(injected_failure(operation));
        }
        Ok(())
    }

    fn position(&self, id: &TaskId) -> TaskStoreResult<usize> {
        self.records
            .iter()
            .position(|record| record.task_id == *id)
            .ok_or_else(|| TaskStoreError::NotFound(id.clone()))
    }
}

impl InMemoryTaskStore {
    /// Creates an empty store with its own journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that records into `journal`.
    #[must_use]
    pub fn with_journal(journal: RequestJournal) -> Self {
        Self {
            state: Arc::default(),
            journal,
        }
    }

    /// Returns the journal this store records into.
    #[must_use]
    pub const fn journal(&self) -> &RequestJournal {
        &self.journal
    }

    /// Inserts records as if they had been created earlier. Seeding is not
    /// journalled.
    ///
    /// # Errors
    ///
    /// Returns store errors when lock acquisition fails.
    pub fn seed(&self, records: impl IntoIterator<Item = TaskRecord>) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.records.extend(records);
        Ok(())
    }

    /// Returns the stored records without journalling a request.
    ///
    /// # Errors
    ///
    /// Returns store errors when lock acquisition fails.
    pub fn records(&self) -> TaskStoreResult<Vec<TaskRecord>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.records.clone())
    }

    /// Makes every later call of `operation` fail with a transport error.
    ///
    /// # Errors
    ///
    /// Returns store errors when lock acquisition fails.
    pub fn fail_on(&self, operation: StoreOperation) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failing.insert(operation);
        Ok(())
    }

    /// Clears all injected failures.
    ///
    /// # Errors
    ///
    /// Returns store errors when lock acquisition fails.
    pub fn clear_failures(&self) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failing.clear();
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list(&self) -> TaskStoreResult<Vec<TaskRecord>> {
        self.journal.record(RecordedCall::ListTasks);
        let state = self.state.read().map_err(lock_error)?;
        state.check(StoreOperation::List)?;
        Ok(state.records.clone())
    }

    async fn get(&self, id: &TaskId) -> TaskStoreResult<TaskRecord> {
        self.journal.record(RecordedCall::GetTask(id.clone()));
        let state = self.state.read().map_err(lock_error)?;
        state.check(StoreOperation::Get)?;
        let index = state.position(id)?;
        state
            .records
            .get(index)
            .cloned()
            .ok_or_else(|| TaskStoreError::NotFound(id.clone()))
    }

    async fn create(&self, content: &TaskContent) -> TaskStoreResult<TaskRecord> {
        self.journal.record(RecordedCall::CreateTask(content.clone()));
        let mut state = self.state.write().map_err(lock_error)?;
        state.check(StoreOperation::Create)?;
        let task_id = TaskId::new(Uuid::new_v4().to_string())
            .map_err(|err| TaskStoreError::Malformed(err.to_string()))?;
        let record = TaskRecord::new(task_id, content.as_str());
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskStoreResult<TaskRecord> {
        self.journal
            .record(RecordedCall::UpdateTask(id.clone(), patch.clone()));
        let mut state = self.state.write().map_err(lock_error)?;
        state.check(StoreOperation::Update)?;
        let index = state.position(id)?;
        let record = state
            .records
            .get_mut(index)
            .ok_or_else(|| TaskStoreError::NotFound(id.clone()))?;
        record.apply(patch);
        Ok(record.clone())
    }

    async fn delete(&self, id: &TaskId) -> TaskStoreResult<()> {
        self.journal.record(RecordedCall::DeleteTask(id.clone()));
        let mut state = self.state.write().map_err(lock_error)?;
        state.check(StoreOperation::Delete)?;
        let index = state.position(id)?;
        state.records.remove(index);
        Ok(())
    }

    async fn stats(&self) -> TaskStoreResult<TaskStats> {
        self.journal.record(RecordedCall::Stats);
        let state = self.state.read().map_err(lock_error)?;
        state.check(StoreOperation::Stats)?;
        Ok(TaskStats::from_records(&state.records))
    }
}
