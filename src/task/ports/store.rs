//! Task store port: remote CRUD over task records plus aggregate stats.

use crate::task::domain::{TaskContent, TaskId, TaskPatch, TaskRecord, TaskStats};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Remote task data service contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Lists every task owned by the signed-in user, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when the request fails or the response
    /// cannot be decoded.
    async fn list(&self) -> TaskStoreResult<Vec<TaskRecord>>;

    /// Fetches one task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn get(&self, id: &TaskId) -> TaskStoreResult<TaskRecord>;

    /// Creates a task; the store assigns its identifier and sets
    /// `completed = false`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when the store rejects the request.
    async fn create(&self, content: &TaskContent) -> TaskStoreResult<TaskRecord>;

    /// Merges a partial update into an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskStoreResult<TaskRecord>;

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn delete(&self, id: &TaskId) -> TaskStoreResult<()>;

    /// Returns aggregate counts across the user's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError`] when the request fails.
    async fn stats(&self) -> TaskStoreResult<TaskStats>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The store answered with a non-success status.
    #[error("task store rejected the request with status {status}: {message}")]
    Rejected {
        /// HTTP-style status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("malformed task store response: {0}")]
    Malformed(String),

    /// Transport-layer failure.
    #[error("task store unavailable: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
