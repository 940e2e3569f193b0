//! Shared request log for in-memory adapters.
//!
//! Store and blob adapters that share a journal record their calls into one
//! sequence, so tests can assert cross-service ordering such as "blob removed
//! before record deleted".

use std::sync::{Arc, RwLock};

use crate::task::domain::{AttachmentKey, TaskContent, TaskId, TaskPatch};

/// One request received by an in-memory adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// Task list request.
    ListTasks,
    /// Single task lookup.
    GetTask(TaskId),
    /// Task creation.
    CreateTask(TaskContent),
    /// Partial task update.
    UpdateTask(TaskId, TaskPatch),
    /// Task deletion.
    DeleteTask(TaskId),
    /// Stats request.
    Stats,
    /// Object upload.
    PutBlob(AttachmentKey),
    /// Object URL resolution.
    ResolveBlob(AttachmentKey),
    /// Object removal.
    RemoveBlob(AttachmentKey),
}

impl RecordedCall {
    /// Returns `true` for requests sent to the task store.
    #[must_use]
    pub const fn is_store_call(&self) -> bool {
        matches!(
            self,
            Self::ListTasks
                | Self::GetTask(_)
                | Self::CreateTask(_)
                | Self::UpdateTask(..)
                | Self::DeleteTask(_)
                | Self::Stats
        )
    }
}

/// Ordered, cloneable request log.
#[derive(Debug, Clone, Default)]
pub struct RequestJournal {
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl RequestJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call.
    pub fn record(&self, call: RecordedCall) {
        let mut calls = self
            .calls
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        calls.push(call);
    }

    /// Returns every call recorded so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Forgets all recorded calls.
    pub fn clear(&self) {
        self.calls
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}
