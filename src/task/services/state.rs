//! Observable task list state and operation outcomes.

use crate::task::domain::{Task, UploadProgress};

/// Snapshot of the controller's view of the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListState {
    /// Tasks as last fetched, in store order.
    pub tasks: Vec<Task>,
    /// A fetch is in flight.
    pub loading: bool,
    /// Message describing the last failure, until cleared.
    pub error: Option<String>,
    /// An attachment upload is in flight.
    pub uploading: bool,
    /// Progress of the in-flight upload; zero when idle.
    pub upload_progress: UploadProgress,
}

/// What a controller operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum OperationOutcome {
    /// The requests were issued and succeeded.
    ///
    /// For mutations this means the store accepted the change; a failing
    /// follow-up fetch is reported through the state's `error`.
    Completed,
    /// Input failed client-side validation; no request was issued.
    Skipped,
    /// Another upload is in flight; nothing was issued.
    Rejected,
    /// A request failed; the state's `error` holds the message.
    Failed,
}

impl OperationOutcome {
    /// Returns `true` for [`OperationOutcome::Completed`].
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}
