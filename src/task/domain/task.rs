//! Task records as exchanged with the store, and the resolved view held by
//! the controller.

use super::{AttachmentKey, TaskDomainError, TaskId, ids::deserialize_optional_key};
use serde::{Deserialize, Serialize};

/// Validated task text: trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskContent(String);

impl TaskContent {
    /// Trims and validates task content.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyContent`] when nothing remains after
    /// trimming.
    pub fn new(value: impl AsRef<str>) -> Result<Self, TaskDomainError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyContent);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the content as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskContent {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Task as returned by the task store.
///
/// Content is kept as the store sent it: the store is the source of truth,
/// so records are never rejected on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Store-assigned identifier.
    pub task_id: TaskId,
    /// Task text.
    pub content: String,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Storage key of the attached file, if any.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment: Option<AttachmentKey>,
}

impl TaskRecord {
    /// Creates a record with no attachment and `completed = false`.
    #[must_use]
    pub fn new(task_id: TaskId, content: impl Into<String>) -> Self {
        Self {
            task_id,
            content: content.into(),
            completed: false,
            attachment: None,
        }
    }

    /// Sets the completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Sets the attachment key.
    #[must_use]
    pub fn with_attachment(mut self, key: AttachmentKey) -> Self {
        self.attachment = Some(key);
        self
    }

    /// Applies a partial update with merge semantics.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(content) = &patch.content {
            content.as_str().clone_into(&mut self.content);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(key) = &patch.attachment {
            self.attachment = Some(key.clone());
        }
    }
}

/// Attachment key paired with the URL it resolved to during a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    key: AttachmentKey,
    url: String,
}

impl ResolvedAttachment {
    /// Pairs a key with its resolved URL.
    #[must_use]
    pub fn new(key: AttachmentKey, url: impl Into<String>) -> Self {
        Self {
            key,
            url: url.into(),
        }
    }

    /// Returns the storage key.
    #[must_use]
    pub const fn key(&self) -> &AttachmentKey {
        &self.key
    }

    /// Returns the resolved URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Task as presented by the controller after a fetch.
///
/// The attachment key and its URL travel together, so a URL can never exist
/// without a key or outlive the fetch that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    content: String,
    completed: bool,
    attachment: Option<ResolvedAttachment>,
}

impl Task {
    /// Builds a view from a record that carries no attachment.
    ///
    /// Any key present on the record is dropped; use
    /// [`Task::with_resolved_attachment`] for attachment-bearing records.
    #[must_use]
    pub fn without_attachment(record: TaskRecord) -> Self {
        Self {
            id: record.task_id,
            content: record.content,
            completed: record.completed,
            attachment: None,
        }
    }

    /// Builds a view from a record and the URL its attachment resolved to.
    #[must_use]
    pub fn with_resolved_attachment(record: TaskRecord, resolved: ResolvedAttachment) -> Self {
        Self {
            id: record.task_id,
            content: record.content,
            completed: record.completed,
            attachment: Some(resolved),
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns whether the task is completed.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the attachment key, if any.
    #[must_use]
    pub fn attachment(&self) -> Option<&AttachmentKey> {
        self.attachment.as_ref().map(ResolvedAttachment::key)
    }

    /// Returns the attachment URL resolved during the last fetch, if any.
    #[must_use]
    pub fn attachment_url(&self) -> Option<&str> {
        self.attachment.as_ref().map(ResolvedAttachment::url)
    }
}

/// Partial task update with merge semantics.
///
/// Absent fields are omitted from the request body and left untouched by the
/// store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// Replacement text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<TaskContent>,
    /// Replacement completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Replacement attachment key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentKey>,
}

impl TaskPatch {
    /// Patch that only replaces the task text.
    #[must_use]
    pub fn content(content: TaskContent) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    /// Patch that only sets the completion flag.
    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Patch that only sets the attachment key.
    #[must_use]
    pub fn attachment(key: AttachmentKey) -> Self {
        Self {
            attachment: Some(key),
            ..Self::default()
        }
    }

    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.content.is_none() && self.completed.is_none() && self.attachment.is_none()
    }
}

/// Aggregate counts served by the stats endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskStats {
    /// Number of tasks.
    pub total: u64,
    /// Number of completed tasks.
    pub completed: u64,
    /// Number of open tasks.
    pub pending: u64,
}

impl TaskStats {
    /// Computes stats from a set of records.
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TaskRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut stats, record| {
                stats.total += 1;
                if record.completed {
                    stats.completed += 1;
                } else {
                    stats.pending += 1;
                }
                stats
            })
    }
}
