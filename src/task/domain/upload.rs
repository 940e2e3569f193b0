//! Attachment upload values: the file being sent, its progress, and the
//! storage key it is written under.

use super::{AttachmentKey, TaskDomainError, TaskId};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use std::fmt;

/// Prefix shared by every attachment key.
pub const ATTACHMENT_KEY_PREFIX: &str = "attachments";

/// File selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl UploadFile {
    /// Creates an upload from a file name, MIME type and contents.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyFileName`] when the file name is
    /// blank.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, TaskDomainError> {
        let raw = file_name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyFileName);
        }
        Ok(Self {
            file_name: trimmed.to_owned(),
            content_type: content_type.into(),
            bytes,
        })
    }

    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the MIME type sent with the object.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the content length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }

    /// Returns `true` for a zero-byte file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Upload completion as a whole percentage in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadProgress(u8);

impl UploadProgress {
    /// No bytes transferred.
    pub const ZERO: Self = Self(0);
    /// Transfer finished.
    pub const COMPLETE: Self = Self(100);

    /// Converts cumulative transferred bytes into a percentage, rounding
    /// down and clamping to 100.
    ///
    /// An empty transfer counts as complete.
    #[must_use]
    pub fn from_bytes(loaded: u64, total: u64) -> Self {
        let percent = loaded
            .saturating_mul(100)
            .checked_div(total)
            .unwrap_or(100)
            .min(100);
        Self(u8::try_from(percent).unwrap_or(100))
    }

    /// Returns the percentage.
    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }
}

impl fmt::Display for UploadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl AttachmentKey {
    /// Derives the storage key for a new attachment.
    ///
    /// The key is `attachments/{user}/{task}/{unix_millis}-{file_name}`,
    /// so repeated uploads of the same file to the same task do not collide.
    #[must_use]
    pub fn derive(
        user: &UserId,
        task_id: &TaskId,
        uploaded_at: DateTime<Utc>,
        file_name: &str,
    ) -> Self {
        Self::from_derived(format!(
            "{ATTACHMENT_KEY_PREFIX}/{user}/{task_id}/{}-{file_name}",
            uploaded_at.timestamp_millis()
        ))
    }
}
