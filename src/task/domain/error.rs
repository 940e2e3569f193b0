//! Error types for task domain validation.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task identifier is empty after trimming.
    #[error("task identifier must not be empty")]
    EmptyTaskId,

    /// The task content is empty after trimming.
    #[error("task content must not be empty")]
    EmptyContent,

    /// The attachment key is empty after trimming.
    #[error("attachment key must not be empty")]
    EmptyAttachmentKey,

    /// The uploaded file has no usable name.
    #[error("attachment file name must not be empty")]
    EmptyFileName,
}
