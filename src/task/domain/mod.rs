//! Domain model for the task list.
//!
//! Tasks are owned by the remote store; the domain only validates what the
//! client sends (content, patches, upload metadata) and pairs fetched records
//! with the attachment URLs resolved for them.

mod error;
mod ids;
mod task;
mod upload;

pub use error::TaskDomainError;
pub use ids::{AttachmentKey, TaskId};
pub use task::{ResolvedAttachment, Task, TaskContent, TaskPatch, TaskRecord, TaskStats};
pub use upload::{ATTACHMENT_KEY_PREFIX, UploadFile, UploadProgress};
