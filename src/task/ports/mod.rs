//! Port contracts for the task list.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod blob;
pub mod store;

pub use blob::{BlobStore, BlobStoreError, BlobStoreResult, IgnoreProgress, TransferProgress};
pub use store::{TaskStore, TaskStoreError, TaskStoreResult};
