//! In-memory adapters for the task list ports.

mod blob;
mod journal;
mod store;

pub use blob::{BlobOperation, InMemoryBlobStore, PROGRESS_CHUNK_BYTES, StoredObject};
pub use journal::{RecordedCall, RequestJournal};
pub use store::{InMemoryTaskStore, StoreOperation};
