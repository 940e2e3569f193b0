//! Shared world state for task list BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use parking_lot::Mutex;
use rstest::fixture;
use taskdeck::identity::{adapters::StaticSession, domain::UserId};
use taskdeck::task::{
    adapters::memory::{InMemoryBlobStore, InMemoryTaskStore, RequestJournal},
    domain::{TaskId, UploadProgress},
    services::{OperationOutcome, TaskListController},
};

/// Base URL of resolved attachment links.
pub const BLOB_BASE_URL: &str = "https://blobs.test";

/// Controller type used by the BDD world.
pub type TestController = TaskListController<
    InMemoryTaskStore,
    InMemoryBlobStore<DefaultClock>,
    StaticSession,
    DefaultClock,
>;

/// Scenario world for task list behaviour tests.
pub struct TaskListWorld {
    pub journal: RequestJournal,
    pub store: Arc<InMemoryTaskStore>,
    pub blobs: Arc<InMemoryBlobStore<DefaultClock>>,
    pub controller: TestController,
    pub progress: Arc<Mutex<Vec<UploadProgress>>>,
    pub last_outcome: Option<OperationOutcome>,
}

impl TaskListWorld {
    /// Creates a world with empty stores and a signed-in user.
    #[must_use]
    pub fn new() -> Self {
        let journal = RequestJournal::new();
        let store = Arc::new(InMemoryTaskStore::with_journal(journal.clone()));
        let blobs = Arc::new(
            InMemoryBlobStore::with_journal(DefaultClock, journal.clone())
                .with_base_url(BLOB_BASE_URL),
        );
        let session = UserId::new("dana").map_or_else(
            |_| StaticSession::signed_out(),
            StaticSession::new,
        );
        let controller = TaskListController::new(
            Arc::clone(&store),
            Arc::clone(&blobs),
            Arc::new(session),
            Arc::new(DefaultClock),
        );
        Self {
            journal,
            store,
            blobs,
            controller,
            progress: Arc::new(Mutex::new(Vec::new())),
            last_outcome: None,
        }
    }
}

impl Default for TaskListWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskListWorld {
    TaskListWorld::default()
}

/// Parses a task id captured from a step.
///
/// # Errors
///
/// Returns an error when the captured id is blank.
pub fn task_id(raw: &str) -> Result<TaskId, eyre::Report> {
    TaskId::new(raw).map_err(|err| eyre::eyre!("invalid task id {raw:?}: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
