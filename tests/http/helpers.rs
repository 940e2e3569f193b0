//! Shared helpers for HTTP adapter tests.

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Url;
use taskdeck::task::{
    adapters::http::{HttpBlobStore, HttpTaskStore, build_client},
    ports::TransferProgress,
};
use wiremock::MockServer;

/// Bearer token configured on every adapter built here.
pub const TOKEN: &str = "test-token";

/// Expected `Authorization` header value.
pub const BEARER: &str = "Bearer test-token";

/// Returns `{server}/{prefix}/` as a base URL.
///
/// # Panics
///
/// Panics if the mock server URI does not parse.
pub fn base_url(server: &MockServer, prefix: &str) -> Url {
    Url::parse(&format!("{}/{prefix}/", server.uri())).expect("mock server URI parses")
}

/// Task store rooted at `{server}/api/`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
pub fn task_store(server: &MockServer) -> HttpTaskStore {
    let client = build_client(Duration::from_secs(5)).expect("HTTP client builds");
    HttpTaskStore::new(client, base_url(server, "api")).with_bearer_token(TOKEN)
}

/// Blob store rooted at `{server}/storage/`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
pub fn blob_store(server: &MockServer) -> HttpBlobStore {
    let client = build_client(Duration::from_secs(5)).expect("HTTP client builds");
    HttpBlobStore::new(client, base_url(server, "storage")).with_bearer_token(TOKEN)
}

/// Records every progress report.
#[derive(Default)]
pub struct RecordedProgress {
    reports: Mutex<Vec<(u64, u64)>>,
}

impl RecordedProgress {
    /// Returns the reports received so far.
    pub fn reports(&self) -> Vec<(u64, u64)> {
        self.reports.lock().clone()
    }
}

impl TransferProgress for RecordedProgress {
    fn report(&self, loaded: u64, total: u64) {
        self.reports.lock().push((loaded, total));
    }
}
