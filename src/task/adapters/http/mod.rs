//! HTTP adapters for the task data service and the storage gateway.
//!
//! Both adapters share one [`reqwest::Client`] so connection pooling and the
//! request timeout are configured in a single place.

mod blob;
mod store;

pub use blob::{HttpBlobStore, UPLOAD_CHUNK_BYTES};
pub use store::HttpTaskStore;

use reqwest::{Client, RequestBuilder, Url};
use std::time::Duration;

/// Builds the HTTP client shared by the adapters.
///
/// # Errors
///
/// Returns the underlying `reqwest` error when the TLS backend cannot be
/// initialized.
pub fn build_client(request_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Appends path segments to `base`, percent-encoding each one.
///
/// Returns `None` when `base` cannot carry a path (e.g. `mailto:` URLs).
fn endpoint<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url)
}

fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}
