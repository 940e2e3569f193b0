//! Storage gateway adapter for task attachments.

use async_trait::async_trait;
use futures::stream;
use reqwest::{
    Body, Client, Method, RequestBuilder, Response, StatusCode, Url,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use super::{endpoint, with_bearer};
use crate::task::{
    domain::{AttachmentKey, UploadFile},
    ports::{BlobStore, BlobStoreError, BlobStoreResult, TransferProgress},
};

/// Size of the body chunks streamed during an upload; progress is reported
/// once per chunk.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Serialize)]
struct PresignRequest<'a> {
    key: &'a str,
}

#[derive(Deserialize)]
struct PresignResponse {
    url: String,
}

/// Blob store backed by an HTTP storage gateway.
///
/// Objects live at `objects/{key}` relative to the gateway base URL, with
/// each `/`-separated key segment percent-encoded. URLs are obtained from
/// `POST presign` with a `{"key": ...}` body.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpBlobStore {
    /// Creates a store for the gateway rooted at `base_url`.
    #[must_use]
    pub const fn new(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            bearer_token: None,
        }
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn request<'a>(
        &self,
        method: Method,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> BlobStoreResult<RequestBuilder> {
        let url = endpoint(&self.base_url, segments).ok_or_else(|| {
            BlobStoreError::transport(std::io::Error::other(format!(
                "storage base URL cannot carry a path: {}",
                self.base_url
            )))
        })?;
        debug!(%method, %url, "blob store request");
        Ok(with_bearer(
            self.client.request(method, url),
            self.bearer_token.as_deref(),
        ))
    }

    fn object_request(
        &self,
        method: Method,
        key: &AttachmentKey,
    ) -> BlobStoreResult<RequestBuilder> {
        self.request(
            method,
            std::iter::once("objects").chain(key.as_str().split('/')),
        )
    }
}

async fn check_status(response: Response, key: &AttachmentKey) -> BlobStoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(BlobStoreError::NotFound(key.clone()));
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|err| format!("unreadable response body: {err}"));
    Err(BlobStoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Streams `file` in fixed-size chunks, sending the cumulative byte count
/// for each chunk as it is handed to the transport.
fn progress_body(file: &UploadFile, loaded_tx: mpsc::UnboundedSender<u64>) -> Body {
    let chunks: Vec<Vec<u8>> = file
        .bytes()
        .chunks(UPLOAD_CHUNK_BYTES)
        .map(<[u8]>::to_vec)
        .collect();
    let mut loaded = 0_u64;
    let body = stream::iter(chunks.into_iter().map(move |chunk| {
        loaded = loaded.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        // The receiver is gone once the request has resolved.
        loaded_tx.send(loaded).ok();
        Ok::<_, std::io::Error>(chunk)
    }));
    Body::wrap_stream(body)
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(
        &self,
        key: &AttachmentKey,
        file: &UploadFile,
        progress: &dyn TransferProgress,
    ) -> BlobStoreResult<()> {
        let total = file.len();
        let (loaded_tx, mut loaded_rx) = mpsc::unbounded_channel();
        let request = self
            .object_request(Method::PUT, key)?
            .header(CONTENT_TYPE, file.content_type())
            .header(CONTENT_LENGTH, total)
            .body(progress_body(file, loaded_tx))
            .send();
        tokio::pin!(request);

        let sent = loop {
            tokio::select! {
                Some(loaded) = loaded_rx.recv() => progress.report(loaded, total),
                sent = &mut request => break sent,
            }
        };
        while let Ok(loaded) = loaded_rx.try_recv() {
            progress.report(loaded, total);
        }

        check_status(sent.map_err(BlobStoreError::transport)?, key).await?;
        if file.is_empty() {
            progress.report(0, 0);
        }
        Ok(())
    }

    async fn url(&self, key: &AttachmentKey) -> BlobStoreResult<String> {
        let response = self
            .request(Method::POST, ["presign"])?
            .json(&PresignRequest { key: key.as_str() })
            .send()
            .await
            .map_err(BlobStoreError::transport)?;
        let presigned: PresignResponse = check_status(response, key)
            .await?
            .json()
            .await
            .map_err(BlobStoreError::transport)?;
        Ok(presigned.url)
    }

    async fn remove(&self, key: &AttachmentKey) -> BlobStoreResult<()> {
        let response = self
            .object_request(Method::DELETE, key)?
            .send()
            .await
            .map_err(BlobStoreError::transport)?;
        check_status(response, key).await.map(|_| ())
    }
}
