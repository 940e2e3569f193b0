//! REST adapter for the task data service.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use super::{endpoint, with_bearer};
use crate::task::{
    domain::{TaskContent, TaskId, TaskPatch, TaskRecord, TaskStats},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

#[derive(Serialize)]
struct CreateTaskBody<'a> {
    content: &'a str,
}

/// Task store backed by the REST task API.
///
/// Endpoints are resolved relative to the API base URL: `tasks`,
/// `tasks/{id}` and `stats`.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpTaskStore {
    /// Creates a store for the API rooted at `base_url`.
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
    ) -> TaskStoreResult<RequestBuilder> {
        let url = endpoint(&self.base_url, segments).ok_or_else(|| {
            TaskStoreError::Malformed(format!(
                "API base URL cannot carry a path: {}",
                self.base_url
            ))
        })?;
        debug!(%method, %url, "task store request");
        Ok(with_bearer(
            self.client.request(method, url),
            self.bearer_token.as_deref(),
        ))
    }
}

async fn send(request: RequestBuilder) -> TaskStoreResult<Response> {
    request.send().await.map_err(TaskStoreError::transport)
}

/// Converts non-success statuses into store errors.
async fn check_status(response: Response, id: Option<&TaskId>) -> TaskStoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(task_id)) = (status, id) {
        return Err(TaskStoreError::NotFound(task_id.clone()));
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|err| format!("unreadable response body: {err}"));
    Err(TaskStoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    id: Option<&TaskId>,
) -> TaskStoreResult<T> {
    check_status(response, id)
        .await?
        .json::<T>()
        .await
        .map_err(|err| TaskStoreError::Malformed(err.to_string()))
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self) -> TaskStoreResult<Vec<TaskRecord>> {
        let response = send(self.request(Method::GET, ["tasks"])?).await?;
        read_json(response, None).await
    }

    async fn get(&self, id: &TaskId) -> TaskStoreResult<TaskRecord> {
        let response = send(self.request(Method::GET, ["tasks", id.as_str()])?).await?;
        read_json(response, Some(id)).await
    }

    async fn create(&self, content: &TaskContent) -> TaskStoreResult<TaskRecord> {
        let body = CreateTaskBody {
            content: content.as_str(),
        };
        let response = send(self.request(Method::POST, ["tasks"])?.json(&body)).await?;
        read_json(response, None).await
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskStoreResult<TaskRecord> {
        let response =
            send(self.request(Method::PUT, ["tasks", id.as_str()])?.json(patch)).await?;
        read_json(response, Some(id)).await
    }

    async fn delete(&self, id: &TaskId) -> TaskStoreResult<()> {
        let response = send(self.request(Method::DELETE, ["tasks", id.as_str()])?).await?;
        check_status(response, Some(id)).await.map(|_| ())
    }

    async fn stats(&self) -> TaskStoreResult<TaskStats> {
        let response = send(self.request(Method::GET, ["stats"])?).await?;
        read_json(response, None).await
    }
}
