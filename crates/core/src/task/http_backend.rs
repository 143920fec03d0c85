//! HTTP document backend
//!
//! Talks to a REST document API:
//! - `GET    {base}/collections/tasks/documents?owner={id}`
//! - `POST   {base}/collections/tasks/documents`
//! - `GET|PATCH|DELETE {base}/collections/tasks/documents/{id}`
//!
//! Writes made through this client notify watchers immediately. Changes made
//! elsewhere are picked up by the poller started with [`HttpBackend::spawn_poller`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{Change, Document, DocumentBackend, Fields};
use crate::{Error, Result};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Serialize)]
struct WriteRequest<'a> {
    fields: &'a Fields,
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    changes: broadcast::Sender<Change>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;
        let (changes, _) = broadcast::channel(256);

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            timeout,
            changes,
        })
    }

    fn documents_url(&self) -> String {
        format!("{}/collections/tasks/documents", self.base_url)
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.documents_url(), urlencoding::encode(id))
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout)
            } else {
                Error::Network(e.to_string())
            }
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(&self, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Network(format!("Invalid response body: {}", e)))
    }

    fn notify(&self, document: &Document) {
        let _ = self.changes.send(Change::for_document(document));
    }

    /// Emit a refresh notification every `interval` so watchers re-query.
    ///
    /// Intervals below one millisecond are raised to one.
    pub fn spawn_poller(&self, interval: Duration) -> JoinHandle<()> {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let changes = self.changes.clone();
        info!("Polling {} every {:?}", self.base_url, interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let _ = changes.send(Change::everything());
            }
        })
    }
}

/// Map a non-success response status to an error kind
fn status_error(status: StatusCode, context: &str, body: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthenticated,
        StatusCode::FORBIDDEN => Error::PermissionDenied(context.to_string()),
        StatusCode::NOT_FOUND => Error::TaskNotFound(context.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            Error::Network(format!("{} timed out upstream", context))
        }
        _ => Error::Network(format!("{} returned {}: {}", context, status, body)),
    }
}

async fn check(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, context, body))
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<Document>> {
        let builder = self
            .request(Method::GET, self.documents_url())
            .query(&[("owner", owner_id)]);
        let response = check(self.send(builder).await?, "query").await?;
        let documents: Vec<Document> = self.decode(response).await?;
        debug!("Fetched {} documents for {}", documents.len(), owner_id);
        Ok(documents)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let response = self
            .send(self.request(Method::GET, self.document_url(id)))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response, id).await?;
        Ok(Some(self.decode(response).await?))
    }

    async fn insert(&self, fields: Fields) -> Result<Document> {
        let builder = self
            .request(Method::POST, self.documents_url())
            .json(&WriteRequest { fields: &fields });
        let response = check(self.send(builder).await?, "insert").await?;
        let document: Document = self.decode(response).await?;
        self.notify(&document);
        Ok(document)
    }

    async fn merge(&self, id: &str, fields: Fields) -> Result<Document> {
        let builder = self
            .request(Method::PATCH, self.document_url(id))
            .json(&WriteRequest { fields: &fields });
        let response = check(self.send(builder).await?, id).await?;
        let document: Document = self.decode(response).await?;
        self.notify(&document);
        Ok(document)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let response = self
            .send(self.request(Method::DELETE, self.document_url(id)))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response, id).await?;
        let _ = self.changes.send(Change::everything());
        Ok(true)
    }

    fn watch(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}
