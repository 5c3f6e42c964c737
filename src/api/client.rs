//! HTTP implementation of the remote image service contract.
//!
//! Every request except the raw file download carries the session's bearer
//! credential; a 401 on any of them invalidates the session. Error bodies
//! are parsed as `{ "message": ... }` so the server-supplied text can be
//! surfaced to the user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::session::Session;
use crate::api::source::ImageSource;
use crate::api::types::{CurrentUser, ImageId, ImageListResponse, ImageRecord, UploadPayload};
use crate::error::SourceError;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the remote image service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origin of the service, without a trailing path.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Shape of the error body returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Extracts the server-supplied error message from a response body, if any.
fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
}

fn transport(err: reqwest::Error) -> SourceError {
    SourceError::Transport(err.to_string())
}

fn decode(err: reqwest::Error) -> SourceError {
    SourceError::Decode(err.to_string())
}

/// HTTP client for the remote image service.
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: Arc<Session>) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Attaches the bearer credential when the session has one.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetches the signed-in identity and caches it on the session.
    pub async fn refresh_identity(&self) -> Result<CurrentUser, SourceError> {
        let user = self.current_user().await?;
        self.session.set_user(user.clone());
        Ok(user)
    }

    /// Maps non-success statuses to [`SourceError`], invalidating the
    /// session on 401.
    async fn check(&self, response: Response) -> Result<Response, SourceError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("remote rejected the bearer credential");
            self.session.invalidate();
            return Err(SourceError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_error_message(&body);
            debug!(status = status.as_u16(), ?message, "request failed");
            return Err(SourceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ImageSource for ApiClient {
    async fn fetch_page(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ImageRecord>, SourceError> {
        let url = self.endpoint("/api/images");
        debug!(limit, offset, "fetching image page");
        let response = self
            .authorize(
                self.http
                    .get(&url)
                    .query(&[("limit", limit), ("offset", offset)]),
            )
            .send()
            .await
            .map_err(transport)?;
        let response = self.check(response).await?;
        let list: ImageListResponse = response.json().await.map_err(decode)?;
        Ok(list.images)
    }

    async fn fetch_record(&self, id: &ImageId) -> Result<ImageRecord, SourceError> {
        let url = self.endpoint(&format!("/api/images/{id}"));
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(transport)?;
        let response = self.check(response).await?;
        response.json().await.map_err(decode)
    }

    async fn upload(&self, payload: UploadPayload) -> Result<ImageRecord, SourceError> {
        let url = self.endpoint("/api/images");
        debug!(file = %payload.file_name, bytes = payload.bytes.len(), "uploading image");

        let file = Part::bytes(payload.bytes)
            .file_name(payload.file_name)
            .mime_str(&payload.mime_type)
            .map_err(transport)?;
        let mut form = Form::new().part("file", file);
        if let Some(title) = payload.title {
            form = form.text("title", title);
        }
        if let Some(description) = payload.description {
            form = form.text("description", description);
        }

        let response = self
            .authorize(self.http.post(&url).multipart(form))
            .send()
            .await
            .map_err(transport)?;
        let response = self.check(response).await?;
        response.json().await.map_err(decode)
    }

    async fn delete(&self, id: &ImageId) -> Result<(), SourceError> {
        let url = self.endpoint(&format!("/api/images/{id}"));
        let response = self
            .authorize(self.http.delete(&url))
            .send()
            .await
            .map_err(transport)?;
        self.check(response).await?;
        Ok(())
    }

    async fn fetch_file(&self, id: &ImageId) -> Result<Vec<u8>, SourceError> {
        // The file endpoint is publicly cacheable; no bearer header.
        let url = self.file_url(id);
        let response = self.http.get(&url).send().await.map_err(transport)?;
        let response = self.check(response).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    fn file_url(&self, id: &ImageId) -> String {
        self.endpoint(&format!("/api/images/{id}/file"))
    }

    async fn current_user(&self) -> Result<CurrentUser, SourceError> {
        let url = self.endpoint("/api/auth/me");
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(transport)?;
        let response = self.check(response).await?;
        response.json().await.map_err(decode)
    }
}
