//! REST collaborators backed by `reqwest`.
//!
//! [`HttpApi`] implements both [`UploadTransport`] (multipart upload with a
//! progress-reporting body) and [`StatusApi`] (job status requests).

use futures_util::future::BoxFuture;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use snaptrack_protocol::constants::{UPLOAD_FIELD, UPLOAD_PATH};
use snaptrack_protocol::paths::{join_url, results_path};
use snaptrack_protocol::{JobHandle, UploadRequest};
use snaptrack_transfer::{DEFAULT_CHUNK_SIZE, ProgressSink, progress_stream};
use snaptrack_tracker::{ApiError, StatusApi, UploadTransport};
use tracing::{debug, trace, warn};

use crate::error::ClientError;

/// Message used when a failed response carries nothing readable.
const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

/// HTTP client for the upload and status endpoints.
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    chunk_size: usize,
}

impl HttpApi {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = base_url.trim();
        let lower = base.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base.to_string()));
        }

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base.trim_end_matches('/').to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Sets the upload chunk size, which is also the progress granularity.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves `path` against the API base.
    pub fn resolve_url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn send(
        &self,
        method: &'static str,
        url: String,
        request: reqwest::RequestBuilder,
        authorization: Option<&str>,
    ) -> Result<Value, ApiError> {
        let request = match authorization {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        debug!(method, url = %url, "sending request");
        let resp = request.send().await.map_err(|e| {
            warn!(method, url = %url, error = %e, "request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!(
                method,
                url = %url,
                status = status.as_u16(),
                message = %message,
                "request failed"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        trace!(method, url = %url, status = status.as_u16(), len = body.len(), "response");
        Ok(parse_body(&body))
    }
}

impl UploadTransport for HttpApi {
    fn upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        authorization: Option<&'a str>,
        progress: ProgressSink,
    ) -> BoxFuture<'a, Result<Value, ApiError>> {
        Box::pin(async move {
            let url = self.resolve_url(UPLOAD_PATH);
            let stream = progress_stream(request.data().clone(), self.chunk_size, progress);
            let body = reqwest::Body::wrap_stream(stream);

            let mut part = Part::stream_with_length(body, request.len() as u64)
                .file_name(request.file_name().to_string());
            if let Some(content_type) = request.content_type() {
                part = part
                    .mime_str(content_type)
                    .map_err(|e| ApiError::Transport(format!("invalid content type: {e}")))?;
            }
            let form = Form::new().part(UPLOAD_FIELD, part);

            let builder = self.http.post(&url).multipart(form);
            self.send("POST", url, builder, authorization).await
        })
    }
}

impl StatusApi for HttpApi {
    fn job_status<'a>(
        &'a self,
        job: &'a JobHandle,
        authorization: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Value, ApiError>> {
        Box::pin(async move {
            let url = self.resolve_url(&results_path(job));
            let builder = self.http.get(&url);
            self.send("GET", url, builder, authorization).await
        })
    }
}

/// Parses a success body. Empty bodies become `null` and non-JSON text is
/// kept as a JSON string, so field lookups simply find nothing.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|e| {
        debug!(error = %e, "response body is not JSON");
        Value::String(body.to_string())
    })
}

/// Builds a readable message from a failed response body.
///
/// A JSON string is used as is, an object contributes its `message` or
/// `error` field, and plain text is used verbatim.
pub(crate) fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return FALLBACK_ERROR_MESSAGE.to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(s)) if !s.is_empty() => s,
        Ok(Value::Object(map)) => ["message", "error"]
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()),
        Ok(_) => FALLBACK_ERROR_MESSAGE.to_string(),
        Err(_) => trimmed.to_string(),
    }
}
