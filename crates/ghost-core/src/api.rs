//! HTTP client for the Ghost media and file-share API.
//!
//! Two calls matter to the client: `upload-file` stores one file and returns
//! its remote URL, and `generate-url` creates the share link from the form.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::form::ShareFailure;
use crate::models::{ShareRequest, ShareResponse, UploadResponse};
use crate::util::compact_text;

pub const UPLOAD_FILE_ROUTE: &str = "/api/media/upload-file/";
pub const GENERATE_URL_ROUTE: &str = "/api/file-share/generate-url/";

/// Errors returned by the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to construct HTTP client: {0}")]
    Client(String),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The backend rejected specific fields; first message per field.
    #[error("Request rejected with HTTP {status}: {}", summarize_fields(.errors))]
    Fields {
        status: u16,
        errors: BTreeMap<String, String>,
    },
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Upload task failed: {0}")]
    Task(String),
}

impl ApiError {
    /// Map onto the form's share failure handling.
    #[must_use]
    pub fn into_share_failure(self) -> ShareFailure {
        match self {
            Self::Fields { errors, .. } => ShareFailure::Fields(errors),
            other => ShareFailure::Generic(other.to_string()),
        }
    }
}

/// Remote operations the share session depends on.
#[async_trait]
pub trait ShareBackend: Send + Sync + 'static {
    /// Store one file and return its remote URL.
    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>)
        -> Result<UploadResponse, ApiError>;

    /// Create the share link.
    async fn generate_share_url(&self, request: &ShareRequest) -> Result<ShareResponse, ApiError>;
}

/// HTTP client for the Ghost API service.
#[derive(Debug, Clone)]
pub struct ShareApiClient {
    base_url: String,
    public_uploads: bool,
    client: reqwest::Client,
}

impl ShareApiClient {
    /// Builds a client from resolved configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|error| ApiError::Client(error.to_string()))?;
        Ok(Self {
            base_url: config.api_base_url.clone(),
            public_uploads: config.public_uploads,
            client,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client, shared with best-effort helpers like QR fetches.
    pub const fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Upload one file as multipart form data.
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        public: bool,
    ) -> Result<UploadResponse, ApiError> {
        let mime_type = mime_guess::from_path(file_name).first_or_octet_stream();
        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type.essence_str())?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("public", public.to_string());

        tracing::info!("API Request: POST {UPLOAD_FILE_ROUTE} ({file_name})");
        let response = self
            .client
            .post(self.url(UPLOAD_FILE_ROUTE))
            .multipart(form)
            .send()
            .await?;
        read_json(response, UPLOAD_FILE_ROUTE).await
    }

    /// Create a share link from the assembled request.
    pub async fn generate_share_url(
        &self,
        request: &ShareRequest,
    ) -> Result<ShareResponse, ApiError> {
        tracing::info!("API Request: POST {GENERATE_URL_ROUTE}");
        tracing::debug!(
            files = request.files.len(),
            has_message = request.message.is_some(),
            has_password = request.password.is_some(),
            max_views = ?request.max_views,
            expires_at = ?request.expires_at,
            timezone = ?request.timezone,
            "Generating share URL"
        );
        let response = self
            .client
            .post(self.url(GENERATE_URL_ROUTE))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;
        read_json(response, GENERATE_URL_ROUTE).await
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }
}

#[async_trait]
impl ShareBackend for ShareApiClient {
    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        Self::upload_file(self, file_name, bytes, self.public_uploads).await
    }

    async fn generate_share_url(&self, request: &ShareRequest) -> Result<ShareResponse, ApiError> {
        Self::generate_share_url(self, request).await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    route: &str,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    tracing::info!("API Response: {} {route}", status.as_u16());

    if !status.is_success() {
        tracing::warn!("API Response Error: {} {route}", status.as_u16());
        return Err(error_from_body(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Structured field errors when the body is a non-empty JSON object.
pub fn error_from_body(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => {
            let errors = map
                .into_iter()
                .map(|(key, value)| (key, first_message(value)))
                .collect();
            ApiError::Fields { status, errors }
        }
        _ => ApiError::Status {
            status,
            body: compact_text(body),
        },
    }
}

fn first_message(value: Value) -> String {
    match value {
        Value::Array(items) => items.into_iter().next().map_or_else(String::new, first_message),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn summarize_fields(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
