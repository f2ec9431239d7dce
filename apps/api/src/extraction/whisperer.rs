//! HTTP client for the LLMWhisperer v2 text extraction API.
//!
//! Response classification lives in free functions so it can be tested without a
//! server; the client methods only move bytes.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::extraction::{
    ExtractionError, ExtractionService, ExtractionStatus, RetrievedDocument, StatusReport,
};

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
const RETRIEVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed processing options: OCR-capable mode, layout-preserving output for LLM use.
/// `page_seperator` is spelled the way the API expects it.
const PROCESSING_OPTIONS: &[(&str, &str)] = &[
    ("mode", "high_quality"),
    ("output_mode", "layout_preserving"),
    ("page_seperator", "<<<"),
];

#[derive(Clone)]
pub struct WhispererClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WhispererClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, ExtractionError> {
        self.api_key.as_deref().ok_or(ExtractionError::NotConfigured)
    }

    /// Raw file bytes as the request body, not a multipart form.
    fn submit_request(&self, bytes: Bytes) -> Result<RequestBuilder, ExtractionError> {
        let api_key = self.api_key()?;

        Ok(self
            .client
            .post(format!("{}/whisper", self.base_url))
            .header("unstract-key", api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .query(PROCESSING_OPTIONS)
            .timeout(SUBMIT_TIMEOUT)
            .body(bytes))
    }
}

#[async_trait]
impl ExtractionService for WhispererClient {
    async fn submit(&self, bytes: Bytes, filename: &str) -> Result<String, ExtractionError> {
        let response = self.submit_request(bytes)?.send().await?;

        let (status, content_type, body) = read_response(response).await?;
        debug!("Submit of {filename} returned {status}");
        classify_submit_response(status, &content_type, &body)
    }

    async fn status(&self, handle: &str) -> Result<StatusReport, ExtractionError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/whisper-status", self.base_url))
            .header("unstract-key", api_key)
            .query(&[("whisper_hash", handle)])
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;

        let (status, content_type, body) = read_response(response).await?;
        classify_status_response(status, &content_type, &body)
    }

    async fn retrieve(&self, handle: &str) -> Result<RetrievedDocument, ExtractionError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/whisper-retrieve", self.base_url))
            .header("unstract-key", api_key)
            .query(&[("whisper_hash", handle)])
            .timeout(RETRIEVE_TIMEOUT)
            .send()
            .await?;

        let (status, _, body) = read_response(response).await?;
        classify_retrieve_response(status, body)
    }
}

async fn read_response(response: Response) -> Result<(u16, String, String), ExtractionError> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.text().await?;
    Ok((status, content_type, body))
}

/// Maps a submission response onto a job handle or a typed failure.
pub fn classify_submit_response(
    status: u16,
    content_type: &str,
    body: &str,
) -> Result<String, ExtractionError> {
    if content_type.contains("text/html") {
        return Err(ExtractionError::Auth(format!(
            "API returned HTML error. Status: {status}. Check your API key."
        )));
    }

    match status {
        401 => {
            return Err(ExtractionError::Auth(
                "Check your LLMWHISPERER_API_KEY.".to_string(),
            ))
        }
        402 => return Err(ExtractionError::QuotaExceeded),
        415 => return Err(ExtractionError::UnsupportedFormat),
        200 | 202 => {}
        _ => {
            return Err(ExtractionError::RemoteFailed(format!(
                "Upload failed ({status}): {}",
                remote_message(body)
            )))
        }
    }

    let value: Value = serde_json::from_str(body).map_err(|e| {
        ExtractionError::Protocol(format!("Failed to parse API response as JSON: {e}"))
    })?;

    value
        .get("whisper_hash")
        .and_then(|h| h.as_str())
        .filter(|h| !h.is_empty())
        .map(String::from)
        .ok_or_else(|| ExtractionError::Protocol(format!("No whisper_hash in response. Got: {value}")))
}

/// Non-200 answers and garbled JSON are transient; a 200 that is not JSON at all
/// means we are talking to the wrong thing and is fatal.
pub fn classify_status_response(
    status: u16,
    content_type: &str,
    body: &str,
) -> Result<StatusReport, ExtractionError> {
    if status != 200 {
        return Err(ExtractionError::Transport(format!(
            "Status check returned {status}"
        )));
    }

    if !content_type.contains("application/json") {
        return Err(ExtractionError::Protocol(
            "Status API returned non-JSON response.".to_string(),
        ));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::Transport(format!("Invalid status payload: {e}")))?;

    Ok(StatusReport {
        status: ExtractionStatus::from_remote(value.get("status").and_then(|s| s.as_str())),
        message: value
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from),
    })
}

pub fn classify_retrieve_response(
    status: u16,
    body: String,
) -> Result<RetrievedDocument, ExtractionError> {
    if status != 200 {
        return Err(ExtractionError::RemoteFailed(format!(
            "Retrieve failed ({status}): {}",
            remote_message(&body)
        )));
    }
    Ok(RetrievedDocument { body })
}

/// The `message` field of a JSON error body, or the first 200 characters of the body.
fn remote_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
