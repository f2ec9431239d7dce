//! Document extraction: turns an uploaded resume into plain text through the
//! asynchronous LLMWhisperer service (submit → poll → retrieve).
//!
//! `ExtractionService` is the seam: `WhispererClient` talks HTTP, tests script the
//! remote side. The polling state machine in `poller` only ever sees the trait.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

pub mod poller;
pub mod retrieve;
pub mod whisperer;

pub use poller::{poll, PollSettings};
pub use whisperer::WhispererClient;

/// Every way an extraction can end without text. Only `Transport` (network
/// failures and unreadable status answers) is retried, and only while polling.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("LLMWHISPERER_API_KEY is not configured")]
    NotConfigured,

    #[error("Authentication failed. {0}")]
    Auth(String),

    #[error("Payment required. Your LLMWhisperer quota may be exhausted.")]
    QuotaExceeded,

    #[error("Unsupported media type. The extraction service doesn't accept this file format.")]
    UnsupportedFormat,

    #[error("Unexpected extraction service response: {0}")]
    Protocol(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Timeout: processing exceeded {waited_secs} seconds ({attempts} status checks)")]
    Timeout { attempts: u32, waited_secs: u64 },

    #[error("Extraction returned empty text.")]
    EmptyExtraction,

    /// The remote answered, but with a failure status outside the polling loop's
    /// tolerance (upload or retrieve rejected).
    #[error("{0}")]
    RemoteFailed(String),

    #[error("{0}")]
    Transport(String),
}

impl ExtractionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractionError::Transport(_))
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ExtractionError::Transport("Network timeout. Please try again.".to_string())
        } else {
            ExtractionError::Transport(format!("Network error: {e}"))
        }
    }
}

/// Lifecycle of a remote extraction job as reported by the status endpoint.
/// `Submitted` and `TimedOut` are local states the remote never sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    Submitted,
    Processing,
    Accepted,
    Uploaded,
    Processed,
    Failed,
    Error,
    Unknown(String),
    TimedOut,
}

impl ExtractionStatus {
    pub fn from_remote(raw: Option<&str>) -> Self {
        match raw {
            Some("processing") => ExtractionStatus::Processing,
            Some("accepted") => ExtractionStatus::Accepted,
            Some("uploaded") => ExtractionStatus::Uploaded,
            Some("processed") => ExtractionStatus::Processed,
            Some("failed") => ExtractionStatus::Failed,
            Some("error") => ExtractionStatus::Error,
            Some(other) => ExtractionStatus::Unknown(other.to_string()),
            None => ExtractionStatus::Unknown(String::new()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExtractionStatus::Processed
                | ExtractionStatus::Failed
                | ExtractionStatus::Error
                | ExtractionStatus::TimedOut
        )
    }
}

/// One sample of the status endpoint.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub status: ExtractionStatus,
    pub message: Option<String>,
}

/// Raw body of a successful retrieve call. Interpreted by `retrieve::extract_result_text`.
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    pub body: String,
}

#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Uploads the document and returns the remote job handle.
    async fn submit(&self, bytes: Bytes, filename: &str) -> Result<String, ExtractionError>;

    async fn status(&self, handle: &str) -> Result<StatusReport, ExtractionError>;

    async fn retrieve(&self, handle: &str) -> Result<RetrievedDocument, ExtractionError>;
}

/// Submits `bytes` and waits for the extracted text.
pub async fn extract_text(
    service: &dyn ExtractionService,
    bytes: Bytes,
    filename: &str,
    settings: &PollSettings,
) -> Result<String, ExtractionError> {
    info!("Uploading {filename} for extraction ({} bytes)", bytes.len());
    let handle = service.submit(bytes, filename).await?;
    info!("Extraction job accepted: {handle}");
    poll(service, &handle, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_known_values() {
        assert_eq!(
            ExtractionStatus::from_remote(Some("processed")),
            ExtractionStatus::Processed
        );
        assert_eq!(
            ExtractionStatus::from_remote(Some("accepted")),
            ExtractionStatus::Accepted
        );
        assert_eq!(
            ExtractionStatus::from_remote(Some("error")),
            ExtractionStatus::Error
        );
    }

    #[test]
    fn test_status_parsing_unknown_keeps_raw_value() {
        assert_eq!(
            ExtractionStatus::from_remote(Some("queued_for_gpu")),
            ExtractionStatus::Unknown("queued_for_gpu".to_string())
        );
        assert!(!ExtractionStatus::from_remote(None).is_terminal());
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        assert!(ExtractionError::Transport("reset".to_string()).is_retryable());
        assert!(!ExtractionError::QuotaExceeded.is_retryable());
        assert!(!ExtractionError::Protocol("html".to_string()).is_retryable());
        assert!(!ExtractionError::RemoteFailed("Retrieve failed (500)".to_string()).is_retryable());
    }

    #[test]
    fn test_timeout_message_mentions_budget() {
        let err = ExtractionError::Timeout {
            attempts: 40,
            waited_secs: 120,
        };
        assert!(err.to_string().contains("120 seconds"));
    }
}
