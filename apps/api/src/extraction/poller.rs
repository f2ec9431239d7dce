//! Polling state machine for a submitted extraction job.
//!
//! One unconditional initial delay, then at most `max_attempts` status checks spaced
//! by `interval`. Transport failures during a status check or a retrieve count as an
//! attempt and are otherwise ignored; everything else that is not "still working"
//! ends the loop.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::extraction::retrieve::extract_result_text;
use crate::extraction::{ExtractionError, ExtractionService, ExtractionStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            interval: Duration::from_secs(3),
            max_attempts: 40,
        }
    }
}

impl PollSettings {
    /// Nominal wait budget reported on timeout (attempts × interval).
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Transient view of one remote job, owned by a single `poll` call.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub handle: String,
    pub status: ExtractionStatus,
    pub attempts_made: u32,
}

impl ExtractionJob {
    fn new(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            status: ExtractionStatus::Submitted,
            attempts_made: 0,
        }
    }
}

pub async fn poll(
    service: &dyn ExtractionService,
    handle: &str,
    settings: &PollSettings,
) -> Result<String, ExtractionError> {
    let mut job = ExtractionJob::new(handle);

    info!("Waiting for extraction job {handle}...");
    sleep(settings.initial_delay).await;

    while job.attempts_made < settings.max_attempts {
        job.attempts_made += 1;

        match service.status(&job.handle).await {
            Ok(report) => {
                debug!(
                    "Attempt {}/{} - status: {:?}",
                    job.attempts_made, settings.max_attempts, report.status
                );
                job.status = report.status;

                match &job.status {
                    ExtractionStatus::Processed => {
                        info!("Extraction job {handle} processed, retrieving text");
                        match service.retrieve(&job.handle).await {
                            Ok(document) => {
                                let text = extract_result_text(&document)?;
                                info!("Extracted {} characters", text.len());
                                return Ok(text);
                            }
                            Err(e) if e.is_retryable() => {
                                warn!(
                                    "Retrieve failed (attempt {}/{}): {e}",
                                    job.attempts_made, settings.max_attempts
                                );
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    ExtractionStatus::Failed | ExtractionStatus::Error => {
                        let message = report.message.unwrap_or_else(|| "Unknown error".to_string());
                        return Err(ExtractionError::ProcessingFailed(message));
                    }
                    ExtractionStatus::Unknown(raw) => {
                        warn!("Unknown extraction status '{raw}' for job {handle}, retrying");
                    }
                    _ => {}
                }
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    "Status check failed (attempt {}/{}): {e}",
                    job.attempts_made, settings.max_attempts
                );
            }
            Err(e) => return Err(e),
        }

        if job.attempts_made < settings.max_attempts {
            sleep(settings.interval).await;
        }
    }

    job.status = ExtractionStatus::TimedOut;
    warn!(
        "Extraction job {handle} did not finish after {} attempts",
        job.attempts_made
    );
    Err(ExtractionError::Timeout {
        attempts: job.attempts_made,
        waited_secs: settings.budget().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{RetrievedDocument, StatusReport};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays fixed status and retrieve scripts. Once exhausted, status keeps
    /// answering "processing" and retrieve keeps returning `body`.
    struct ScriptedService {
        statuses: Mutex<VecDeque<Result<StatusReport, ExtractionError>>>,
        retrieves: Mutex<VecDeque<Result<RetrievedDocument, ExtractionError>>>,
        body: String,
        status_calls: AtomicU32,
        retrieve_calls: AtomicU32,
    }

    impl ScriptedService {
        fn new(statuses: Vec<Result<StatusReport, ExtractionError>>, body: &str) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                retrieves: Mutex::new(VecDeque::new()),
                body: body.to_string(),
                status_calls: AtomicU32::new(0),
                retrieve_calls: AtomicU32::new(0),
            }
        }

        fn with_retrieves(self, retrieves: Vec<Result<RetrievedDocument, ExtractionError>>) -> Self {
            *self.retrieves.lock().unwrap() = retrieves.into();
            self
        }
    }

    #[async_trait]
    impl ExtractionService for ScriptedService {
        async fn submit(&self, _bytes: Bytes, _filename: &str) -> Result<String, ExtractionError> {
            Ok("hash-1".to_string())
        }

        async fn status(&self, _handle: &str) -> Result<StatusReport, ExtractionError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(report("processing")))
        }

        async fn retrieve(&self, _handle: &str) -> Result<RetrievedDocument, ExtractionError> {
            self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
            self.retrieves
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RetrievedDocument { body: self.body.clone() }))
        }
    }

    fn report(status: &str) -> StatusReport {
        StatusReport {
            status: ExtractionStatus::from_remote(Some(status)),
            message: None,
        }
    }

    fn failed(message: &str) -> StatusReport {
        StatusReport {
            status: ExtractionStatus::Failed,
            message: Some(message.to_string()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_processed_returns_extracted_text() {
        let service = ScriptedService::new(
            vec![
                Ok(report("accepted")),
                Ok(report("processing")),
                Ok(report("processed")),
            ],
            r#"{"result_text": "Jane Doe - Senior Rust Engineer"}"#,
        );

        let text = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap();

        assert_eq!(text, "Jane Doe - Senior Rust Engineer");
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.retrieve_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_is_processing_failed() {
        let service = ScriptedService::new(
            vec![Ok(report("uploaded")), Ok(failed("corrupt pdf")), Ok(report("processed"))],
            "unused",
        );

        let err = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap_err();

        match err {
            ExtractionError::ProcessingFailed(msg) => assert_eq!(msg, "corrupt pdf"),
            other => panic!("expected ProcessingFailed, got {other:?}"),
        }
        assert_eq!(service.retrieve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_without_message_uses_default() {
        let service = ScriptedService::new(vec![Ok(report("error"))], "unused");

        let err = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Processing failed: Unknown error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_terminal_times_out_after_exactly_max_attempts() {
        let service = ScriptedService::new(vec![], "unused");
        let settings = PollSettings::default();
        let started = Instant::now();

        let err = poll(&service, "hash-1", &settings).await.unwrap_err();

        assert!(matches!(
            err,
            ExtractionError::Timeout {
                attempts: 40,
                waited_secs: 120
            }
        ));
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 40);
        // initial delay + 39 gaps between 40 checks
        assert_eq!(started.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_is_retried() {
        let service = ScriptedService::new(
            vec![Ok(report("warming_up")), Ok(report("processed"))],
            r#"{"result_text": "text"}"#,
        );

        let text = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap();

        assert_eq!(text, "text");
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_are_swallowed_and_counted() {
        let service = ScriptedService::new(
            vec![
                Err(ExtractionError::Transport("Network timeout. Please try again.".to_string())),
                Err(ExtractionError::Transport("Status check returned 503".to_string())),
                Ok(report("processed")),
            ],
            "plain text body",
        );

        let text = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap();

        assert_eq!(text, "plain text body");
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_exhaust_budget() {
        let statuses = (0..45)
            .map(|_| Err(ExtractionError::Transport("connection reset".to_string())))
            .collect();
        let service = ScriptedService::new(statuses, "unused");
        let settings = PollSettings {
            max_attempts: 5,
            ..PollSettings::default()
        };

        let err = poll(&service, "hash-1", &settings).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Timeout { attempts: 5, .. }));
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_protocol_error_is_fatal() {
        let service = ScriptedService::new(
            vec![Err(ExtractionError::Protocol(
                "Status API returned non-JSON response.".to_string(),
            ))],
            "unused",
        );

        let err = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Protocol(_)));
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrieve_failure_is_fatal() {
        let service = ScriptedService::new(vec![Ok(report("processed"))], "")
            .with_retrieves(vec![Err(ExtractionError::RemoteFailed(
                "Retrieve failed (500): boom".to_string(),
            ))]);

        let err = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Retrieve failed (500): boom");
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.retrieve_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrieve_network_error_is_retried_on_next_attempt() {
        let service = ScriptedService::new(
            vec![Ok(report("processed")), Ok(report("processed"))],
            r#"{"result_text": "ok"}"#,
        )
        .with_retrieves(vec![Err(ExtractionError::Transport(
            "Network timeout. Please try again.".to_string(),
        ))]);
        let started = Instant::now();

        let text = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap();

        assert_eq!(text, "ok");
        assert_eq!(service.status_calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.retrieve_calls.load(Ordering::SeqCst), 2);
        // initial delay + one interval after the failed retrieve
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrieve_network_errors_exhaust_budget() {
        let retrieves = (0..3)
            .map(|_| Err(ExtractionError::Transport("connection reset".to_string())))
            .collect();
        let service = ScriptedService::new(
            (0..3).map(|_| Ok(report("processed"))).collect(),
            r#"{"result_text": "never reached"}"#,
        )
        .with_retrieves(retrieves);
        let settings = PollSettings {
            max_attempts: 3,
            ..PollSettings::default()
        };

        let err = poll(&service, "hash-1", &settings).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Timeout { attempts: 3, .. }));
        assert_eq!(service.retrieve_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processed_with_empty_text_is_empty_extraction() {
        let service = ScriptedService::new(vec![Ok(report("processed"))], r#"{"result_text": ""}"#);

        let err = poll(&service, "hash-1", &PollSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::EmptyExtraction));
    }
}
