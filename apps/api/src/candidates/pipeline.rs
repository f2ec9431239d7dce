//! Resume processing pipeline: extract → score → build record.
//!
//! The returned record is always persistable. Extraction failures become
//! `status=error` records, scoring failures become degraded `status=success` ones.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::analysis::scorer::MatchScorer;
use crate::candidates::record::{build_candidate_record, CandidateRecord};
use crate::extraction::{extract_text, ExtractionService, PollSettings};
use crate::jobs::models::Job;

#[derive(Clone)]
pub struct ResumePipeline {
    extractor: Arc<dyn ExtractionService>,
    scorer: Arc<dyn MatchScorer>,
    poll: PollSettings,
}

impl ResumePipeline {
    pub fn new(
        extractor: Arc<dyn ExtractionService>,
        scorer: Arc<dyn MatchScorer>,
        poll: PollSettings,
    ) -> Self {
        Self {
            extractor,
            scorer,
            poll,
        }
    }

    pub async fn submit_resume_for_scoring(
        &self,
        bytes: Bytes,
        filename: &str,
        job: &Job,
    ) -> CandidateRecord {
        let outcome = extract_text(self.extractor.as_ref(), bytes, filename, &self.poll).await;

        let match_result = match &outcome {
            Ok(text) => {
                info!("Extracted {} chars. Running AI analysis...", text.len());
                Some(self.scorer.score(text, job).await)
            }
            Err(e) => {
                warn!("Extraction failed for {filename}: {e}");
                None
            }
        };

        build_candidate_record(&outcome, match_result, job, filename)
    }
}
