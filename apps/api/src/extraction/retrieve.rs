//! Pulls the extracted text out of a retrieve response.
//!
//! The service is inconsistent about where the text lives, so a fixed list of
//! extractors is tried in order and the first non-empty result wins.

use serde_json::Value;
use tracing::debug;

use crate::extraction::{ExtractionError, RetrievedDocument};

/// `json` is the parsed body, `None` when the body is not JSON.
type TextExtractor = fn(&RetrievedDocument, Option<&Value>) -> Option<String>;

const TEXT_EXTRACTORS: &[(&str, TextExtractor)] = &[
    ("result_text", top_level_result_text),
    ("extraction.result_text", nested_result_text),
    ("plain_body", plain_body),
];

pub fn extract_result_text(document: &RetrievedDocument) -> Result<String, ExtractionError> {
    let json = serde_json::from_str::<Value>(&document.body).ok();

    for (name, extractor) in TEXT_EXTRACTORS {
        if let Some(text) = extractor(document, json.as_ref()) {
            debug!("Extracted {} characters via {name}", text.len());
            return Ok(text);
        }
    }

    Err(ExtractionError::EmptyExtraction)
}

fn top_level_result_text(_: &RetrievedDocument, json: Option<&Value>) -> Option<String> {
    non_empty(json?.get("result_text")?.as_str()?)
}

fn nested_result_text(_: &RetrievedDocument, json: Option<&Value>) -> Option<String> {
    non_empty(json?.get("extraction")?.get("result_text")?.as_str()?)
}

/// Some deployments answer with the text itself rather than a JSON envelope.
fn plain_body(document: &RetrievedDocument, json: Option<&Value>) -> Option<String> {
    match json {
        Some(_) => None,
        None => non_empty(&document.body),
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
