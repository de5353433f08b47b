//! Serialized form of an in-progress attempt.
//!
//! The current record is a versioned JSON object. A bare JSON list of answers,
//! the format older clients wrote, is still accepted on read.

use chrono::{DateTime, Utc};
use quiz_core::model::{Answer, AttemptState, AttemptView};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written by [`encode`]. Records with a newer version are not read.
pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("malformed attempt record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported attempt record version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttemptRecord {
    version: u32,
    saved_at: DateTime<Utc>,
    current_question_index: usize,
    #[serde(default)]
    view: AttemptView,
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredPayload {
    Record(AttemptRecord),
    Legacy(Vec<Answer>),
}

/// Serialize `state` into the current record format.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn encode(state: &AttemptState, saved_at: DateTime<Utc>) -> Result<String, serde_json::Error> {
    let record = AttemptRecord {
        version: RECORD_VERSION,
        saved_at,
        current_question_index: state.current_question_index(),
        view: state.view(),
        answers: state.answers().values().cloned().collect(),
    };
    serde_json::to_string(&record)
}

/// Parse a stored payload back into an attempt.
///
/// # Errors
///
/// Returns `DecodeError` if the payload is not a known record shape.
pub fn decode(raw: &str) -> Result<AttemptState, DecodeError> {
    match serde_json::from_str::<StoredPayload>(raw)? {
        StoredPayload::Record(record) => {
            if record.version > RECORD_VERSION {
                return Err(DecodeError::UnsupportedVersion(record.version));
            }
            Ok(AttemptState::from_parts(
                record.current_question_index,
                record.answers,
                record.view,
            ))
        }
        StoredPayload::Legacy(answers) => {
            // Legacy lists carry no position; resume after the last answer.
            let index = answers.len();
            Ok(AttemptState::from_parts(index, answers, AttemptView::Question))
        }
    }
}
