//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuizId;
use quiz_core::{ScoreReport, TransitionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::quiz_sessions::Award;

/// Errors emitted by the remote collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("quiz {0} was not found")]
    NotFound(QuizId),
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("score submission was rejected")]
    Rejected,
    #[error("remote service unavailable: {0}")]
    Unavailable(String),
    #[error("requested quiz {requested} but the service returned quiz {received}")]
    QuizIdMismatch { requested: QuizId, received: QuizId },
    #[error("quiz definition is invalid: {0}")]
    InvalidQuiz(#[from] quiz_core::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `AttemptFinalizer`.
///
/// Except for `NotReady`, the session is already in the summary view and the
/// report carries the locally computed score.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FinalizeError {
    #[error("score submission failed: {source}")]
    Submission {
        report: ScoreReport,
        #[source]
        source: RemoteError,
    },
    #[error("score settled but the stored attempt could not be cleared: {source}")]
    Storage {
        report: ScoreReport,
        award: Award,
        #[source]
        source: StorageError,
    },
    #[error("attempt is not ready to finalize: {0}")]
    NotReady(#[source] TransitionError),
}

impl FinalizeError {
    /// The local score, when the attempt reached the summary.
    #[must_use]
    pub fn report(&self) -> Option<&ScoreReport> {
        match self {
            FinalizeError::Submission { report, .. } | FinalizeError::Storage { report, .. } => {
                Some(report)
            }
            FinalizeError::NotReady(_) => None,
        }
    }
}

/// Errors emitted by `QuizSessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz {0} was not found")]
    QuizNotFound(QuizId),
    #[error("quiz {0} has no questions")]
    EmptyQuiz(QuizId),
    #[error("nothing to retry: the score was already handled")]
    NothingToRetry,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Finalize(#[from] FinalizeError),
    #[error(transparent)]
    Remote(RemoteError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<RemoteError> for SessionError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound(id) => SessionError::QuizNotFound(id),
            RemoteError::InvalidQuiz(quiz_core::Error::Quiz(quiz_core::model::QuizError::Empty(
                id,
            ))) => SessionError::EmptyQuiz(id),
            other => SessionError::Remote(other),
        }
    }
}

/// Errors emitted while reading configuration or bootstrapping services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("could not read quiz file {path}: {source}")]
    QuizFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
