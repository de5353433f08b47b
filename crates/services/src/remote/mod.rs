//! Boundary to the learning platform: quiz content, score awards, attempt history.

use async_trait::async_trait;
use serde::Serialize;

use quiz_core::model::{Quiz, QuizId, UserId};

use crate::error::RemoteError;

mod http;
mod memory;

pub use http::HttpLearningApi;
pub use memory::{InMemoryQuizCatalog, InMemoryScoreboard};

/// Body of a score award request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub user_id: UserId,
    pub points: u32,
    pub quiz_id: QuizId,
}

/// Source of quiz definitions.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    /// Fetch and validate a quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` for unknown ids, `RemoteError::InvalidQuiz`
    /// for definitions that fail validation, or a transport error.
    async fn fetch_quiz(&self, quiz_id: QuizId) -> Result<Quiz, RemoteError>;
}

/// Awards points for a finished attempt.
#[async_trait]
pub trait ScoreSubmitter: Send + Sync {
    /// Submit the score once. Implementations must not retry on their own.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Rejected` when the platform answers `success: false`,
    /// or a transport error.
    async fn submit_score(&self, submission: &ScoreSubmission) -> Result<(), RemoteError>;
}

/// Answers whether a user has attempted a quiz before.
#[async_trait]
pub trait AttemptHistory: Send + Sync {
    /// # Errors
    ///
    /// Returns `RemoteError` if the platform cannot be asked.
    async fn is_first_attempt(&self, user_id: &UserId, quiz_id: QuizId)
    -> Result<bool, RemoteError>;
}
