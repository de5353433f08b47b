use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use quiz_core::model::{Quiz, QuizDraft, QuizId, UserId};

use super::{AttemptHistory, QuizCatalog, ScoreSubmission, ScoreSubmitter};
use crate::error::{ConfigError, RemoteError};

#[derive(Deserialize)]
#[serde(untagged)]
enum QuizFile {
    One(QuizDraft),
    Many(Vec<QuizDraft>),
}

/// Catalog of quizzes held in memory, typically loaded from a JSON file.
#[derive(Clone, Debug, Default)]
pub struct InMemoryQuizCatalog {
    quizzes: HashMap<QuizId, Quiz>,
}

impl InMemoryQuizCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quiz(mut self, quiz: Quiz) -> Self {
        self.quizzes.insert(quiz.id(), quiz);
        self
    }

    /// Parse one quiz object or a list of them.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Decode` for malformed JSON and `RemoteError::InvalidQuiz`
    /// for definitions that fail validation.
    pub fn from_json_str(raw: &str) -> Result<Self, RemoteError> {
        let drafts = match serde_json::from_str::<QuizFile>(raw)? {
            QuizFile::One(draft) => vec![draft],
            QuizFile::Many(drafts) => drafts,
        };
        drafts
            .into_iter()
            .try_fold(Self::new(), |catalog, draft| -> Result<Self, RemoteError> {
                Ok(catalog.with_quiz(draft.validate()?))
            })
    }

    /// Load quizzes from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::QuizFile` if the file cannot be read, or
    /// `ConfigError::Remote` if its contents are not valid quizzes.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::QuizFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_json_str(&raw)?)
    }

    /// Ids of every quiz in the catalog, ascending.
    #[must_use]
    pub fn quiz_ids(&self) -> Vec<QuizId> {
        let mut ids: Vec<QuizId> = self.quizzes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl QuizCatalog for InMemoryQuizCatalog {
    async fn fetch_quiz(&self, quiz_id: QuizId) -> Result<Quiz, RemoteError> {
        self.quizzes
            .get(&quiz_id)
            .cloned()
            .ok_or(RemoteError::NotFound(quiz_id))
    }
}

/// Local stand-in for the score service when no remote API is configured.
///
/// Accepts every submission and treats a quiz as attempted once a score for it
/// has been recorded.
#[derive(Clone, Debug, Default)]
pub struct InMemoryScoreboard {
    submissions: Arc<Mutex<Vec<ScoreSubmission>>>,
}

impl InMemoryScoreboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every submission received so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Unavailable` if the lock is poisoned.
    pub fn submissions(&self) -> Result<Vec<ScoreSubmission>, RemoteError> {
        let guard = self
            .submissions
            .lock()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl ScoreSubmitter for InMemoryScoreboard {
    async fn submit_score(&self, submission: &ScoreSubmission) -> Result<(), RemoteError> {
        let mut guard = self
            .submissions
            .lock()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        guard.push(submission.clone());
        Ok(())
    }
}

#[async_trait]
impl AttemptHistory for InMemoryScoreboard {
    async fn is_first_attempt(
        &self,
        user_id: &UserId,
        quiz_id: QuizId,
    ) -> Result<bool, RemoteError> {
        let guard = self
            .submissions
            .lock()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        Ok(!guard
            .iter()
            .any(|s| &s.user_id == user_id && s.quiz_id == quiz_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIZZES: &str = r#"[
        {"id": 1, "title": "One", "questions": [
            {"id": 1, "text": "Q", "options": [{"id": "A", "text": "a", "isCorrect": true}]}
        ]},
        {"id": 2, "title": "Two", "variant": "final", "questions": [
            {"id": 1, "text": "Q", "options": [{"id": "A", "text": "a", "isCorrect": true}]}
        ]}
    ]"#;

    #[tokio::test]
    async fn catalog_serves_parsed_quizzes() {
        let catalog = InMemoryQuizCatalog::from_json_str(QUIZZES).unwrap();
        assert_eq!(catalog.quiz_ids(), vec![QuizId::new(1), QuizId::new(2)]);

        let quiz = catalog.fetch_quiz(QuizId::new(2)).await.unwrap();
        assert_eq!(quiz.title(), "Two");
        assert!(matches!(
            catalog.fetch_quiz(QuizId::new(3)).await,
            Err(RemoteError::NotFound(_))
        ));
    }

    #[test]
    fn catalog_accepts_single_object_and_rejects_invalid() {
        let single = r#"{"id": 4, "questions": [
            {"id": 1, "text": "Q", "options": [{"id": "A", "text": "a", "isCorrect": true}]}
        ]}"#;
        assert_eq!(
            InMemoryQuizCatalog::from_json_str(single).unwrap().quiz_ids(),
            vec![QuizId::new(4)]
        );

        let empty = r#"{"id": 4, "questions": []}"#;
        assert!(matches!(
            InMemoryQuizCatalog::from_json_str(empty),
            Err(RemoteError::InvalidQuiz(_))
        ));
    }

    #[tokio::test]
    async fn scoreboard_tracks_first_attempts_per_user() {
        let board = InMemoryScoreboard::new();
        let user = UserId::new("u-1");
        assert!(board.is_first_attempt(&user, QuizId::new(1)).await.unwrap());

        board
            .submit_score(&ScoreSubmission {
                user_id: user.clone(),
                points: 2,
                quiz_id: QuizId::new(1),
            })
            .await
            .unwrap();

        assert!(!board.is_first_attempt(&user, QuizId::new(1)).await.unwrap());
        assert!(
            board
                .is_first_attempt(&UserId::new("u-2"), QuizId::new(1))
                .await
                .unwrap()
        );
        assert_eq!(board.submissions().unwrap().len(), 1);
    }
}
