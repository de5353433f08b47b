use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::{Question, QuestionDraft};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz {0} has no questions")]
    Empty(QuizId),

    #[error("quiz {quiz_id} repeats question {question_id}")]
    DuplicateQuestion {
        quiz_id: QuizId,
        question_id: QuestionId,
    },
}

/// Which quiz flavor a definition belongs to.
///
/// The final quiz only awards points on the learner's first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizVariant {
    #[default]
    Module,
    Final,
}

impl QuizVariant {
    #[must_use]
    pub fn first_attempt_only(self) -> bool {
        matches!(self, QuizVariant::Final)
    }
}

/// Unvalidated wire shape of a quiz, as delivered by the content service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub id: QuizId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub variant: QuizVariant,
    pub questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    /// Validate every question, then the quiz itself.
    ///
    /// # Errors
    ///
    /// Returns `Error::Question` for the first invalid question, otherwise
    /// `Error::Quiz` under the rules of [`Quiz::new`].
    pub fn validate(self) -> Result<Quiz, crate::Error> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Quiz::new(self.id, self.title, self.variant, questions)?)
    }
}

impl TryFrom<QuizDraft> for Quiz {
    type Error = crate::Error;

    fn try_from(draft: QuizDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

/// An ordered, read-only quiz definition.
///
/// A `Quiz` always holds at least one question, so index `0` and
/// `last_index()` are valid for every instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QuizDraft")]
pub struct Quiz {
    id: QuizId,
    title: String,
    variant: QuizVariant,
    questions: Vec<Question>,
}

impl Quiz {
    /// Build a validated quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if `questions` is empty and
    /// `QuizError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        variant: QuizVariant,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty(id));
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestion {
                    quiz_id: id,
                    question_id: question.id(),
                });
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            variant,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn variant(&self) -> QuizVariant {
        self.variant
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.questions.len().saturating_sub(1)
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_by_id(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn index_of(&self, id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id() == id)
    }

    /// Highest score reachable in this quiz.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.questions
            .iter()
            .fold(0_u32, |acc, q| acc.saturating_add(q.point_value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::{AnswerOption, QuestionError};

    fn question(id: u64, points: u32) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec![
                AnswerOption::new("A", "yes", true),
                AnswerOption::new("B", "no", false),
            ],
            points,
        )
        .unwrap()
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = Quiz::new(QuizId::new(5), "Empty", QuizVariant::Module, Vec::new()).unwrap_err();
        assert_eq!(err, QuizError::Empty(QuizId::new(5)));
    }

    #[test]
    fn duplicate_questions_are_rejected() {
        let err = Quiz::new(
            QuizId::new(1),
            "Dupes",
            QuizVariant::Module,
            vec![question(1, 1), question(1, 1)],
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::DuplicateQuestion { .. }));
    }

    #[test]
    fn lookups_and_max_score() {
        let quiz = Quiz::new(
            QuizId::new(1),
            "Basics",
            QuizVariant::Final,
            vec![question(10, 2), question(20, 3)],
        )
        .unwrap();
        assert_eq!(quiz.last_index(), 1);
        assert_eq!(quiz.index_of(QuestionId::new(20)), Some(1));
        assert!(quiz.question_by_id(QuestionId::new(30)).is_none());
        assert_eq!(quiz.max_score(), 5);
        assert!(quiz.variant().first_attempt_only());
    }

    #[test]
    fn deserializes_remote_shape() {
        let json = r#"{
            "id": 3,
            "title": "Final exam",
            "variant": "final",
            "questions": [
                {"id": 1, "text": "Q1", "pointValue": 2, "options": [
                    {"id": "A", "text": "a", "isCorrect": true}
                ]}
            ]
        }"#;
        let quiz: Quiz = serde_json::from_str(json).unwrap();
        assert_eq!(quiz.variant(), QuizVariant::Final);
        assert_eq!(quiz.max_score(), 2);
    }

    #[test]
    fn deserializing_empty_quiz_fails() {
        let json = r#"{"id": 3, "questions": []}"#;
        assert!(serde_json::from_str::<Quiz>(json).is_err());

        let draft: QuizDraft = serde_json::from_str(json).unwrap();
        assert!(matches!(
            draft.validate(),
            Err(crate::Error::Quiz(QuizError::Empty(id))) if id == QuizId::new(3)
        ));
    }

    #[test]
    fn draft_reports_the_invalid_question() {
        let json = r#"{"id": 4, "questions": [
            {"id": 1, "text": "Q1", "options": [{"id": "A", "text": "a", "isCorrect": false}]}
        ]}"#;
        let draft: QuizDraft = serde_json::from_str(json).unwrap();
        assert!(matches!(
            draft.validate(),
            Err(crate::Error::Question(QuestionError::NoCorrectOption(_)))
        ));
    }
}
