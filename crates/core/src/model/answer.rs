use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("option {option_id} does not belong to question {question_id}")]
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
}

/// A checked answer to one question.
///
/// Built only through [`Answer::evaluate`], so `points_awarded` is always the
/// question's point value when correct and zero otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    question_id: QuestionId,
    selected_option_id: OptionId,
    is_correct: bool,
    points_awarded: u32,
}

impl Answer {
    /// Grade `selected` against `question`.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::UnknownOption` if `selected` is not one of the
    /// question's options.
    pub fn evaluate(question: &Question, selected: &OptionId) -> Result<Self, AnswerError> {
        let option = question
            .option(selected)
            .ok_or_else(|| AnswerError::UnknownOption {
                question_id: question.id(),
                option_id: selected.clone(),
            })?;

        let is_correct = option.is_correct();
        Ok(Self {
            question_id: question.id(),
            selected_option_id: selected.clone(),
            is_correct,
            points_awarded: if is_correct { question.point_value() } else { 0 },
        })
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn selected_option_id(&self) -> &OptionId {
        &self.selected_option_id
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn points_awarded(&self) -> u32 {
        self.points_awarded
    }
}
