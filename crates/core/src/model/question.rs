use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {0} has no text")]
    EmptyText(QuestionId),

    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {0} has no correct option")]
    NoCorrectOption(QuestionId),

    #[error("question {question_id} repeats option {option_id}")]
    DuplicateOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// One selectable answer of a multiple-choice or true/false question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    id: OptionId,
    text: String,
    is_correct: bool,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: impl Into<OptionId>, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_correct,
        }
    }

    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Points a question is worth when the definition does not say otherwise.
pub const DEFAULT_POINT_VALUE: u32 = 1;

fn default_point_value() -> u32 {
    DEFAULT_POINT_VALUE
}

/// Unvalidated wire shape of a question, as delivered by the content service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<AnswerOption>,
    #[serde(default = "default_point_value")]
    pub point_value: u32,
}

impl QuestionDraft {
    /// Validate the draft into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` under the same rules as [`Question::new`].
    pub fn validate(self) -> Result<Question, QuestionError> {
        Question::new(self.id, self.text, self.options, self.point_value)
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

/// A single quiz question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<AnswerOption>,
    point_value: u32,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are no options, no option
    /// is marked correct, or two options share an id.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        point_value: u32,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText(id));
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions(id));
        }
        if !options.iter().any(AnswerOption::is_correct) {
            return Err(QuestionError::NoCorrectOption(id));
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.id()) {
                return Err(QuestionError::DuplicateOption {
                    question_id: id,
                    option_id: option.id().clone(),
                });
            }
        }

        Ok(Self {
            id,
            text,
            options,
            point_value,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn point_value(&self) -> u32 {
        self.point_value
    }

    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.id() == id)
    }

    /// Options marked correct, in display order.
    pub fn correct_options(&self) -> impl Iterator<Item = &AnswerOption> {
        self.options.iter().filter(|option| option.is_correct())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
