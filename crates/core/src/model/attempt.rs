use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::answer::Answer;
use crate::model::ids::QuestionId;

/// Screen the learner is on during an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptView {
    #[default]
    Question,
    Navigation,
    Summary,
}

/// Mutable state of one attempt: position, recorded answers and current view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttemptState {
    current_question_index: usize,
    answers: BTreeMap<QuestionId, Answer>,
    view: AttemptView,
}

impl AttemptState {
    /// A fresh attempt at the first question.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an attempt from persisted parts.
    ///
    /// Later answers for the same question replace earlier ones.
    #[must_use]
    pub fn from_parts(
        current_question_index: usize,
        answers: impl IntoIterator<Item = Answer>,
        view: AttemptView,
    ) -> Self {
        let answers = answers
            .into_iter()
            .map(|answer| (answer.question_id(), answer))
            .collect();
        Self {
            current_question_index,
            answers,
            view,
        }
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, Answer> {
        &self.answers
    }

    #[must_use]
    pub fn view(&self) -> AttemptView {
        self.view
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.current_question_index = index;
    }

    pub(crate) fn set_view(&mut self, view: AttemptView) {
        self.view = view;
    }

    /// Stores `answer`, replacing any previous answer to the same question.
    pub(crate) fn record(&mut self, answer: Answer) {
        self.answers.insert(answer.question_id(), answer);
    }
}
