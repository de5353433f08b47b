//! Question grid for jumping to any question regardless of linear progress.

use crate::model::{AttemptState, QuestionId, Quiz};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Unanswered,
    Correct,
    Incorrect,
}

/// One entry of the navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub index: usize,
    pub question_id: QuestionId,
    pub status: CellStatus,
    pub is_current: bool,
}

impl GridCell {
    /// 1-based position shown to the learner.
    #[must_use]
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationGrid {
    cells: Vec<GridCell>,
}

impl NavigationGrid {
    #[must_use]
    pub fn build(quiz: &Quiz, state: &AttemptState) -> Self {
        let cells = quiz
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let status = match state.answer_for(question.id()) {
                    None => CellStatus::Unanswered,
                    Some(answer) if answer.is_correct() => CellStatus::Correct,
                    Some(_) => CellStatus::Incorrect,
                };
                GridCell {
                    index,
                    question_id: question.id(),
                    status,
                    is_current: index == state.current_question_index(),
                }
            })
            .collect();
        Self { cells }
    }

    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Every index in the grid is a valid jump target.
    #[must_use]
    pub fn can_jump_to(&self, index: usize) -> bool {
        index < self.cells.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.status != CellStatus::Unanswered)
            .count()
    }

    #[must_use]
    pub fn first_unanswered(&self) -> Option<usize> {
        self.cells
            .iter()
            .find(|c| c.status == CellStatus::Unanswered)
            .map(|c| c.index)
    }

    /// Cells split into rows of `width` for display. A zero width is treated as one.
    pub fn rows(&self, width: usize) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(width.max(1))
    }
}
