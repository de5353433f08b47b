//! Pure scoring over a set of recorded answers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Answer, QuestionId, Quiz};

/// Score breakdown for an attempt, shown while in progress and on the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub correct_count: u32,
    pub total_questions: u32,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: u32,
}

impl ScoreReport {
    /// Score `answers` against `quiz`.
    ///
    /// Answers whose question is not part of `quiz` are ignored.
    #[must_use]
    pub fn compute(quiz: &Quiz, answers: &BTreeMap<QuestionId, Answer>) -> Self {
        let mut correct_count = 0_u32;
        let mut total_score = 0_u32;

        for answer in answers.values() {
            if quiz.question_by_id(answer.question_id()).is_none() {
                continue;
            }
            if answer.is_correct() {
                correct_count = correct_count.saturating_add(1);
            }
            total_score = total_score.saturating_add(answer.points_awarded());
        }

        let total_questions = u32::try_from(quiz.question_count()).unwrap_or(u32::MAX);

        Self {
            correct_count,
            total_questions,
            total_score,
            max_score: quiz.max_score(),
            percentage: percentage(correct_count, total_questions),
        }
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct_count == self.total_questions
    }
}

/// `round(100 * correct / total)`, rounding halves up. Zero when `total` is zero.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct);
    let total = u64::from(total);
    let rounded = (200 * correct + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Points collected so far, for the in-progress aggregate.
#[must_use]
pub fn running_points(answers: &BTreeMap<QuestionId, Answer>) -> u32 {
    answers
        .values()
        .fold(0_u32, |acc, a| acc.saturating_add(a.points_awarded()))
}
