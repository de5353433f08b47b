use quiz_core::model::{AttemptView, OptionId, QuestionId, QuizId};
use quiz_core::{NavigationGrid, ScoreReport};

use super::service::{ActiveQuiz, SubmissionState};

/// Presentation-agnostic snapshot of a running attempt.
///
/// Plain data only: no pre-formatted strings and no localization, so any front
/// end can render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSnapshot {
    pub quiz_id: QuizId,
    pub title: String,
    pub running_points: u32,
    pub max_score: u32,
    pub screen: Screen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Question(QuestionScreen),
    Navigation(NavigationScreen),
    Summary(SummaryScreen),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionItem {
    pub id: OptionId,
    pub text: String,
    /// Pending selection, or the recorded choice once revealed.
    pub selected: bool,
    /// Correctness, only exposed once the question is revealed.
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionScreen {
    pub index: usize,
    pub total: usize,
    pub question_id: QuestionId,
    pub text: String,
    pub point_value: u32,
    pub options: Vec<OptionItem>,
    pub revealed: bool,
    /// Whether the recorded answer is correct, once revealed.
    pub answered_correctly: Option<bool>,
    pub can_check: bool,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub is_last: bool,
}

impl QuestionScreen {
    /// 1-based position shown to the learner.
    #[must_use]
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationScreen {
    pub grid: NavigationGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryScreen {
    pub report: ScoreReport,
    pub submission: SubmissionState,
}

impl AttemptSnapshot {
    #[must_use]
    pub fn of(active: &ActiveQuiz) -> Self {
        let session = active.session();
        let quiz = session.quiz();

        let screen = match session.view() {
            AttemptView::Question => Screen::Question(question_screen(active)),
            AttemptView::Navigation => Screen::Navigation(NavigationScreen {
                grid: session.grid(),
            }),
            AttemptView::Summary => Screen::Summary(SummaryScreen {
                report: session.score(),
                submission: active.submission(),
            }),
        };

        Self {
            quiz_id: quiz.id(),
            title: quiz.title().to_owned(),
            running_points: session.running_points(),
            max_score: quiz.max_score(),
            screen,
        }
    }
}

fn question_screen(active: &ActiveQuiz) -> QuestionScreen {
    let session = active.session();
    let question = session.current_question();
    let revealed = session.is_revealed();
    let selected = session.selected_option();

    let options = question
        .options()
        .iter()
        .map(|option| OptionItem {
            id: option.id().clone(),
            text: option.text().to_owned(),
            selected: selected == Some(option.id()),
            is_correct: revealed.then(|| option.is_correct()),
        })
        .collect();

    QuestionScreen {
        index: session.current_index(),
        total: session.quiz().question_count(),
        question_id: question.id(),
        text: question.text().to_owned(),
        point_value: question.point_value(),
        options,
        revealed,
        answered_correctly: session.current_answer().map(|a| a.is_correct()),
        can_check: !revealed && !session.is_finalized() && session.pending_selection().is_some(),
        can_advance: revealed || session.is_finalized(),
        can_retreat: session.current_index() > 0,
        is_last: session.is_last_question(),
    }
}
