//! Quiz session state machine.
//!
//! `QuizSession` owns the state of one attempt. Every transition is a method
//! returning the [`Effect`] its orchestrator must run (persist, finalize, reset)
//! so the machine itself stays free of I/O.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{Answer, AttemptState, AttemptView, OptionId, Question, QuestionId, Quiz};
use crate::navigation::NavigationGrid;
use crate::scoring::{self, ScoreReport};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("cannot {command} while in the {view:?} view")]
    WrongView {
        command: &'static str,
        view: AttemptView,
    },

    #[error("question {0} is already checked; selection is locked")]
    Locked(QuestionId),

    #[error("question {0} is already checked")]
    AlreadyRevealed(QuestionId),

    #[error("question {0} must be checked before moving on")]
    NotRevealed(QuestionId),

    #[error("already at the first question")]
    AtFirstQuestion,

    #[error("question index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("option {option_id} does not belong to question {question_id}")]
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
    },

    #[error("the attempt can only be completed from a checked last question")]
    NotReadyToComplete,

    #[error("the attempt is already finalized")]
    AlreadyFinalized,
}

//
// ─── COMMANDS & EFFECTS ────────────────────────────────────────────────────────
//

/// User intents understood by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SelectOption(OptionId),
    CheckAnswer,
    Advance,
    Retreat,
    OpenNavigation,
    CloseNavigation,
    JumpTo(usize),
    Retake,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Nothing outside the session changed.
    None,
    /// Answers changed; write the attempt to the store.
    Persist,
    /// The last question was completed; run the finalizer.
    Finalize,
    /// The attempt was restarted; clear the stored attempt.
    Reset,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
pub struct QuizSession {
    quiz: Arc<Quiz>,
    state: AttemptState,
    pending: Option<OptionId>,
    navigation_origin: AttemptView,
    finalized: bool,
}

impl QuizSession {
    /// Start an empty attempt at the first question.
    #[must_use]
    pub fn new(quiz: Arc<Quiz>) -> Self {
        Self {
            quiz,
            state: AttemptState::new(),
            pending: None,
            navigation_origin: AttemptView::Question,
            finalized: false,
        }
    }

    /// Resume a stored attempt against the current quiz definition.
    ///
    /// Answers to questions or options that no longer exist are dropped and the
    /// rest are re-graded, the index is clamped into range, and the session always
    /// resumes on the `Question` view.
    #[must_use]
    pub fn restore(quiz: Arc<Quiz>, stored: &AttemptState) -> Self {
        let answers: Vec<Answer> = stored
            .answers()
            .values()
            .filter_map(|answer| {
                let question = quiz.question_by_id(answer.question_id())?;
                Answer::evaluate(question, answer.selected_option_id()).ok()
            })
            .collect();
        let index = stored.current_question_index().min(quiz.last_index());
        let state = AttemptState::from_parts(index, answers, AttemptView::Question);

        Self {
            quiz,
            state,
            pending: None,
            navigation_origin: AttemptView::Question,
            finalized: false,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &Arc<Quiz> {
        &self.quiz
    }

    #[must_use]
    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    #[must_use]
    pub fn view(&self) -> AttemptView {
        self.state.view()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.state.current_question_index()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // The index is kept within `0..=last_index()` and a quiz is never empty.
        &self.quiz.questions()[self.current_index()]
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current_index() == self.quiz.last_index()
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<&Answer> {
        self.state.answer_for(self.current_question().id())
    }

    /// A question is revealed once it has a checked answer.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.current_answer().is_some()
    }

    #[must_use]
    pub fn pending_selection(&self) -> Option<&OptionId> {
        self.pending.as_ref()
    }

    /// The option to highlight: the checked answer if revealed, else the pending pick.
    #[must_use]
    pub fn selected_option(&self) -> Option<&OptionId> {
        self.current_answer()
            .map(Answer::selected_option_id)
            .or(self.pending.as_ref())
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    #[must_use]
    pub fn score(&self) -> ScoreReport {
        ScoreReport::compute(&self.quiz, self.state.answers())
    }

    #[must_use]
    pub fn running_points(&self) -> u32 {
        scoring::running_points(self.state.answers())
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, Answer> {
        self.state.answers()
    }

    #[must_use]
    pub fn grid(&self) -> NavigationGrid {
        NavigationGrid::build(&self.quiz, &self.state)
    }

    /// Dispatch a command to the matching transition.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` when the command is not valid in the current state.
    pub fn apply(&mut self, command: SessionCommand) -> Result<Effect, TransitionError> {
        match command {
            SessionCommand::SelectOption(option) => self.select_option(option),
            SessionCommand::CheckAnswer => self.check_answer(),
            SessionCommand::Advance => self.advance(),
            SessionCommand::Retreat => self.retreat(),
            SessionCommand::OpenNavigation => self.open_navigation(),
            SessionCommand::CloseNavigation => self.close_navigation(),
            SessionCommand::JumpTo(index) => self.jump_to(index),
            SessionCommand::Retake => self.retake(),
        }
    }

    /// Remember a pending choice for the current question.
    ///
    /// # Errors
    ///
    /// `WrongView` outside the question view, `Locked` once the question is checked
    /// or the attempt finalized, `UnknownOption` for labels the question lacks.
    pub fn select_option(&mut self, option: OptionId) -> Result<Effect, TransitionError> {
        self.expect_view(AttemptView::Question, "select an option")?;
        let question = self.current_question();
        if self.finalized || self.is_revealed() {
            return Err(TransitionError::Locked(question.id()));
        }
        if question.option(&option).is_none() {
            return Err(TransitionError::UnknownOption {
                question_id: question.id(),
                option_id: option,
            });
        }
        self.pending = Some(option);
        Ok(Effect::None)
    }

    /// Grade the pending selection and reveal the question.
    ///
    /// Without a pending selection this is a no-op.
    ///
    /// # Errors
    ///
    /// `WrongView` outside the question view, `AlreadyRevealed` for a checked question.
    pub fn check_answer(&mut self) -> Result<Effect, TransitionError> {
        self.expect_view(AttemptView::Question, "check an answer")?;
        let question = self.current_question();
        if self.finalized || self.is_revealed() {
            return Err(TransitionError::AlreadyRevealed(question.id()));
        }
        let Some(selected) = self.pending.as_ref() else {
            return Ok(Effect::None);
        };

        let answer =
            Answer::evaluate(question, selected).map_err(|_| TransitionError::UnknownOption {
                question_id: question.id(),
                option_id: selected.clone(),
            })?;
        self.state.record(answer);
        self.pending = None;
        Ok(Effect::Persist)
    }

    /// Move to the next question, or request finalization from the last one.
    ///
    /// After finalization, advancing from the last question returns to the
    /// summary without asking for another finalization.
    ///
    /// # Errors
    ///
    /// `WrongView` outside the question view, `NotRevealed` before checking.
    pub fn advance(&mut self) -> Result<Effect, TransitionError> {
        self.expect_view(AttemptView::Question, "advance")?;
        if !self.finalized && !self.is_revealed() {
            return Err(TransitionError::NotRevealed(self.current_question().id()));
        }

        if !self.is_last_question() {
            let next = self.current_index() + 1;
            self.state.set_index(next);
            self.pending = None;
            return Ok(Effect::None);
        }

        if self.finalized {
            self.state.set_view(AttemptView::Summary);
            return Ok(Effect::None);
        }

        Ok(Effect::Finalize)
    }

    /// Step back one question, keeping every recorded answer.
    ///
    /// # Errors
    ///
    /// `WrongView` outside the question view, `AtFirstQuestion` at index zero.
    pub fn retreat(&mut self) -> Result<Effect, TransitionError> {
        self.expect_view(AttemptView::Question, "go back")?;
        let current = self.current_index();
        if current == 0 {
            return Err(TransitionError::AtFirstQuestion);
        }
        self.state.set_index(current - 1);
        self.pending = None;
        Ok(Effect::None)
    }

    /// Show the navigation grid from the question or summary view.
    ///
    /// # Errors
    ///
    /// `WrongView` when navigation is already open.
    pub fn open_navigation(&mut self) -> Result<Effect, TransitionError> {
        let view = self.view();
        if view == AttemptView::Navigation {
            return Err(TransitionError::WrongView {
                command: "open navigation",
                view,
            });
        }
        self.navigation_origin = view;
        self.state.set_view(AttemptView::Navigation);
        Ok(Effect::None)
    }

    /// Return to the view navigation was opened from.
    ///
    /// # Errors
    ///
    /// `WrongView` when navigation is not open.
    pub fn close_navigation(&mut self) -> Result<Effect, TransitionError> {
        self.expect_view(AttemptView::Navigation, "close navigation")?;
        self.state.set_view(self.navigation_origin);
        Ok(Effect::None)
    }

    /// Jump to any question from the navigation grid.
    ///
    /// The pending selection is dropped; an existing answer for the target shows
    /// it revealed.
    ///
    /// # Errors
    ///
    /// `WrongView` when navigation is not open, `IndexOutOfRange` for bad targets.
    pub fn jump_to(&mut self, index: usize) -> Result<Effect, TransitionError> {
        self.expect_view(AttemptView::Navigation, "jump to a question")?;
        if !self.grid().can_jump_to(index) {
            return Err(TransitionError::IndexOutOfRange {
                index,
                len: self.quiz.question_count(),
            });
        }
        self.state.set_index(index);
        self.state.set_view(AttemptView::Question);
        self.pending = None;
        Ok(Effect::None)
    }

    /// Start over from the summary with no answers.
    ///
    /// # Errors
    ///
    /// `WrongView` outside the summary view.
    pub fn retake(&mut self) -> Result<Effect, TransitionError> {
        self.expect_view(AttemptView::Summary, "retake")?;
        self.state = AttemptState::new();
        self.pending = None;
        self.navigation_origin = AttemptView::Question;
        self.finalized = false;
        Ok(Effect::Reset)
    }

    /// Enter the summary after the last question has been completed.
    ///
    /// Only the finalizer calls this, which is what ties the summary view to a
    /// finished finalization.
    ///
    /// # Errors
    ///
    /// `AlreadyFinalized` on a second call, `NotReadyToComplete` unless the last
    /// question is checked and shown.
    pub fn complete(&mut self) -> Result<ScoreReport, TransitionError> {
        if self.finalized {
            return Err(TransitionError::AlreadyFinalized);
        }
        if self.view() != AttemptView::Question || !self.is_last_question() || !self.is_revealed()
        {
            return Err(TransitionError::NotReadyToComplete);
        }
        self.finalized = true;
        self.pending = None;
        self.state.set_view(AttemptView::Summary);
        Ok(self.score())
    }

    fn expect_view(
        &self,
        expected: AttemptView,
        command: &'static str,
    ) -> Result<(), TransitionError> {
        let view = self.view();
        if view == expected {
            Ok(())
        } else {
            Err(TransitionError::WrongView { command, view })
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.quiz.id())
            .field("questions", &self.quiz.question_count())
            .field("current", &self.current_index())
            .field("answers", &self.state.answers().len())
            .field("view", &self.view())
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, QuizId, QuizVariant};

    fn quiz(n: u64) -> Arc<Quiz> {
        let questions = (1..=n)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Question {id}"),
                    vec![
                        AnswerOption::new("A", "right", true),
                        AnswerOption::new("B", "wrong", false),
                    ],
                    1,
                )
                .unwrap()
            })
            .collect();
        Arc::new(Quiz::new(QuizId::new(7), "Session", QuizVariant::Module, questions).unwrap())
    }

    fn answer(session: &mut QuizSession, label: &str) {
        assert_eq!(session.select_option(OptionId::from(label)).unwrap(), Effect::None);
        assert_eq!(session.check_answer().unwrap(), Effect::Persist);
    }

    #[test]
    fn starts_on_first_question() {
        let session = QuizSession::new(quiz(3));
        assert_eq!(session.view(), AttemptView::Question);
        assert_eq!(session.current_index(), 0);
        assert!(!session.is_revealed());
        assert!(session.state().is_empty());
    }

    #[test]
    fn selection_is_pending_until_checked() {
        let mut session = QuizSession::new(quiz(2));
        session.select_option(OptionId::from("B")).unwrap();
        assert_eq!(session.pending_selection(), Some(&OptionId::from("B")));
        assert!(session.answers().is_empty());

        session.select_option(OptionId::from("A")).unwrap();
        assert_eq!(session.check_answer().unwrap(), Effect::Persist);
        let answer = session.current_answer().unwrap();
        assert!(answer.is_correct());
        assert!(session.is_revealed());
        assert!(session.pending_selection().is_none());
    }

    #[test]
    fn check_without_selection_is_noop() {
        let mut session = QuizSession::new(quiz(2));
        assert_eq!(session.check_answer().unwrap(), Effect::None);
        assert!(!session.is_revealed());
    }

    #[test]
    fn selection_locks_after_check() {
        let mut session = QuizSession::new(quiz(2));
        answer(&mut session, "A");
        let err = session.select_option(OptionId::from("B")).unwrap_err();
        assert_eq!(err, TransitionError::Locked(QuestionId::new(1)));
        let err = session.check_answer().unwrap_err();
        assert_eq!(err, TransitionError::AlreadyRevealed(QuestionId::new(1)));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut session = QuizSession::new(quiz(1));
        let err = session.select_option(OptionId::from("Z")).unwrap_err();
        assert!(matches!(err, TransitionError::UnknownOption { .. }));
    }

    #[test]
    fn advance_requires_check() {
        let mut session = QuizSession::new(quiz(2));
        let err = session.advance().unwrap_err();
        assert_eq!(err, TransitionError::NotRevealed(QuestionId::new(1)));

        session.select_option(OptionId::from("A")).unwrap();
        assert!(session.advance().is_err());
    }

    #[test]
    fn advance_moves_to_unrevealed_next_question() {
        let mut session = QuizSession::new(quiz(3));
        answer(&mut session, "A");
        assert_eq!(session.advance().unwrap(), Effect::None);
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_revealed());
        assert!(session.selected_option().is_none());
    }

    #[test]
    fn last_advance_requests_finalize_then_complete_enters_summary() {
        let mut session = QuizSession::new(quiz(2));
        answer(&mut session, "A");
        session.advance().unwrap();
        answer(&mut session, "B");

        assert_eq!(session.advance().unwrap(), Effect::Finalize);
        assert_eq!(session.view(), AttemptView::Question);

        let report = session.complete().unwrap();
        assert_eq!(session.view(), AttemptView::Summary);
        assert!(session.is_finalized());
        assert_eq!(report.correct_count, 1);
        assert_eq!(report.percentage, 50);

        assert_eq!(session.complete().unwrap_err(), TransitionError::AlreadyFinalized);
    }

    #[test]
    fn complete_rejects_unfinished_attempt() {
        let mut session = QuizSession::new(quiz(2));
        answer(&mut session, "A");
        assert_eq!(session.complete().unwrap_err(), TransitionError::NotReadyToComplete);
    }

    #[test]
    fn reentering_summary_does_not_request_second_finalize() {
        let mut session = QuizSession::new(quiz(3));
        for _ in 0..2 {
            answer(&mut session, "A");
            session.advance().unwrap();
        }
        answer(&mut session, "A");
        assert_eq!(session.advance().unwrap(), Effect::Finalize);
        session.complete().unwrap();

        session.open_navigation().unwrap();
        session.jump_to(2).unwrap();
        assert_eq!(session.view(), AttemptView::Question);
        assert!(session.is_revealed());
        assert_eq!(session.advance().unwrap(), Effect::None);
        assert_eq!(session.view(), AttemptView::Summary);
    }

    #[test]
    fn finalized_attempt_rejects_new_answers() {
        let mut session = QuizSession::new(quiz(1));
        answer(&mut session, "A");
        let _ = session.advance().unwrap();
        session.complete().unwrap();
        session.open_navigation().unwrap();
        session.jump_to(0).unwrap();
        assert!(matches!(
            session.select_option(OptionId::from("B")),
            Err(TransitionError::Locked(_))
        ));
    }

    #[test]
    fn retreat_preserves_answers() {
        let mut session = QuizSession::new(quiz(3));
        answer(&mut session, "B");
        session.advance().unwrap();
        answer(&mut session, "A");

        assert_eq!(session.retreat().unwrap(), Effect::None);
        assert_eq!(session.current_index(), 0);
        assert!(session.is_revealed());
        assert_eq!(session.selected_option(), Some(&OptionId::from("B")));
        assert_eq!(session.answers().len(), 2);
    }

    #[test]
    fn retreat_at_first_question_fails() {
        let mut session = QuizSession::new(quiz(2));
        assert_eq!(session.retreat().unwrap_err(), TransitionError::AtFirstQuestion);
    }

    #[test]
    fn retreat_drops_pending_selection() {
        let mut session = QuizSession::new(quiz(2));
        answer(&mut session, "A");
        session.advance().unwrap();
        session.select_option(OptionId::from("B")).unwrap();
        session.retreat().unwrap();
        session.advance().unwrap();
        assert!(session.pending_selection().is_none());
    }

    #[test]
    fn navigation_toggles_without_touching_answers() {
        let mut session = QuizSession::new(quiz(3));
        answer(&mut session, "A");
        session.open_navigation().unwrap();
        assert_eq!(session.view(), AttemptView::Navigation);
        assert!(session.open_navigation().is_err());
        session.close_navigation().unwrap();
        assert_eq!(session.view(), AttemptView::Question);
        assert_eq!(session.answers().len(), 1);
        assert!(session.close_navigation().is_err());
    }

    #[test]
    fn jump_to_answered_question_shows_it_revealed() {
        let mut session = QuizSession::new(quiz(4));
        for label in ["A", "B", "A"] {
            answer(&mut session, label);
            session.advance().unwrap();
        }
        session.open_navigation().unwrap();
        session.jump_to(1).unwrap();
        assert_eq!(session.current_index(), 1);
        assert!(session.is_revealed());
        assert_eq!(session.selected_option(), Some(&OptionId::from("B")));
        assert!(!session.current_answer().unwrap().is_correct());
    }

    #[test]
    fn jump_to_unanswered_question_is_fresh() {
        let mut session = QuizSession::new(quiz(4));
        session.select_option(OptionId::from("A")).unwrap();
        session.open_navigation().unwrap();
        session.jump_to(3).unwrap();
        assert!(!session.is_revealed());
        assert!(session.selected_option().is_none());
    }

    #[test]
    fn jump_out_of_range_fails() {
        let mut session = QuizSession::new(quiz(2));
        session.open_navigation().unwrap();
        let err = session.jump_to(2).unwrap_err();
        assert_eq!(err, TransitionError::IndexOutOfRange { index: 2, len: 2 });
        assert!(matches!(
            QuizSession::new(quiz(2)).jump_to(0),
            Err(TransitionError::WrongView { .. })
        ));
    }

    #[test]
    fn retake_resets_from_summary_only() {
        let mut session = QuizSession::new(quiz(2));
        assert!(session.retake().is_err());

        answer(&mut session, "A");
        session.advance().unwrap();
        answer(&mut session, "A");
        let _ = session.advance().unwrap();
        session.complete().unwrap();

        assert_eq!(session.retake().unwrap(), Effect::Reset);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.view(), AttemptView::Question);
        assert!(!session.is_finalized());
    }

    #[test]
    fn summary_navigation_returns_to_summary() {
        let mut session = QuizSession::new(quiz(1));
        answer(&mut session, "A");
        let _ = session.advance().unwrap();
        session.complete().unwrap();
        session.open_navigation().unwrap();
        session.close_navigation().unwrap();
        assert_eq!(session.view(), AttemptView::Summary);
    }

    #[test]
    fn restore_regrades_and_clamps() {
        let long = quiz(5);
        let mut session = QuizSession::new(Arc::clone(&long));
        for _ in 0..4 {
            answer(&mut session, "A");
            session.advance().unwrap();
        }
        let stored = session.state().clone();
        assert_eq!(stored.current_question_index(), 4);

        let short = quiz(2);
        let restored = QuizSession::restore(short, &stored);
        assert_eq!(restored.current_index(), 1);
        assert_eq!(restored.answers().len(), 2);
        assert_eq!(restored.view(), AttemptView::Question);
    }

    #[test]
    fn restore_normalizes_view() {
        let quiz = quiz(3);
        let stored = AttemptState::from_parts(1, Vec::new(), AttemptView::Navigation);
        let session = QuizSession::restore(quiz, &stored);
        assert_eq!(session.view(), AttemptView::Question);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn apply_dispatches_commands() {
        let mut session = QuizSession::new(quiz(2));
        let effects: Vec<Effect> = [
            SessionCommand::SelectOption(OptionId::from("A")),
            SessionCommand::CheckAnswer,
            SessionCommand::Advance,
            SessionCommand::OpenNavigation,
            SessionCommand::JumpTo(0),
            SessionCommand::Advance,
            SessionCommand::SelectOption(OptionId::from("B")),
            SessionCommand::CheckAnswer,
            SessionCommand::Retreat,
        ]
        .into_iter()
        .map(|cmd| session.apply(cmd).unwrap())
        .collect();

        assert_eq!(
            effects,
            vec![
                Effect::None,
                Effect::Persist,
                Effect::None,
                Effect::None,
                Effect::None,
                Effect::None,
                Effect::None,
                Effect::Persist,
                Effect::None,
            ]
        );
        assert_eq!(session.score().correct_count, 1);
        assert_eq!(session.running_points(), 1);
    }
}
