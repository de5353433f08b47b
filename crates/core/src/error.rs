use thiserror::Error;

use crate::model::{AnswerError, QuestionError, QuizError};
use crate::session::TransitionError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}
