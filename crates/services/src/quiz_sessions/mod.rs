mod finalizer;
mod service;
mod view;

// Public API of the quiz session subsystem.
pub use crate::error::{FinalizeError, SessionError};
pub use finalizer::{AttemptContext, AttemptFinalizer, Award, Finalized, PointPolicy};
pub use service::{ActiveQuiz, CommandOutcome, QuizSessionService, SubmissionState};
pub use view::{
    AttemptSnapshot, NavigationScreen, OptionItem, QuestionScreen, Screen, SummaryScreen,
};
