#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod quiz_sessions;
pub mod remote;

pub use config::{ApiConfig, EngineConfig};
pub use error::{ConfigError, FinalizeError, RemoteError, SessionError};
pub use quiz_sessions::{
    ActiveQuiz, AttemptFinalizer, AttemptSnapshot, Award, CommandOutcome, Finalized,
    PointPolicy, QuizSessionService, SubmissionState,
};
pub use remote::{
    AttemptHistory, HttpLearningApi, InMemoryQuizCatalog, InMemoryScoreboard, QuizCatalog,
    ScoreSubmission, ScoreSubmitter,
};
