use std::sync::Arc;

use quiz_core::model::{Quiz, QuizId};
use quiz_core::{Effect, QuizSession, ScoreReport, SessionCommand};
use storage::repository::{AttemptKey, AttemptStore};

use super::finalizer::{AttemptContext, AttemptFinalizer, Award, Finalized, PointPolicy};
use crate::config::EngineConfig;
use crate::error::{FinalizeError, SessionError};
use crate::remote::{AttemptHistory, QuizCatalog, ScoreSubmitter};

//
// ─── ACTIVE ATTEMPT ────────────────────────────────────────────────────────────
//

/// Where the score of the current attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// The attempt has not been finalized yet.
    Pending,
    /// The score was settled (submitted or skipped by policy).
    Settled(Finalized),
    /// The summary is shown but the score service failed; the submission can be retried.
    SubmissionFailed(ScoreReport),
    /// The score is settled but the stored attempt could not be cleared.
    ClearFailed(Finalized),
}

/// A running attempt: the state machine plus everything needed to persist and
/// finalize it.
#[derive(Debug)]
pub struct ActiveQuiz {
    session: QuizSession,
    ctx: AttemptContext,
    restored: bool,
    submission: SubmissionState,
}

impl ActiveQuiz {
    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        self.session.quiz()
    }

    #[must_use]
    pub fn key(&self) -> &AttemptKey {
        &self.ctx.key
    }

    #[must_use]
    pub fn policy(&self) -> PointPolicy {
        self.ctx.policy
    }

    /// Whether the attempt resumed from the store.
    #[must_use]
    pub fn was_restored(&self) -> bool {
        self.restored
    }

    #[must_use]
    pub fn submission(&self) -> SubmissionState {
        self.submission
    }
    /// Record where the score stands. Once points were submitted for a
    /// first-attempt-only quiz, later attempts in this session never award again.
    fn record(&mut self, submission: SubmissionState) {
        if let SubmissionState::Settled(done) | SubmissionState::ClearFailed(done) = submission {
            if self.quiz().variant().first_attempt_only()
                && matches!(done.award, Award::Submitted { .. })
            {
                self.ctx.policy = PointPolicy::NotFirstAttempt;
            }
        }
        self.submission = submission;
    }
}

/// Result of a successfully applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The session changed; any required persistence already happened.
    Updated,
    /// The attempt was finalized and its score settled.
    Finalized(Finalized),
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Drives quiz attempts: loads definitions, restores stored progress, runs the
/// side effects each transition asks for.
#[derive(Clone)]
pub struct QuizSessionService {
    catalog: Arc<dyn QuizCatalog>,
    history: Arc<dyn AttemptHistory>,
    store: Arc<dyn AttemptStore>,
    finalizer: AttemptFinalizer,
    config: EngineConfig,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn QuizCatalog>,
        history: Arc<dyn AttemptHistory>,
        submitter: Arc<dyn ScoreSubmitter>,
        store: Arc<dyn AttemptStore>,
        config: EngineConfig,
    ) -> Self {
        let finalizer = AttemptFinalizer::new(submitter, Arc::clone(&store));
        Self {
            catalog,
            history,
            store,
            finalizer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Enter a quiz: fetch its definition, decide the point policy, and resume any
    /// stored attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizNotFound` or `SessionError::EmptyQuiz` when there is
    /// nothing to play, `SessionError::Remote` if the catalog or the first-attempt
    /// query fails, and `SessionError::Storage` if the store cannot be read.
    pub async fn start(&self, quiz_id: QuizId) -> Result<ActiveQuiz, SessionError> {
        let quiz = Arc::new(self.catalog.fetch_quiz(quiz_id).await?);
        let policy = self.point_policy(&quiz).await?;
        let key = self.config.attempt_key(quiz_id);

        let stored = self.store.load(&key).await?;
        let restored = stored.is_some();
        let session = match stored {
            Some(state) => QuizSession::restore(quiz, &state),
            None => QuizSession::new(quiz),
        };
        tracing::debug!(
            key = %key,
            restored,
            answers = session.answers().len(),
            index = session.current_index(),
            "quiz session started"
        );

        Ok(ActiveQuiz {
            session,
            ctx: AttemptContext {
                key,
                user_id: self.config.user_id.clone(),
                policy,
            },
            restored,
            submission: SubmissionState::Pending,
        })
    }

    /// Apply `command` and run the side effect it requests.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` for commands invalid in the current state,
    /// `SessionError::Storage` when persisting fails, and `SessionError::Finalize`
    /// when finalization does not settle the score. In the last case the session is
    /// already showing the summary.
    pub async fn apply(
        &self,
        active: &mut ActiveQuiz,
        command: SessionCommand,
    ) -> Result<CommandOutcome, SessionError> {
        if command == SessionCommand::Retake {
            return self.retake(active).await;
        }
        match active.session.apply(command)? {
            Effect::None => Ok(CommandOutcome::Updated),
            Effect::Persist => {
                self.store.save(&active.ctx.key, active.session.state()).await?;
                tracing::debug!(
                    key = %active.ctx.key,
                    answers = active.session.answers().len(),
                    "attempt persisted"
                );
                Ok(CommandOutcome::Updated)
            }
            Effect::Reset => {
                self.store.clear(&active.ctx.key).await?;
                active.submission = SubmissionState::Pending;
                Ok(CommandOutcome::Updated)
            }
            Effect::Finalize => self.finalize(active).await,
        }
    }

    /// Retry whatever the previous finalization left unsettled.
    ///
    /// A failed submission is submitted again; a settled score whose stored attempt
    /// could not be cleared only retries the clear.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NothingToRetry` unless the previous finalization
    /// failed, or `SessionError::Finalize` / `SessionError::Storage` if it fails again.
    pub async fn retry_submission(
        &self,
        active: &mut ActiveQuiz,
    ) -> Result<Finalized, SessionError> {
        let finalized = match active.submission {
            SubmissionState::SubmissionFailed(report) => {
                match self.finalizer.settle(report, &active.ctx).await {
                    Ok(finalized) => finalized,
                    Err(err) => {
                        active.record(unsettled(&err, active.submission));
                        return Err(err.into());
                    }
                }
            }
            SubmissionState::ClearFailed(finalized) => {
                self.store.clear(&active.ctx.key).await?;
                finalized
            }
            SubmissionState::Pending | SubmissionState::Settled(_) => {
                return Err(SessionError::NothingToRetry);
            }
        };
        active.record(SubmissionState::Settled(finalized));
        Ok(finalized)
    }

    /// Drop any stored attempt for `quiz_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be written.
    pub async fn reset(&self, quiz_id: QuizId) -> Result<(), SessionError> {
        let key = self.config.attempt_key(quiz_id);
        self.store.clear(&key).await?;
        tracing::debug!(key = %key, "stored attempt cleared");
        Ok(())
    }

    /// Retake runs its side effects against a reset copy of the session and
    /// only commits it once they succeed, so a failure leaves the summary in place.
    async fn retake(&self, active: &mut ActiveQuiz) -> Result<CommandOutcome, SessionError> {
        let mut next = active.session.clone();
        next.retake()?;

        // A retake of a first-attempt-only quiz no longer earns points once the
        // first attempt was scored.
        let policy = match active.ctx.policy {
            PointPolicy::NotFirstAttempt => PointPolicy::NotFirstAttempt,
            PointPolicy::Award => self.point_policy(next.quiz()).await?,
        };
        self.store.clear(&active.ctx.key).await?;

        active.session = next;
        active.ctx.policy = policy;
        active.submission = SubmissionState::Pending;
        tracing::debug!(key = %active.ctx.key, ?policy, "attempt reset");
        Ok(CommandOutcome::Updated)
    }

    async fn finalize(&self, active: &mut ActiveQuiz) -> Result<CommandOutcome, SessionError> {
        match self.finalizer.finalize(&mut active.session, &active.ctx).await {
            Ok(finalized) => {
                active.record(SubmissionState::Settled(finalized));
                Ok(CommandOutcome::Finalized(finalized))
            }
            Err(err) => {
                active.record(unsettled(&err, active.submission));
                Err(err.into())
            }
        }
    }

    async fn point_policy(&self, quiz: &Quiz) -> Result<PointPolicy, SessionError> {
        if !quiz.variant().first_attempt_only() {
            return Ok(PointPolicy::Award);
        }
        let first = self
            .history
            .is_first_attempt(&self.config.user_id, quiz.id())
            .await?;
        Ok(if first {
            PointPolicy::Award
        } else {
            PointPolicy::NotFirstAttempt
        })
    }
}

fn unsettled(err: &FinalizeError, previous: SubmissionState) -> SubmissionState {
    match err {
        FinalizeError::Submission { report, .. } => SubmissionState::SubmissionFailed(*report),
        FinalizeError::Storage { report, award, .. } => SubmissionState::ClearFailed(Finalized {
            report: *report,
            award: *award,
        }),
        _ => previous,
    }
}
