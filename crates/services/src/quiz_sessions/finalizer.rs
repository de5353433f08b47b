use std::sync::Arc;

use quiz_core::model::UserId;
use quiz_core::{QuizSession, ScoreReport};
use storage::repository::{AttemptKey, AttemptStore};

use crate::error::FinalizeError;
use crate::remote::{ScoreSubmission, ScoreSubmitter};

//
// ─── POLICY & OUTCOME ──────────────────────────────────────────────────────────
//

/// Whether a finished attempt earns points.
///
/// Decided once when the attempt starts: module quizzes always award, the final
/// quiz only awards on the learner's first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointPolicy {
    Award,
    NotFirstAttempt,
}

/// What happened to the score of a finalized attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Award {
    /// The score service accepted `points`.
    Submitted { points: u32 },
    /// Not the first attempt at a first-attempt-only quiz; nothing was submitted.
    NotFirstAttempt,
}

/// Successful finalization: the local score and its award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalized {
    pub report: ScoreReport,
    pub award: Award,
}

/// Everything the finalizer needs to know about the attempt's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptContext {
    pub key: AttemptKey,
    pub user_id: UserId,
    pub policy: PointPolicy,
}

//
// ─── FINALIZER ─────────────────────────────────────────────────────────────────
//

/// Completes an attempt and hands its score to the score service exactly once.
#[derive(Clone)]
pub struct AttemptFinalizer {
    submitter: Arc<dyn ScoreSubmitter>,
    store: Arc<dyn AttemptStore>,
}

impl AttemptFinalizer {
    #[must_use]
    pub fn new(submitter: Arc<dyn ScoreSubmitter>, store: Arc<dyn AttemptStore>) -> Self {
        Self { submitter, store }
    }

    /// Move `session` into the summary and settle its score.
    ///
    /// The session reaches the summary before anything is submitted, so the local
    /// score is always available. The stored attempt is cleared only once the score
    /// is settled, which leaves it in place for a retry when submission fails.
    ///
    /// # Errors
    ///
    /// Returns `FinalizeError::NotReady` if the session has not completed its last
    /// question or was already finalized, `FinalizeError::Submission` if the score
    /// service failed, and `FinalizeError::Storage` if clearing the store failed.
    pub async fn finalize(
        &self,
        session: &mut QuizSession,
        ctx: &AttemptContext,
    ) -> Result<Finalized, FinalizeError> {
        let report = session.complete().map_err(FinalizeError::NotReady)?;
        tracing::info!(
            quiz_id = %session.quiz().id(),
            score = report.total_score,
            percentage = report.percentage,
            policy = ?ctx.policy,
            "attempt finalized"
        );
        self.settle(report, ctx).await
    }

    /// Submit (when the policy awards points) and clear the stored attempt.
    ///
    /// Used by [`AttemptFinalizer::finalize`] and to retry a failed submission.
    ///
    /// # Errors
    ///
    /// Returns `FinalizeError::Submission` or `FinalizeError::Storage`.
    pub async fn settle(
        &self,
        report: ScoreReport,
        ctx: &AttemptContext,
    ) -> Result<Finalized, FinalizeError> {
        let award = match ctx.policy {
            PointPolicy::NotFirstAttempt => Award::NotFirstAttempt,
            PointPolicy::Award => {
                let submission = ScoreSubmission {
                    user_id: ctx.user_id.clone(),
                    points: report.total_score,
                    quiz_id: ctx.key.quiz_id(),
                };
                if let Err(source) = self.submitter.submit_score(&submission).await {
                    tracing::warn!(key = %ctx.key, error = %source, "score submission failed");
                    return Err(FinalizeError::Submission { report, source });
                }
                Award::Submitted {
                    points: report.total_score,
                }
            }
        };

        self.store
            .clear(&ctx.key)
            .await
            .map_err(|source| FinalizeError::Storage {
                report,
                award,
                source,
            })?;

        Ok(Finalized { report, award })
    }
}
