use async_trait::async_trait;
use quiz_core::Clock;
use quiz_core::model::{AttemptState, QuizId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::codec;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Prefix of every attempt key.
pub const KEY_PREFIX: &str = "quiz-answers";

/// Identifies one stored attempt: a quiz, optionally scoped to a namespace.
///
/// Without a namespace the key is `quiz-answers-<quizId>`. With one it is
/// `quiz-answers-<namespace>-<quizId>`, which keeps attempts made from separate
/// sessions on the same device apart.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    quiz_id: QuizId,
    namespace: Option<String>,
}

impl AttemptKey {
    #[must_use]
    pub fn new(quiz_id: QuizId) -> Self {
        Self {
            quiz_id,
            namespace: None,
        }
    }

    /// Blank namespaces fall back to the shared key.
    #[must_use]
    pub fn namespaced(quiz_id: QuizId, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let namespace = namespace.trim();
        Self {
            quiz_id,
            namespace: (!namespace.is_empty()).then(|| namespace.to_owned()),
        }
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn storage_key(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{KEY_PREFIX}-{ns}-{}", self.quiz_id),
            None => format!("{KEY_PREFIX}-{}", self.quiz_id),
        }
    }
}

impl fmt::Debug for AttemptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttemptKey({})", self.storage_key())
    }
}

impl fmt::Display for AttemptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Durable, device-scoped persistence for in-progress attempts.
///
/// A record that cannot be parsed reads as absent; only backend failures are
/// reported as errors.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Fetch the stored attempt, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn load(&self, key: &AttemptKey) -> Result<Option<AttemptState>, StorageError>;

    /// Replace the stored attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be written.
    async fn save(&self, key: &AttemptKey, state: &AttemptState) -> Result<(), StorageError>;

    /// Remove the stored attempt. Removing a missing attempt is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn clear(&self, key: &AttemptKey) -> Result<(), StorageError>;
}

/// Decode a raw payload, treating corruption as "no attempt".
pub(crate) fn decode_or_discard(key: &AttemptKey, raw: &str) -> Option<AttemptState> {
    match codec::decode(raw) {
        Ok(state) => Some(state),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "discarding unreadable stored attempt");
            None
        }
    }
}

pub(crate) fn encode(state: &AttemptState, clock: &Clock) -> Result<String, StorageError> {
    codec::encode(state, clock.now()).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Simple in-memory store for tests and prototyping.
///
/// Payloads go through the same codec as the durable backends.
#[derive(Clone, Default)]
pub struct InMemoryAttemptStore {
    clock: Clock,
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryAttemptStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Write a raw payload, bypassing the codec.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_raw(&self, key: &AttemptKey, raw: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.storage_key(), raw.into());
        Ok(())
    }

    /// Read the raw payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw(&self, key: &AttemptKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key.storage_key()).cloned())
    }

    /// Whether anything is stored under `key`, readable or not.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn contains(&self, key: &AttemptKey) -> Result<bool, StorageError> {
        Ok(self.raw(key)?.is_some())
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn load(&self, key: &AttemptKey) -> Result<Option<AttemptState>, StorageError> {
        let raw = self.raw(key)?;
        Ok(raw.and_then(|raw| decode_or_discard(key, &raw)))
    }

    async fn save(&self, key: &AttemptKey, state: &AttemptState) -> Result<(), StorageError> {
        let payload = encode(state, &self.clock)?;
        self.insert_raw(key, payload)
    }

    async fn clear(&self, key: &AttemptKey) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&key.storage_key());
        Ok(())
    }
}

/// Aggregates store implementations behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn AttemptStore>,
}
