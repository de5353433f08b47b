//! Environment-driven configuration.
//!
//! Every `from_env` has a `from_lookup` twin taking any key lookup, so tests never
//! touch the process environment.

use std::env;
use std::time::Duration;

use quiz_core::model::{QuizId, UserId};
use storage::repository::AttemptKey;

use crate::error::ConfigError;

pub const API_BASE_URL_VAR: &str = "QUIZ_API_BASE_URL";
pub const API_TOKEN_VAR: &str = "QUIZ_API_TOKEN";
pub const API_TIMEOUT_VAR: &str = "QUIZ_API_TIMEOUT_SECS";
pub const USER_ID_VAR: &str = "QUIZ_USER_ID";
pub const NAMESPACE_VAR: &str = "QUIZ_STORE_NAMESPACE";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

//
// ─── REMOTE API ────────────────────────────────────────────────────────────────
//

/// Connection settings for the learning platform API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read the API settings from the process environment.
    ///
    /// Returns `Ok(None)` when `QUIZ_API_BASE_URL` is unset, which disables the
    /// remote API.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the timeout is not a whole number of seconds.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with a custom lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the timeout is not a whole number of seconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(base_url) = non_blank(lookup(API_BASE_URL_VAR)) else {
            return Ok(None);
        };

        let timeout = match non_blank(lookup(API_TIMEOUT_VAR)) {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    key: API_TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Some(Self {
            base_url,
            token: non_blank(lookup(API_TOKEN_VAR)),
            timeout,
        }))
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Who is taking quizzes, and which store namespace their attempts live in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub user_id: UserId,
    pub namespace: Option<String>,
}

impl EngineConfig {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            namespace: None,
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = non_blank(namespace);
        self
    }

    /// Read the engine settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `QUIZ_USER_ID` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with a custom lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `QUIZ_USER_ID` is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_id = non_blank(lookup(USER_ID_VAR))
            .ok_or(ConfigError::Missing { key: USER_ID_VAR })?;
        Ok(Self::new(UserId::new(user_id)).with_namespace(lookup(NAMESPACE_VAR)))
    }

    /// Store key for `quiz_id` under this configuration's namespace.
    #[must_use]
    pub fn attempt_key(&self, quiz_id: QuizId) -> AttemptKey {
        match &self.namespace {
            Some(ns) => AttemptKey::namespaced(quiz_id, ns.clone()),
            None => AttemptKey::new(quiz_id),
        }
    }
}
