use async_trait::async_trait;
use quiz_core::model::AttemptState;
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{AttemptKey, AttemptStore, StorageError, decode_or_discard, encode};

fn quiz_id_i64(key: &AttemptKey) -> Result<i64, StorageError> {
    i64::try_from(key.quiz_id().value())
        .map_err(|_| StorageError::Serialization("quiz_id overflow".into()))
}

#[async_trait]
impl AttemptStore for SqliteRepository {
    async fn load(&self, key: &AttemptKey) -> Result<Option<AttemptState>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT payload
            FROM quiz_attempts
            WHERE storage_key = ?1
            ",
        )
        .bind(key.storage_key())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        // A payload column of the wrong type is corruption too.
        let payload: String = match row.try_get("payload") {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "stored attempt payload is unreadable");
                return Ok(None);
            }
        };

        Ok(decode_or_discard(key, &payload))
    }

    async fn save(&self, key: &AttemptKey, state: &AttemptState) -> Result<(), StorageError> {
        let payload = encode(state, &self.clock)?;

        sqlx::query(
            r"
            INSERT INTO quiz_attempts (storage_key, quiz_id, namespace, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(storage_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.storage_key())
        .bind(quiz_id_i64(key)?)
        .bind(key.namespace())
        .bind(payload)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        tracing::debug!(key = %key, answers = state.answers().len(), "saved attempt");
        Ok(())
    }

    async fn clear(&self, key: &AttemptKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM quiz_attempts WHERE storage_key = ?1")
            .bind(key.storage_key())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
