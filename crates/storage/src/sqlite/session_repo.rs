use async_trait::async_trait;
use chrono::Utc;
use quiz_core::model::Session;
use sqlx::Row;

use super::SqliteRepository;
use crate::codec::{decode_session, encode_session};
use crate::repository::{SESSION_KEY, SessionStore, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionStore for SqliteRepository {
    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let payload = encode_session(session)?;
        sqlx::query(
            r"
            INSERT INTO session_slots (key, payload, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                saved_at = excluded.saved_at
            ",
        )
        .bind(SESSION_KEY)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        tracing::debug!(key = SESSION_KEY, "session saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query("SELECT payload FROM session_slots WHERE key = ?1")
            .bind(SESSION_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row
            .try_get("payload")
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        decode_session(&payload).map(Some)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_slots WHERE key = ?1")
            .bind(SESSION_KEY)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
