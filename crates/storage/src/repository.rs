use async_trait::async_trait;
use quiz_core::model::Session;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::codec::{decode_session, encode_session};

/// Key of the single durable slot that holds the active session.
pub const SESSION_KEY: &str = "quiz_session_v2";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable slot for the one active quiz session.
///
/// Writers are last-writer-wins; there is only ever one session in flight.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the session, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be encoded or written.
    async fn save(&self, session: &Session) -> Result<(), StorageError>;

    /// Load the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read or decoded.
    async fn load(&self) -> Result<Option<Session>, StorageError>;

    /// Remove the stored session. Clearing an empty slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be cleared.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory slot for tests and for running without a database.
///
/// Holds the encoded payload rather than the struct so it goes through the
/// same JSON layout as the `SQLite` backend.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored payload, for inspection in tests.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let payload = encode_session(session)?;
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(payload);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>, StorageError> {
        let payload = {
            let guard = self
                .slot
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.clone()
        };
        payload.as_deref().map(decode_session).transpose()
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.take();
        Ok(())
    }
}

/// Storage handles behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        Self { sessions }
    }
}
