//! JSON layout of a persisted session.
//!
//! The session is wrapped in a versioned envelope so a future layout change can
//! refuse old payloads instead of mis-reading them.

use quiz_core::model::Session;
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

/// Current envelope version.
pub const SESSION_FORMAT_VERSION: u32 = 2;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a Session,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    state: serde_json::Value,
}

/// Serialize a session into its stored JSON form.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the session cannot be encoded.
pub fn encode_session(session: &Session) -> Result<String, StorageError> {
    serde_json::to_string(&EnvelopeRef {
        version: SESSION_FORMAT_VERSION,
        state: session,
    })
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parse a stored payload back into a session.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON, an unknown
/// version, or a session that fails its invariants.
pub fn decode_session(payload: &str) -> Result<Session, StorageError> {
    let envelope: Envelope =
        serde_json::from_str(payload).map_err(|e| StorageError::Serialization(e.to_string()))?;
    if envelope.version != SESSION_FORMAT_VERSION {
        return Err(StorageError::Serialization(format!(
            "unsupported session format version {}",
            envelope.version
        )));
    }
    serde_json::from_value(envelope.state).map_err(|e| StorageError::Serialization(e.to_string()))
}
