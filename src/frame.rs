//! Frame — the envelope for every message on the cursor channel.
//!
//! ARCHITECTURE
//! ============
//! Clients and the hub exchange JSON text frames. The hub routes on the
//! `syscall` prefix (`cursor:` is fanned out to peers, `presence:` is handled
//! by the hub) and never inspects cursor payloads.
//!
//! DESIGN
//! ======
//! - Flat data: payload is always `Map<String, Value>`.
//! - Typed payloads (`CursorPosition`, `CursorLeave`) convert to and from
//!   `Data` at the edges so the hub stays payload-agnostic.
//! - Decoding never panics; every failure is a `FrameError`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// SYSCALLS
// =============================================================================

pub const CURSOR_MOVE: &str = "cursor:move";
pub const CURSOR_LEAVE: &str = "cursor:leave";
pub const PRESENCE_TRACK: &str = "presence:track";
pub const PRESENCE_UNTRACK: &str = "presence:untrack";
pub const PRESENCE_SYNC: &str = "presence:sync";
pub const CHANNEL_SUBSCRIBED: &str = "channel:subscribed";
pub const GATEWAY_ERROR: &str = "gateway:error";

/// Frame data key for error messages.
pub const FRAME_MESSAGE: &str = "message";

/// Frame data key for grepable error codes.
pub const FRAME_CODE: &str = "code";

// =============================================================================
// TYPES
// =============================================================================

/// Flat key-value payload. Alias to reduce noise in signatures.
pub type Data = HashMap<String, serde_json::Value>;

/// The universal message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub syscall: String,
    #[serde(default)]
    pub data: Data,
}

/// Wire representation of one local pointer sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub user_id: String,
    pub color: String,
    pub pathname: String,
    pub timestamp: i64,
}

/// Explicit "this cursor is gone" notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorLeave {
    pub user_id: String,
}

/// Metadata a client attaches when tracking itself in presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMeta {
    pub id: String,
    pub is_mobile: bool,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Grepable error code for structured error frames.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unexpected syscall: expected {expected}, got {actual}")]
    UnexpectedSyscall { expected: &'static str, actual: String },
    #[error("invalid payload for {syscall}: {message}")]
    InvalidPayload { syscall: String, message: String },
}

impl ErrorCode for FrameError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "E_INVALID_JSON",
            Self::UnexpectedSyscall { .. } => "E_UNEXPECTED_SYSCALL",
            Self::InvalidPayload { .. } => "E_INVALID_PAYLOAD",
        }
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    pub fn new(syscall: impl Into<String>, data: Data) -> Self {
        Self { id: Uuid::new_v4(), ts: now_ms(), from: None, syscall: syscall.into(), data }
    }

    #[must_use]
    pub fn cursor_move(position: &CursorPosition) -> Self {
        Self::new(CURSOR_MOVE, to_data(position))
    }

    pub fn cursor_leave(user_id: impl Into<String>) -> Self {
        Self::new(CURSOR_LEAVE, to_data(&CursorLeave { user_id: user_id.into() }))
    }

    /// Announce this client under `key` in the channel's presence set.
    pub fn presence_track(key: impl Into<String>, meta: &PresenceMeta) -> Self {
        let key: String = key.into();
        Self::new(PRESENCE_TRACK, Data::new())
            .with_data("key", key)
            .with_data("meta", serde_json::to_value(meta).unwrap_or_default())
    }

    #[must_use]
    pub fn presence_untrack() -> Self {
        Self::new(PRESENCE_UNTRACK, Data::new())
    }

    /// Snapshot of every tracked presence key, sorted for stable output.
    #[must_use]
    pub fn presence_sync(keys: &[String]) -> Self {
        Self::new(PRESENCE_SYNC, Data::new()).with_data("keys", keys.to_vec())
    }

    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self::new(GATEWAY_ERROR, Data::new())
            .with_data(FRAME_CODE, err.error_code())
            .with_data(FRAME_MESSAGE, err.to_string())
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

impl Frame {
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// ROUTING + DECODING
// =============================================================================

impl Frame {
    /// Extract the syscall prefix (everything before the first ':').
    #[must_use]
    pub fn prefix(&self) -> &str {
        let Some((prefix, _)) = self.syscall.split_once(':') else {
            return &self.syscall;
        };
        prefix
    }

    /// Parse a frame from websocket text.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidJson` if the text is not a frame.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize for websocket transmission.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidJson` if a payload value cannot be encoded.
    pub fn encode(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the payload of a `cursor:move` frame.
    ///
    /// # Errors
    ///
    /// Returns an error on a different syscall or a malformed payload.
    pub fn cursor_position(&self) -> Result<CursorPosition, FrameError> {
        self.payload(CURSOR_MOVE)
    }

    /// Decode the payload of a `cursor:leave` frame.
    ///
    /// # Errors
    ///
    /// Returns an error on a different syscall or a malformed payload.
    pub fn cursor_leave_payload(&self) -> Result<CursorLeave, FrameError> {
        self.payload(CURSOR_LEAVE)
    }

    /// Keys listed in a `presence:sync` frame. Non-string entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error on a different syscall or a missing `keys` array.
    pub fn presence_keys(&self) -> Result<Vec<String>, FrameError> {
        if self.syscall != PRESENCE_SYNC {
            return Err(FrameError::UnexpectedSyscall { expected: PRESENCE_SYNC, actual: self.syscall.clone() });
        }
        let Some(keys) = self.data.get("keys").and_then(serde_json::Value::as_array) else {
            return Err(FrameError::InvalidPayload { syscall: self.syscall.clone(), message: "keys required".into() });
        };
        Ok(keys
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect())
    }

    fn payload<T: DeserializeOwned>(&self, expected: &'static str) -> Result<T, FrameError> {
        if self.syscall != expected {
            return Err(FrameError::UnexpectedSyscall { expected, actual: self.syscall.clone() });
        }
        let value = serde_json::Value::Object(self.data.clone().into_iter().collect());
        serde_json::from_value(value)
            .map_err(|e| FrameError::InvalidPayload { syscall: self.syscall.clone(), message: e.to_string() })
    }
}

fn to_data(value: &impl Serialize) -> Data {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        _ => Data::new(),
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
