//! Hub — shared fan-out and presence state for one cursor channel.
//!
//! DESIGN
//! ======
//! The hub holds every connected client's outbound queue and the presence
//! set behind one `RwLock`. It is deliberately dumb: `cursor:` frames are
//! stamped with the sender and forwarded to everyone else untouched, and
//! presence changes trigger a full `presence:sync` snapshot to every client.
//! Presence is client-asserted; the hub never validates keys or payloads.
//!
//! LIFECYCLE
//! =========
//! 1. `join` → client receives `channel:subscribed` and a presence snapshot
//! 2. `handle` for every inbound frame
//! 3. `leave` → client's presence keys are released and peers are re-synced

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::frame::{self, Data, ErrorCode, Frame};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
    #[error("presence key required")]
    MissingKey,
}

impl ErrorCode for HubError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
            Self::MissingKey => "E_MISSING_KEY",
        }
    }
}

/// Per-channel live state.
#[derive(Default)]
pub struct HubState {
    /// Connected clients: `client_id` -> sender for outgoing frames.
    pub clients: HashMap<Uuid, mpsc::Sender<Frame>>,
    /// Tracked presence: key -> every `client_id` tracking it. A key stays
    /// present while any of its owners does.
    pub presence: HashMap<String, HashSet<Uuid>>,
}

impl HubState {
    /// Presence keys in stable order.
    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.presence.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Best-effort delivery to every client except `exclude`.
    fn broadcast(&self, frame: &Frame, exclude: Option<Uuid>) {
        for (client_id, tx) in &self.clients {
            if exclude == Some(*client_id) {
                continue;
            }
            // Best-effort: if a client's channel is full, skip it.
            if tx.try_send(frame.clone()).is_err() {
                debug!(%client_id, syscall = %frame.syscall, "hub: dropped frame for slow client");
            }
        }
    }

    fn sync_presence(&self) {
        self.broadcast(&Frame::presence_sync(&self.keys()), None);
    }

    /// Drop `client_id` from every key, removing keys left without owners.
    /// Returns true if the visible key set changed.
    fn untrack(&mut self, client_id: Uuid) -> bool {
        let before = self.presence.len();
        self.presence.retain(|_, owners| {
            owners.remove(&client_id);
            !owners.is_empty()
        });
        self.presence.len() != before
    }
}

// =============================================================================
// HUB
// =============================================================================

/// Shared handle; clones refer to the same channel.
#[derive(Clone)]
pub struct Hub {
    state: Arc<RwLock<HubState>>,
    client_buffer: usize,
}

impl Hub {
    #[must_use]
    pub fn new(client_buffer: usize) -> Self {
        Self { state: Arc::new(RwLock::new(HubState::default())), client_buffer: client_buffer.max(1) }
    }

    /// Register a client and return its id and inbound queue.
    pub async fn join(&self) -> (Uuid, mpsc::Receiver<Frame>) {
        let client_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.client_buffer);

        let mut state = self.state.write().await;
        let subscribed = Frame::new(frame::CHANNEL_SUBSCRIBED, Data::new()).with_data("client_id", client_id.to_string());
        let _ = tx.try_send(subscribed);
        let _ = tx.try_send(Frame::presence_sync(&state.keys()));
        state.clients.insert(client_id, tx);
        info!(%client_id, clients = state.clients.len(), "hub: client joined");

        (client_id, rx)
    }

    /// Remove a client and re-sync presence if that changed the key set.
    pub async fn leave(&self, client_id: Uuid) {
        let mut state = self.state.write().await;
        state.clients.remove(&client_id);
        if state.untrack(client_id) {
            state.sync_presence();
        }
        info!(%client_id, clients = state.clients.len(), "hub: client left");
    }

    /// Route one inbound frame from `client_id`.
    ///
    /// # Errors
    ///
    /// Returns a `HubError` for unknown syscalls or a track without a key.
    /// The error has already been reported to the client as a frame.
    pub async fn handle(&self, client_id: Uuid, mut frame: Frame) -> Result<(), HubError> {
        let result = self.route(client_id, &mut frame).await;
        if let Err(e) = &result {
            debug!(%client_id, syscall = %frame.syscall, error = %e, "hub: rejected frame");
            let state = self.state.read().await;
            if let Some(tx) = state.clients.get(&client_id) {
                let _ = tx.try_send(Frame::error_from(e));
            }
        }
        result
    }

    async fn route(&self, client_id: Uuid, frame: &mut Frame) -> Result<(), HubError> {
        if frame.prefix() == "cursor" {
            frame.from = Some(client_id.to_string());
            self.state.read().await.broadcast(frame, Some(client_id));
            return Ok(());
        }

        match frame.syscall.as_str() {
            frame::PRESENCE_TRACK => {
                let Some(key) = frame
                    .data
                    .get("key")
                    .and_then(|v| v.as_str())
                    .filter(|k| !k.is_empty())
                else {
                    return Err(HubError::MissingKey);
                };
                let mut state = self.state.write().await;
                state.untrack(client_id);
                state.presence.entry(key.to_owned()).or_default().insert(client_id);
                info!(%client_id, key, tracked = state.presence.len(), "hub: presence tracked");
                state.sync_presence();
                Ok(())
            }
            frame::PRESENCE_UNTRACK => {
                let mut state = self.state.write().await;
                if state.untrack(client_id) {
                    state.sync_presence();
                }
                Ok(())
            }
            other => Err(HubError::UnknownSyscall(other.to_owned())),
        }
    }

    /// Currently tracked presence keys, sorted.
    pub async fn presence_keys(&self) -> Vec<String> {
        self.state.read().await.keys()
    }

    #[must_use]
    pub fn client_buffer(&self) -> usize {
        self.client_buffer
    }

    pub async fn client_count(&self) -> usize {
        self.state.read().await.clients.len()
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
