//! Channel transport — broadcast plus presence over a shared hub.
//!
//! ARCHITECTURE
//! ============
//! A `Hub` fans frames out to every subscriber and keeps the presence set.
//! Clients reach it through one of two adapters that both yield a
//! `Subscription`: `memory::connect` joins an in-process hub directly and
//! `ws::connect` talks to a relay server over a websocket. The cursor
//! session only ever sees the `Subscription`, so it is indifferent to which
//! adapter produced it.
//!
//! DESIGN
//! ======
//! Delivery is at-most-once. Publishing is a non-blocking `try_send`; a full
//! or closed queue surfaces as an error the caller is free to ignore.

pub mod hub;
pub mod memory;
pub mod ws;

use tokio::sync::mpsc;

use crate::frame::{CursorPosition, Frame, FrameError, PresenceMeta};

pub use hub::Hub;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("channel closed")]
    Closed,
    #[error("outbound queue full")]
    Full,
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame encode failed: {0}")]
    Encode(#[from] FrameError),
}

impl From<mpsc::error::TrySendError<Frame>> for TransportError {
    fn from(err: mpsc::error::TrySendError<Frame>) -> Self {
        match err {
            mpsc::error::TrySendError::Full(_) => Self::Full,
            mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Outbound half of a subscription. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ChannelSender {
    tx: mpsc::Sender<Frame>,
}

impl ChannelSender {
    /// Queue a frame without waiting.
    ///
    /// # Errors
    ///
    /// Returns `Full` or `Closed` when the frame could not be queued.
    pub fn publish(&self, frame: Frame) -> Result<(), TransportError> {
        Ok(self.tx.try_send(frame)?)
    }

    /// Broadcast a pointer sample to peers.
    ///
    /// # Errors
    ///
    /// See [`ChannelSender::publish`].
    pub fn cursor_move(&self, position: &CursorPosition) -> Result<(), TransportError> {
        self.publish(Frame::cursor_move(position))
    }

    /// Tell peers to drop `user_id` immediately.
    ///
    /// # Errors
    ///
    /// See [`ChannelSender::publish`].
    pub fn cursor_leave(&self, user_id: &str) -> Result<(), TransportError> {
        self.publish(Frame::cursor_leave(user_id))
    }

    /// Join the presence set under `key`.
    ///
    /// # Errors
    ///
    /// See [`ChannelSender::publish`].
    pub fn track(&self, key: &str, meta: &PresenceMeta) -> Result<(), TransportError> {
        self.publish(Frame::presence_track(key, meta))
    }

    /// Leave the presence set.
    ///
    /// # Errors
    ///
    /// See [`ChannelSender::publish`].
    pub fn untrack(&self) -> Result<(), TransportError> {
        self.publish(Frame::presence_untrack())
    }
}

/// One client's attachment to a channel.
///
/// Dropping the subscription releases the channel: the adapter notices the
/// closed outbound queue and disconnects from the hub.
#[derive(Debug)]
pub struct Subscription {
    sender: ChannelSender,
    inbound: mpsc::Receiver<Frame>,
}

impl Subscription {
    #[must_use]
    pub fn new(outbound: mpsc::Sender<Frame>, inbound: mpsc::Receiver<Frame>) -> Self {
        Self { sender: ChannelSender { tx: outbound }, inbound }
    }

    #[must_use]
    pub fn sender(&self) -> &ChannelSender {
        &self.sender
    }

    /// Next frame from the hub, or `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }

    #[must_use]
    pub fn split(self) -> (ChannelSender, mpsc::Receiver<Frame>) {
        (self.sender, self.inbound)
    }
}
