//! Websocket adapter: attach to a remote relay.
//!
//! Frames travel as JSON text messages. Binary, ping, and pong messages are
//! ignored; a close message or read error ends the inbound side.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{Subscription, TransportError};
use crate::frame::Frame;

/// Connect to a relay at `url` (for example `ws://127.0.0.1:3000/ws`).
///
/// # Errors
///
/// Returns `TransportError::Connect` if the websocket handshake fails.
pub async fn connect(url: &str, buffer: usize) -> Result<Subscription, TransportError> {
    let (stream, _) = connect_async(url)
        .await
        .map_err(|e| TransportError::Connect(Box::new(e)))?;
    info!(%url, "ws: connected to relay");

    let (mut sink, mut source) = stream.split();
    let buffer = buffer.max(1);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Frame>(buffer);
    let (inbound_tx, inbound_rx) = mpsc::channel::<Frame>(buffer);

    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let text = match frame.encode() {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, syscall = %frame.syscall, "ws: failed to encode frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
        debug!("ws: writer closed");
    });

    tokio::spawn(async move {
        while let Some(msg) = source.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            };
            match Frame::decode(text.as_str()) {
                Ok(frame) => {
                    if inbound_tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(e) => debug!(error = %e, "ws: dropped undecodable message"),
            }
        }
        debug!("ws: reader closed");
    });

    Ok(Subscription::new(outbound_tx, inbound_rx))
}
