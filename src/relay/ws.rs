//! WebSocket handler — bridges one socket to the hub.
//!
//! DESIGN
//! ======
//! On upgrade the client joins the hub and enters a `select!` loop:
//! - Incoming text messages → decode → `Hub::handle`
//! - Frames queued by the hub → encode → socket
//!
//! Undecodable text is answered with a `gateway:error` frame and the
//! connection stays open. Binary messages are ignored.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → `Hub::join` (queues `channel:subscribed` + presence snapshot)
//! 2. Frames flow both ways until close or socket error
//! 3. `Hub::leave` drops the client's presence and re-syncs peers

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tracing::{info, warn};

use crate::frame::Frame;
use crate::transport::Hub;

pub async fn handle_ws(State(hub): State<Hub>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, hub))
}

async fn run_ws(mut socket: WebSocket, hub: Hub) {
    let (client_id, mut client_rx) = hub.join().await;
    info!(%client_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => match Frame::decode(text.as_str()) {
                        Ok(frame) => {
                            // Rejections are queued back to this client by the hub.
                            let _ = hub.handle(client_id, frame).await;
                        }
                        Err(e) => {
                            warn!(%client_id, error = %e, "ws: invalid frame");
                            if send_frame(&mut socket, &Frame::error_from(&e)).await.is_err() {
                                break;
                            }
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    hub.leave(client_id).await;
    info!(%client_id, "ws: client disconnected");
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    let text = match frame.encode() {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, syscall = %frame.syscall, "ws: failed to encode frame");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await
}
