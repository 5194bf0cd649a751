use std::time::Duration;

use super::*;
use crate::frame::{self, CursorPosition, Frame, PresenceMeta};
use crate::transport::{Subscription, ws as ws_transport};

async fn spawn_relay() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(Hub::new(64))).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

async fn next_with(sub: &mut Subscription, syscall: &str) -> Frame {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let frame = sub.recv().await.expect("channel open");
            if frame.syscall == syscall {
                return frame;
            }
        }
    })
    .await
    .expect("frame within timeout")
}

#[tokio::test]
async fn healthz_is_ok() {
    assert_eq!(healthz().await, StatusCode::OK);
}

#[tokio::test]
async fn relays_cursor_moves_between_sockets() {
    let url = spawn_relay().await;
    let mut a = ws_transport::connect(&url, 32).await.unwrap();
    let mut b = ws_transport::connect(&url, 32).await.unwrap();
    next_with(&mut a, frame::CHANNEL_SUBSCRIBED).await;
    next_with(&mut b, frame::CHANNEL_SUBSCRIBED).await;

    let position = CursorPosition {
        x: 120.0,
        y: 80.0,
        scroll_x: 0.0,
        scroll_y: 400.0,
        user_id: "alice".into(),
        color: "#3B82F6".into(),
        pathname: "/about".into(),
        timestamp: 1,
    };
    a.sender().cursor_move(&position).unwrap();

    let got = next_with(&mut b, frame::CURSOR_MOVE).await;
    assert_eq!(got.cursor_position().unwrap(), position);
}

#[tokio::test]
async fn presence_follows_socket_lifetime() {
    let url = spawn_relay().await;
    let mut a = ws_transport::connect(&url, 32).await.unwrap();
    let mut b = ws_transport::connect(&url, 32).await.unwrap();
    next_with(&mut b, frame::CHANNEL_SUBSCRIBED).await;
    next_with(&mut a, frame::CHANNEL_SUBSCRIBED).await;

    a.sender().track("alice", &PresenceMeta { id: "alice".into(), is_mobile: false }).unwrap();
    loop {
        let keys = next_with(&mut b, frame::PRESENCE_SYNC).await.presence_keys().unwrap();
        if keys == vec!["alice".to_owned()] {
            break;
        }
    }

    drop(a);

    loop {
        let keys = next_with(&mut b, frame::PRESENCE_SYNC).await.presence_keys().unwrap();
        if keys.is_empty() {
            break;
        }
    }
}

#[tokio::test]
async fn invalid_text_gets_error_frame() {
    use futures::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let url = spawn_relay().await;
    let (mut stream, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    stream.send(Message::Text("not json".into())).await.unwrap();

    let error = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let Some(Ok(Message::Text(text))) = stream.next().await else {
                continue;
            };
            let frame = Frame::decode(text.as_str()).unwrap();
            if frame.syscall == frame::GATEWAY_ERROR {
                return frame;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(error.data.get(frame::FRAME_CODE).and_then(|v| v.as_str()), Some("E_INVALID_JSON"));
}
