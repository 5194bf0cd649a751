use super::*;
use crate::frame::{CursorPosition, PresenceMeta};

fn position(user_id: &str) -> CursorPosition {
    CursorPosition {
        x: 10.0,
        y: 20.0,
        scroll_x: 0.0,
        scroll_y: 0.0,
        user_id: user_id.into(),
        color: "#3B82F6".into(),
        pathname: "/".into(),
        timestamp: 1,
    }
}

fn meta(id: &str) -> PresenceMeta {
    PresenceMeta { id: id.into(), is_mobile: false }
}

/// Drain everything currently queued.
fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Frame> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(frame);
    }
    out
}

#[tokio::test]
async fn join_sends_subscribed_then_snapshot() {
    let hub = Hub::new(16);
    let (_, mut rx) = hub.join().await;

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].syscall, frame::CHANNEL_SUBSCRIBED);
    assert_eq!(frames[1].syscall, frame::PRESENCE_SYNC);
    assert_eq!(frames[1].presence_keys().unwrap(), Vec::<String>::new());
}

#[tokio::test]
async fn cursor_move_reaches_peers_but_not_sender() {
    let hub = Hub::new(16);
    let (a, mut rx_a) = hub.join().await;
    let (_, mut rx_b) = hub.join().await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    hub.handle(a, Frame::cursor_move(&position("alice"))).await.unwrap();

    assert!(drain(&mut rx_a).is_empty());
    let got = drain(&mut rx_b);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].from.as_deref(), Some(a.to_string().as_str()));
    assert_eq!(got[0].cursor_position().unwrap().user_id, "alice");
}

#[tokio::test]
async fn track_syncs_every_client_including_sender() {
    let hub = Hub::new(16);
    let (a, mut rx_a) = hub.join().await;
    let (_, mut rx_b) = hub.join().await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    hub.handle(a, Frame::presence_track("alice", &meta("alice"))).await.unwrap();

    for rx in [&mut rx_a, &mut rx_b] {
        let got = drain(rx);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].presence_keys().unwrap(), vec!["alice".to_owned()]);
    }
    assert_eq!(hub.presence_keys().await, vec!["alice".to_owned()]);
}

#[tokio::test]
async fn retrack_replaces_previous_key() {
    let hub = Hub::new(16);
    let (a, _rx) = hub.join().await;

    hub.handle(a, Frame::presence_track("first", &meta("first"))).await.unwrap();
    hub.handle(a, Frame::presence_track("second", &meta("second"))).await.unwrap();

    assert_eq!(hub.presence_keys().await, vec!["second".to_owned()]);
}

#[tokio::test]
async fn shared_key_survives_until_last_owner_leaves() {
    let hub = Hub::new(16);
    let (a, _rx_a) = hub.join().await;
    let (b, _rx_b) = hub.join().await;
    hub.handle(a, Frame::presence_track("dup", &meta("dup"))).await.unwrap();
    hub.handle(b, Frame::presence_track("dup", &meta("dup"))).await.unwrap();
    assert_eq!(hub.presence_keys().await, vec!["dup".to_owned()]);

    hub.leave(b).await;
    assert_eq!(hub.presence_keys().await, vec!["dup".to_owned()]);

    hub.leave(a).await;
    assert!(hub.presence_keys().await.is_empty());
}

#[tokio::test]
async fn leave_drops_presence_and_resyncs() {
    let hub = Hub::new(16);
    let (a, _rx_a) = hub.join().await;
    let (b, mut rx_b) = hub.join().await;
    hub.handle(a, Frame::presence_track("alice", &meta("alice"))).await.unwrap();
    hub.handle(b, Frame::presence_track("bob", &meta("bob"))).await.unwrap();
    drain(&mut rx_b);

    hub.leave(a).await;

    let got = drain(&mut rx_b);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].presence_keys().unwrap(), vec!["bob".to_owned()]);
    assert_eq!(hub.client_count().await, 1);
}

#[tokio::test]
async fn untrack_without_presence_is_silent() {
    let hub = Hub::new(16);
    let (a, mut rx_a) = hub.join().await;
    drain(&mut rx_a);

    hub.handle(a, Frame::presence_untrack()).await.unwrap();

    assert!(drain(&mut rx_a).is_empty());
}

#[tokio::test]
async fn unknown_syscall_reports_error_to_sender() {
    let hub = Hub::new(16);
    let (a, mut rx_a) = hub.join().await;
    drain(&mut rx_a);

    let err = hub.handle(a, Frame::new("chat:send", Data::new())).await.unwrap_err();
    assert_eq!(err.error_code(), "E_UNKNOWN_SYSCALL");

    let got = drain(&mut rx_a);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].syscall, frame::GATEWAY_ERROR);
    assert_eq!(got[0].data.get(frame::FRAME_CODE).and_then(|v| v.as_str()), Some("E_UNKNOWN_SYSCALL"));
}

#[tokio::test]
async fn track_without_key_is_rejected() {
    let hub = Hub::new(16);
    let (a, _rx) = hub.join().await;

    let err = hub.handle(a, Frame::new(frame::PRESENCE_TRACK, Data::new())).await.unwrap_err();
    assert!(matches!(err, HubError::MissingKey));
    assert!(hub.presence_keys().await.is_empty());
}

#[tokio::test]
async fn full_client_queue_does_not_block_broadcast() {
    let hub = Hub::new(2);
    let (a, _rx_a) = hub.join().await;
    // Never drained: join already filled both slots.
    let (_, _rx_b) = hub.join().await;
    let (_, mut rx_c) = hub.join().await;
    drain(&mut rx_c);

    hub.handle(a, Frame::cursor_move(&position("alice"))).await.unwrap();

    assert_eq!(drain(&mut rx_c).len(), 1);
}
