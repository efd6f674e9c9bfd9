//! Peer signalling relay

use pretty_assertions::assert_eq;
use serde_json::json;

use groupchat_server::application::realtime::{PeerSignal, ServerEvent};

use crate::common::TestApp;

fn peer_connected(peer_id: &str, channel_id: i64) -> serde_json::Value {
    json!({"event": "peerConnected", "data": {"peerId": peer_id, "channelId": channel_id}})
}

#[tokio::test]
async fn test_relay_reaches_everyone_but_the_origin() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);
    app.seed_user(30);

    let mut origin = app.connect(10);
    let mut b = app.connect(20);
    let mut c = app.connect(30);
    for session in [&mut origin, &mut b, &mut c] {
        session.join(1).await;
        session.recv().await;
    }

    origin.send(peer_connected("peer-abc", 1)).await;

    let expected = ServerEvent::PeerConnected(PeerSignal { peer_id: json!("peer-abc") });
    assert_eq!(b.recv().await, expected);
    assert_eq!(c.recv().await, expected);
    origin.assert_idle();
}

#[tokio::test]
async fn test_relay_in_empty_room_is_silent() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);

    let mut alone = app.connect(10);
    alone.join(1).await;
    alone.recv().await;

    alone.send(peer_connected("peer-abc", 1)).await;

    alone.assert_idle();
}

#[tokio::test]
async fn test_relay_from_outside_the_room_is_dropped() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);

    let mut member = app.connect(20);
    member.join(1).await;
    member.recv().await;

    let mut outsider = app.connect(10);
    outsider.send(peer_connected("peer-xyz", 1)).await;

    member.assert_idle();
    outsider.assert_idle();
}
