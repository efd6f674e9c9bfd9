//! Message ingestion and broadcast

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use groupchat_server::application::realtime::ServerEvent;
use groupchat_server::application::services::{Repositories, BANNED_REASON, NOT_JOINED_REASON};
use groupchat_server::domain::Channel;
use groupchat_server::infrastructure::repositories::MemoryStore;
use groupchat_server::shared::error::AppError;

use crate::common::{failing_messages, test_settings, MockChannels, TestApp};

#[tokio::test]
async fn test_send_without_join_is_rejected() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);

    let mut listener = app.connect(20);
    listener.join(1).await;
    listener.recv().await;

    let mut stranger = app.connect(10);
    stranger.say(1, "hello?").await;

    assert_eq!(stranger.recv().await, ServerEvent::Error(NOT_JOINED_REASON.into()));
    listener.assert_idle();
    assert_eq!(app.store.message_count(), 0);
}

#[tokio::test]
async fn test_ban_after_join_stops_sending() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);

    let mut troll = app.connect(10);
    let mut other = app.connect(20);
    for session in [&mut troll, &mut other] {
        session.join(1).await;
        session.recv().await;
    }

    app.store.ban_user(1, 10);
    troll.say(1, "spam").await;

    assert_eq!(troll.recv().await, ServerEvent::Error(BANNED_REASON.into()));
    assert!(!app.gateway().registry().is_in_room(troll.id, 1));
    other.assert_idle();
}

#[tokio::test]
async fn test_ban_after_join_stops_receiving() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);

    let mut speaker = app.connect(10);
    let mut banned = app.connect(20);
    for session in [&mut speaker, &mut banned] {
        session.join(1).await;
        session.recv().await;
    }

    app.store.ban_user(1, 20);
    speaker.say(1, "you can't read this").await;

    assert!(matches!(speaker.recv().await, ServerEvent::NewMessage(_)));
    banned.assert_idle();
    assert!(!app.gateway().registry().is_in_room(banned.id, 1));
    assert_eq!(app.gateway().registry().room_size(1), 1);
}

#[tokio::test]
async fn test_broadcast_stays_in_its_room() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_channel(2);
    app.seed_user(10);
    app.seed_user(20);
    app.seed_user(30);

    let mut a = app.connect(10);
    let mut b = app.connect(20);
    let mut elsewhere = app.connect(30);
    a.join(1).await;
    a.recv().await;
    b.join(1).await;
    b.recv().await;
    elsewhere.join(2).await;
    elsewhere.recv().await;

    a.say(1, "room one only").await;

    assert!(matches!(a.recv().await, ServerEvent::NewMessage(_)));
    assert!(matches!(b.recv().await, ServerEvent::NewMessage(_)));
    elsewhere.assert_idle();
}

#[tokio::test]
async fn test_invalid_payloads_are_reported_to_sender_only() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);

    let mut sender = app.connect(10);
    let mut other = app.connect(20);
    for session in [&mut sender, &mut other] {
        session.join(1).await;
        session.recv().await;
    }

    sender
        .send(json!({
            "event": "sendMessage",
            "data": {"channelId": "1", "messageType": "text", "text": "   "}
        }))
        .await;
    assert_eq!(
        sender.recv().await,
        ServerEvent::Error("Text messages require non-empty text.".into())
    );

    sender
        .send(json!({
            "event": "sendMessage",
            "data": {"channelId": "1", "messageType": "image"}
        }))
        .await;
    assert_eq!(
        sender.recv().await,
        ServerEvent::Error("Media messages require a media reference.".into())
    );

    sender
        .send(json!({
            "event": "sendMessage",
            "data": {"channelId": "1", "messageType": "text", "text": "x".repeat(4001)}
        }))
        .await;
    assert!(matches!(sender.recv().await, ServerEvent::Error(_)));

    other.assert_idle();
    assert_eq!(app.store.message_count(), 0);
}

#[tokio::test]
async fn test_persistence_failure_is_reported_to_sender_only() {
    let store = MemoryStore::new();
    let repos = Repositories {
        channels: Arc::new(store.clone()),
        messages: Arc::new(failing_messages()),
        users: Arc::new(store.clone()),
    };
    let app = TestApp::with_repositories(test_settings(), store, repos);
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);

    let mut sender = app.connect(10);
    let mut other = app.connect(20);
    for session in [&mut sender, &mut other] {
        session.join(1).await;
        session.recv().await;
    }

    sender.say(1, "lost").await;

    assert_eq!(
        sender.recv().await,
        ServerEvent::Error("Error sending the message.".into())
    );
    other.assert_idle();

    // The connection stays usable
    sender.join(1).await;
    assert_eq!(sender.recv().await, ServerEvent::PreviousMessages(Vec::new()));
}

#[tokio::test]
async fn test_failed_reference_append_leaves_hidden_orphan() {
    let store = MemoryStore::new();
    let mut channels = MockChannels::new();
    channels
        .expect_find_by_id()
        .returning(|id| Ok(Some(Channel::new(id, "general"))));
    channels
        .expect_append_message()
        .times(1)
        .returning(|_, _| Err(AppError::Internal("connection reset".into())));

    let repos = Repositories {
        channels: Arc::new(channels),
        messages: Arc::new(store.clone()),
        users: Arc::new(store.clone()),
    };
    let app = TestApp::with_repositories(test_settings(), store, repos);
    app.seed_user(10);
    app.seed_user(20);
    app.seed_user(30);

    let mut sender = app.connect(10);
    let mut other = app.connect(20);
    for session in [&mut sender, &mut other] {
        session.join(1).await;
        session.recv().await;
    }

    sender.say(1, "half written").await;

    assert_eq!(
        sender.recv().await,
        ServerEvent::Error("Error sending the message.".into())
    );
    other.assert_idle();
    assert_eq!(app.store.message_count(), 1);

    let mut latecomer = app.connect(30);
    latecomer.join(1).await;
    assert_eq!(latecomer.recv().await, ServerEvent::PreviousMessages(Vec::new()));
}

#[tokio::test]
async fn test_slow_consumer_is_evicted() {
    let mut settings = test_settings();
    settings.websocket.outbound_buffer = 2;
    let app = TestApp::with_settings(settings);
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);

    let mut fast = app.connect(10);
    let slow = app.connect(20);
    fast.join(1).await;
    fast.recv().await;
    // history batch takes one slot of the slow session's queue
    slow.join(1).await;

    fast.say(1, "one").await;
    fast.recv().await;
    assert_eq!(app.gateway().session_count(), 2);

    fast.say(1, "two").await;
    fast.recv().await;

    assert_eq!(app.gateway().session_count(), 1);
    assert_eq!(app.gateway().registry().room_size(1), 1);
}
