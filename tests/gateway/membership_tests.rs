//! Joining channel rooms

use pretty_assertions::assert_eq;
use serde_json::json;

use groupchat_server::application::realtime::ServerEvent;
use groupchat_server::application::services::BANNED_REASON;

use crate::common::TestApp;

#[tokio::test]
async fn test_join_replays_empty_history_then_echoes_messages() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(20);

    let mut a = app.connect(10);
    let mut b = app.connect(20);

    a.join(1).await;
    assert_eq!(a.recv().await, ServerEvent::PreviousMessages(Vec::new()));
    b.join(1).await;
    assert_eq!(b.recv().await, ServerEvent::PreviousMessages(Vec::new()));

    a.say(1, "hi").await;

    for session in [&mut a, &mut b] {
        match session.recv().await {
            ServerEvent::NewMessage(view) => {
                assert_eq!(view.text.as_deref(), Some("hi"));
                assert_eq!(view.message_type.as_str(), "text");
                assert_eq!(view.sender_id, 10);
                assert_eq!(view.sender.map(|s| s.username), Some("user10".to_string()));
            }
            other => panic!("expected newMessage, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_banned_user_cannot_join_or_broadcast() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    app.seed_user(66);
    app.store.ban_user(1, 66);

    let mut member = app.connect(10);
    member.join(1).await;
    member.recv().await;

    let mut banned = app.connect(66);
    banned.join(1).await;
    assert_eq!(banned.recv().await, ServerEvent::Error(BANNED_REASON.to_string()));
    assert!(!app.gateway().registry().is_in_room(banned.id, 1));

    banned.say(1, "let me in").await;
    assert!(matches!(banned.recv().await, ServerEvent::Error(_)));
    member.assert_idle();
    assert_eq!(app.store.message_count(), 0);
}

#[tokio::test]
async fn test_join_unknown_channel_reports_not_found() {
    let app = TestApp::new();
    app.seed_user(10);
    let mut session = app.connect(10);

    session.join(404).await;

    assert_eq!(session.recv().await, ServerEvent::Error("Channel not found.".into()));
    assert_eq!(app.gateway().registry().room_size(404), 0);
}

#[tokio::test]
async fn test_rejoin_only_replays_history_again() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    let mut session = app.connect(10);

    session.join(1).await;
    session.recv().await;
    session.say(1, "first").await;
    session.recv().await;

    session.join(1).await;
    match session.recv().await {
        ServerEvent::PreviousMessages(history) => assert_eq!(history.len(), 1),
        other => panic!("expected previousMessages, got {:?}", other),
    }
    assert_eq!(app.gateway().registry().room_size(1), 1);
}

#[tokio::test]
async fn test_claimed_user_id_must_match_session() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_user(10);
    let mut session = app.connect(10);

    session
        .send(json!({"event": "joinChannel", "data": {"channelId": "1", "userId": "11"}}))
        .await;

    assert!(matches!(session.recv().await, ServerEvent::Error(_)));
    assert!(!app.gateway().registry().is_in_room(session.id, 1));
}

#[tokio::test]
async fn test_disconnect_leaves_every_room() {
    let app = TestApp::new();
    app.seed_channel(1);
    app.seed_channel(2);
    app.seed_user(10);
    app.seed_user(20);

    let mut stays = app.connect(10);
    let mut leaves = app.connect(20);
    for channel_id in [1, 2] {
        stays.join(channel_id).await;
        stays.recv().await;
        leaves.join(channel_id).await;
        leaves.recv().await;
    }

    leaves.disconnect();
    assert_eq!(app.gateway().session_count(), 1);

    stays.say(1, "still here?").await;
    stays.say(2, "anyone?").await;
    assert!(matches!(stays.recv().await, ServerEvent::NewMessage(_)));
    assert!(matches!(stays.recv().await, ServerEvent::NewMessage(_)));

    assert_eq!(app.gateway().registry().room_size(1), 1);
    assert_eq!(app.gateway().registry().room_size(2), 1);
    assert!(leaves.outbound.recv().await.is_none());
}
