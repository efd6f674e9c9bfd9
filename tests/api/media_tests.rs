//! Media upload endpoint tests

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use pretty_assertions::assert_eq;
use serde_json::Value;

use groupchat_server::application::realtime::ServerEvent;
use groupchat_server::application::services::Repositories;
use groupchat_server::domain::MessageType;
use groupchat_server::infrastructure::repositories::MemoryStore;

use crate::common::{failing_messages, test_settings, TestApp};

fn image_form(bytes: &'static [u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes).file_name("cat photo.png").mime_type("image/png"),
    )
}

#[tokio::test]
async fn test_upload_is_stored_broadcast_and_served() {
    let app = TestApp::new();
    app.seed_channel(1);
    let (_, token) = app.seed_user(10);
    app.seed_user(20);

    let mut watcher = app.connect(20);
    watcher.join(1).await;
    watcher.recv().await;

    let server = app.server();
    let response = server
        .post("/api/channels/1/media")
        .authorization_bearer(&token)
        .multipart(image_form(b"\x89PNG not really"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["messageType"], "image");
    assert_eq!(body["senderId"], "10");
    assert!(body.get("text").is_none());

    let media_ref = body["mediaRef"].as_str().unwrap().to_string();
    assert!(media_ref.starts_with("/media/"));
    assert!(media_ref.ends_with("-cat_photo.png"));

    match watcher.recv().await {
        ServerEvent::NewMessage(view) => {
            assert_eq!(view.message_type, MessageType::Image);
            assert_eq!(view.media_ref.as_deref(), Some(media_ref.as_str()));
        }
        other => panic!("expected newMessage, got {:?}", other),
    }

    let served = server.get(&media_ref).await;
    served.assert_status_ok();
    assert_eq!(served.as_bytes().as_ref(), b"\x89PNG not really");
}

#[tokio::test]
async fn test_declared_type_overrides_mime() {
    let app = TestApp::new();
    app.seed_channel(1);
    let (_, token) = app.seed_user(10);

    let form = MultipartForm::new()
        .add_text("messageType", "audio")
        .add_part(
            "file",
            Part::bytes(b"OggS".as_slice())
                .file_name("note.bin")
                .mime_type("application/octet-stream"),
        );

    let response = app
        .server()
        .post("/api/channels/1/media")
        .authorization_bearer(&token)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["messageType"], "audio");
}

#[tokio::test]
async fn test_upload_requires_token() {
    let app = TestApp::new();
    app.seed_channel(1);

    let response = app
        .server()
        .post("/api/channels/1/media")
        .multipart(image_form(b"png"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_to_unknown_channel_is_not_found() {
    let app = TestApp::new();
    let (_, token) = app.seed_user(10);

    let response = app
        .server()
        .post("/api/channels/404/media")
        .authorization_bearer(&token)
        .multipart(image_form(b"png"))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_banned_uploader_is_forbidden_and_nothing_is_stored() {
    let app = TestApp::new();
    app.seed_channel(1);
    let (_, token) = app.seed_user(66);
    app.store.ban_user(1, 66);

    let response = app
        .server()
        .post("/api/channels/1/media")
        .authorization_bearer(&token)
        .multipart(image_form(b"png"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(app.store.message_count(), 0);
    assert_eq!(std::fs::read_dir(app.media_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_failed_ingest_removes_stored_file() {
    let store = MemoryStore::new();
    let repos = Repositories {
        channels: Arc::new(store.clone()),
        messages: Arc::new(failing_messages()),
        users: Arc::new(store.clone()),
    };
    let app = TestApp::with_repositories(test_settings(), store, repos);
    app.seed_channel(1);
    let (_, token) = app.seed_user(10);

    let response = app
        .server()
        .post("/api/channels/1/media")
        .authorization_bearer(&token)
        .multipart(image_form(b"png"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(std::fs::read_dir(app.media_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unsupported_empty_and_oversized_files_are_rejected() {
    let mut settings = test_settings();
    settings.media.max_upload_size = 16;
    let app = TestApp::with_settings(settings);
    app.seed_channel(1);
    let (_, token) = app.seed_user(10);
    let server = app.server();

    let pdf = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"%PDF".as_slice())
            .file_name("doc.pdf")
            .mime_type("application/pdf"),
    );
    let empty = image_form(b"");
    let oversized = image_form(b"0123456789abcdef0123456789abcdef");

    for form in [pdf, empty, oversized] {
        server
            .post("/api/channels/1/media")
            .authorization_bearer(&token)
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    assert_eq!(app.store.message_count(), 0);
}
