//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure. Every test app runs on
//! the in-memory store with media written to a temporary directory.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use fake::faker::name::en::Name;
use fake::Fake;
use mockall::mock;
use tempfile::TempDir;
use tokio::sync::mpsc;

use groupchat_server::application::realtime::{ClientEvent, ConnectionId, ServerEvent};
use groupchat_server::application::services::Repositories;
use groupchat_server::config::{Settings, StorageBackend};
use groupchat_server::domain::{Channel, ChannelRepository, Message, MessageRepository, User};
use groupchat_server::infrastructure::media::LocalMediaStorage;
use groupchat_server::infrastructure::repositories::MemoryStore;
use groupchat_server::presentation::websocket::Gateway;
use groupchat_server::shared::error::AppError;
use groupchat_server::startup::{build_router, memory_repositories, AppState};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

mock! {
    pub Messages {}

    #[async_trait]
    impl MessageRepository for Messages {
        async fn insert(&self, message: &Message) -> Result<i64, AppError>;
        async fn find_recent_by_channel(
            &self,
            channel_id: i64,
            limit: usize,
        ) -> Result<Vec<Message>, AppError>;
    }
}

mock! {
    pub Channels {}

    #[async_trait]
    impl ChannelRepository for Channels {
        async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError>;
        async fn save(&self, channel: &Channel) -> Result<(), AppError>;
        async fn append_message(&self, channel_id: i64, message_id: i64) -> Result<(), AppError>;
    }
}

/// A message store whose writes always fail.
pub fn failing_messages() -> MockMessages {
    let mut messages = MockMessages::new();
    messages
        .expect_find_recent_by_channel()
        .returning(|_, _| Ok(Vec::new()));
    messages
        .expect_insert()
        .returning(|_| Err(AppError::Internal("disk full".into())));
    messages
}

/// Settings for the in-memory backend
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.storage.backend = StorageBackend::Memory;
    settings.cors.allowed_origins = Vec::new();
    settings
}

/// Test application builder
pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
    pub media_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = MemoryStore::new();
        Self::with_repositories(settings, store.clone(), memory_repositories(store))
    }

    /// Use `repos` for the messaging core while seeding through `store`.
    pub fn with_repositories(mut settings: Settings, store: MemoryStore, repos: Repositories) -> Self {
        let media_dir = tempfile::tempdir().expect("Failed to create media dir");
        settings.media.storage_path = media_dir.path().to_string_lossy().into_owned();

        let storage = Arc::new(LocalMediaStorage::new(
            media_dir.path(),
            settings.media.public_prefix.clone(),
        ));
        let state = AppState::new(settings, repos, storage, None);

        Self {
            state,
            store,
            media_dir,
        }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.state.gateway
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(build_router(self.state.clone())).expect("Failed to start test server")
    }

    /// Serve the full router on an ephemeral local port.
    pub async fn spawn_http(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let router = build_router(self.state.clone());

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });

        addr
    }

    /// Create a user with a generated display name. Returns the user and token.
    pub fn seed_user(&self, id: i64) -> (User, String) {
        let name: String = Name().fake();
        let user = User::new(id, name, format!("user{}", id));
        let token = format!("token-{}", id);
        self.store.insert_user(user.clone(), token.clone());
        (user, token)
    }

    pub fn seed_channel(&self, id: i64) -> Channel {
        let channel = Channel::new(id, format!("channel-{}", id));
        self.store.insert_channel(channel.clone());
        channel
    }

    /// Register a session for `user_id` as the WebSocket handler would.
    pub fn connect(&self, user_id: i64) -> TestSession {
        let (id, outbound) = self
            .gateway()
            .connect(user_id)
            .expect("Gateway is not accepting sessions");
        TestSession {
            id,
            user_id,
            outbound,
            gateway: self.gateway().clone(),
        }
    }
}

/// One connected client, driven directly through the gateway.
pub struct TestSession {
    pub id: ConnectionId,
    pub user_id: i64,
    pub outbound: mpsc::Receiver<ServerEvent>,
    gateway: Arc<Gateway>,
}

impl TestSession {
    pub async fn send(&self, event: serde_json::Value) {
        let event: ClientEvent = serde_json::from_value(event).expect("Invalid test event");
        self.gateway.handle(self.id, event).await;
    }

    pub async fn join(&self, channel_id: i64) {
        self.send(serde_json::json!({
            "event": "joinChannel",
            "data": {"channelId": channel_id.to_string(), "userId": self.user_id.to_string()}
        }))
        .await;
    }

    pub async fn say(&self, channel_id: i64, text: &str) {
        self.send(serde_json::json!({
            "event": "sendMessage",
            "data": {
                "channelId": channel_id.to_string(),
                "userId": self.user_id.to_string(),
                "messageType": "text",
                "text": text
            }
        }))
        .await;
    }

    pub async fn recv(&mut self) -> ServerEvent {
        tokio::time::timeout(RECV_TIMEOUT, self.outbound.recv())
            .await
            .expect("Timed out waiting for an event")
            .expect("Session queue closed")
    }

    /// Nothing is queued right now.
    pub fn assert_idle(&mut self) {
        match self.outbound.try_recv() {
            Err(mpsc::error::TryRecvError::Empty) => {}
            Err(mpsc::error::TryRecvError::Disconnected) => {}
            Ok(event) => panic!("unexpected event {:?}", event),
        }
    }

    pub fn disconnect(&self) {
        self.gateway.disconnect(self.id);
    }
}
