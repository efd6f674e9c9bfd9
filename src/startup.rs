//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::realtime::SessionRegistry;
use crate::application::services::{MediaBridge, MessagePipeline, Repositories};
use crate::config::{Settings, StorageBackend};
use crate::infrastructure::database;
use crate::infrastructure::media::{LocalMediaStorage, MediaStorage};
use crate::infrastructure::repositories::{
    MemoryStore, PgChannelRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::Gateway;
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub gateway: Arc<Gateway>,
    pub media: Arc<MediaBridge>,
    pub settings: Arc<Settings>,
    /// Present for the postgres backend only
    pub db: Option<PgPool>,
}

impl AppState {
    /// Wire the messaging core over the given stores.
    pub fn new(
        settings: Settings,
        repos: Repositories,
        storage: Arc<dyn MediaStorage>,
        db: Option<PgPool>,
    ) -> Self {
        let ids = Arc::new(SnowflakeGenerator::with_epoch(
            settings.snowflake.machine_id as u64,
            0,
            settings.snowflake.epoch,
        ));
        let registry = Arc::new(SessionRegistry::new());
        let pipeline = Arc::new(MessagePipeline::new(repos.clone(), registry.clone(), ids));

        let gateway = Arc::new(Gateway::new(
            repos.clone(),
            registry,
            pipeline.clone(),
            settings.history.limit,
            settings.websocket.outbound_buffer,
        ));
        let media = Arc::new(MediaBridge::new(
            repos.channels.clone(),
            storage,
            pipeline,
            settings.media.max_upload_size,
        ));

        Self {
            repos,
            gateway,
            media,
            settings: Arc::new(settings),
            db,
        }
    }
}

/// Router with the tracing, metrics and CORS layers applied
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state)
        .route_layer(axum::middleware::from_fn(logging::track_metrics))
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Repositories backed by one in-memory store
pub fn memory_repositories(store: MemoryStore) -> Repositories {
    let store = Arc::new(store);
    Repositories {
        channels: store.clone(),
        messages: store.clone(),
        users: store,
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    gateway: Arc<Gateway>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        let (repos, db) = match settings.storage.backend {
            StorageBackend::Postgres => {
                let pool = database::create_pool(&settings.database)
                    .await
                    .context("Failed to connect to the database")?;
                tracing::info!("Database connection pool created");

                if settings.database.run_migrations {
                    database::run_migrations(&pool)
                        .await
                        .context("Failed to run migrations")?;
                    tracing::info!("Database migrations applied");
                }

                let repos = Repositories {
                    channels: Arc::new(PgChannelRepository::new(pool.clone())),
                    messages: Arc::new(PgMessageRepository::new(pool.clone())),
                    users: Arc::new(PgUserRepository::new(pool.clone())),
                };
                (repos, Some(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using the in-memory store; nothing survives a restart");
                (memory_repositories(MemoryStore::new()), None)
            }
        };

        let storage = Arc::new(LocalMediaStorage::new(
            &settings.media.storage_path,
            settings.media.public_prefix.clone(),
        ));
        tokio::fs::create_dir_all(storage.base_path())
            .await
            .context("Failed to create the media directory")?;

        let addr = settings.server_addr();
        let state = AppState::new(settings, repos, storage, db);
        let gateway = state.gateway.clone();
        let router = build_router(state);

        // Bind to address
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router,
            gateway,
        })
    }

    /// Run the server until ctrl-c, then tear down every session
    pub async fn run_until_stopped(self) -> Result<()> {
        let gateway = self.gateway;
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal(gateway))
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal(gateway: Arc<Gateway>) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(?error, "Failed to listen for shutdown signal");
    }
    let sessions = gateway.shutdown();
    tracing::info!(sessions, "Shutdown signal received");
}
