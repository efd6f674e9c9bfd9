//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Which repository implementation backs the messaging layer
    pub storage: StorageSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// WebSocket configuration
    pub websocket: WebSocketSettings,

    /// History replay configuration
    pub history: HistorySettings,

    /// Media upload configuration
    pub media: MediaSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

/// Repository backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-31)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (empty = any)
    pub allowed_origins: Vec<String>,
}

/// WebSocket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketSettings {
    /// Maximum inbound message size in bytes (default: 64KB)
    pub max_message_size: usize,

    /// Inbound events queued per connection before the reader waits
    pub inbound_buffer: usize,

    /// Outbound events queued per session; a full queue evicts the session
    pub outbound_buffer: usize,
}

/// History replay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Messages replayed to a newly joined session
    pub limit: usize,
}

/// Media upload configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSettings {
    /// Directory uploaded files are written to
    pub storage_path: String,

    /// URL prefix under which stored files are served
    pub public_prefix: String,

    /// Maximum accepted upload size in bytes
    pub max_upload_size: usize,
}

/// Upper bound for `history.limit`
pub const MAX_HISTORY_LIMIT: usize = 500;

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".into(),
                port: 4000,
            },
            database: DatabaseSettings {
                url: String::new(),
                max_connections: 10,
                min_connections: 2,
                acquire_timeout: 30,
                run_migrations: true,
            },
            storage: StorageSettings {
                backend: StorageBackend::Postgres,
            },
            snowflake: SnowflakeSettings {
                machine_id: 1,
                epoch: crate::shared::snowflake::DEFAULT_EPOCH,
            },
            cors: CorsSettings {
                allowed_origins: vec!["http://localhost:3000".into()],
            },
            websocket: WebSocketSettings {
                max_message_size: 65_536,
                inbound_buffer: 32,
                outbound_buffer: 256,
            },
            history: HistorySettings { limit: 50 },
            media: MediaSettings {
                storage_path: "uploads/media".into(),
                public_prefix: "/media".into(),
                max_upload_size: 26_214_400, // 25MB
            },
            environment: "development".into(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. Built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the resulting settings are inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let defaults = Config::try_from(&Settings::default())?;

        let settings: Self = Config::builder()
            .add_source(defaults)
            .set_override("environment", environment.clone())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=4000 -> server.port = 4000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("storage.backend", std::env::var("STORAGE_BACKEND").ok())?
            .set_override_option(
                "media.storage_path",
                std::env::var("MEDIA_STORAGE_PATH").ok(),
            )?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.limit == 0 || self.history.limit > MAX_HISTORY_LIMIT {
            return Err(ConfigError::Message(format!(
                "history.limit must be between 1 and {}, got {}",
                MAX_HISTORY_LIMIT, self.history.limit
            )));
        }
        if self.websocket.inbound_buffer == 0 || self.websocket.outbound_buffer == 0 {
            return Err(ConfigError::Message(
                "websocket buffers must hold at least one event".into(),
            ));
        }
        if self.storage.backend == StorageBackend::Postgres && self.database.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "database.url (or DATABASE_URL) is required for the postgres backend".into(),
            ));
        }
        let prefix = self.media.public_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') {
            return Err(ConfigError::Message(
                "media.public_prefix must start with '/' and not be the root".into(),
            ));
        }
        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
