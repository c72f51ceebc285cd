//! Shared application state for the gateway

use std::sync::Arc;
use std::time::Duration;

use courier_config::AppConfig;
use courier_database::SqlitePool;
use courier_rooms::{MediaStore, MessageService, RoomService};
use courier_users::{TokenVerifier, UserDirectory};

use crate::broadcast::BroadcastEngine;
use crate::error::{GatewayError, GatewayResult};
use crate::index::RoomIndex;
use crate::ingest::MessagePipeline;
use crate::registry::SessionRegistry;

/// Shared application state wiring every service the wire surface needs.
#[derive(Clone)]
pub struct GatewayState {
    /// Database connection pool
    pub pool: SqlitePool,
    /// How long a fresh connection may take to present valid credentials
    pub handshake_window: Duration,
    /// Bearer token verification
    pub verifier: Arc<TokenVerifier>,
    /// User directory lookups and presence flags
    pub directory: UserDirectory,
    /// Room store operations
    pub rooms: RoomService,
    /// Message store operations
    pub messages: MessageService,
    /// Image payload storage
    pub media: MediaStore,
    /// Live sessions keyed by user
    pub registry: SessionRegistry,
    /// Per-session room subscriptions
    pub index: RoomIndex,
    /// Room fan-out
    pub broadcast: BroadcastEngine,
    /// Message ingestion
    pub pipeline: MessagePipeline,
}

impl GatewayState {
    /// Build the full state on top of an initialized database pool.
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        let verifier = Arc::new(TokenVerifier::from_config(&config.auth));
        let directory = UserDirectory::new(pool.clone());
        let rooms = RoomService::new(pool.clone());
        let messages = MessageService::new(pool.clone());
        let media = MediaStore::new(&config.media);

        let registry = SessionRegistry::new();
        let index = RoomIndex::new(rooms.clone());
        let broadcast = BroadcastEngine::new(registry.clone(), index.clone());
        let pipeline = MessagePipeline::new(
            directory.clone(),
            rooms.clone(),
            messages.clone(),
            media.clone(),
            broadcast.clone(),
        );

        Self {
            pool,
            handshake_window: Duration::from_secs(config.auth.handshake_timeout_secs),
            verifier,
            directory,
            rooms,
            messages,
            media,
            registry,
            index,
            broadcast,
            pipeline,
        }
    }

    /// Initialize the database and build the state from configuration.
    pub async fn from_config(config: &AppConfig) -> GatewayResult<Self> {
        let pool = courier_database::initialize_database(&config.database)
            .await
            .map_err(|e| {
                GatewayError::Database(format!("Failed to initialize database: {}", e))
            })?;

        Ok(Self::new(pool, config))
    }
}
