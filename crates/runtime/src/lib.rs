use anyhow::{Context, Result};
use courier_config::AppConfig;
use courier_database::initialize_database;
use courier_gateway::GatewayState;
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything a running backend needs: the migrated database pool and the
/// fully wired gateway state on top of it.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub gateway: GatewayState,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let gateway = GatewayState::new(db_pool.clone(), config);

        info!(
            database = %config.database.url,
            handshake_timeout_secs = config.auth.handshake_timeout_secs,
            "backend services ready"
        );

        Ok(Self { db_pool, gateway })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
