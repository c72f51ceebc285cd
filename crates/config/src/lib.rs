use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "courier.toml",
    "config/courier.toml",
    "crates/config/courier.toml",
    "../courier.toml",
    "../config/courier.toml",
    "../crates/config/courier.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7700,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://courier.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Settings for bearer-token verification on incoming connections.
///
/// ```
/// use courier_config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.jwt_issuer, "courier");
/// assert_eq!(auth.handshake_timeout_secs, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_jwt_issuer")]
    pub jwt_issuer: String,
    #[serde(default = "AuthConfig::default_jwt_audience")]
    pub jwt_audience: String,
    /// Seconds an unauthenticated connection may wait for a credential
    /// before it is dropped.
    #[serde(default = "AuthConfig::default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_jwt_secret(),
            jwt_issuer: Self::default_jwt_issuer(),
            jwt_audience: Self::default_jwt_audience(),
            handshake_timeout_secs: Self::default_handshake_timeout(),
        }
    }
}

impl AuthConfig {
    fn default_jwt_secret() -> String {
        "courier-dev-secret".to_string()
    }

    fn default_jwt_issuer() -> String {
        "courier".to_string()
    }

    fn default_jwt_audience() -> String {
        "courier-clients".to_string()
    }

    const fn default_handshake_timeout() -> u64 {
        10
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory stored image payloads are written to.
    #[serde(default = "MediaConfig::default_upload_dir")]
    pub upload_dir: String,
    /// Public path prefix stored references are minted under.
    #[serde(default = "MediaConfig::default_public_base_path")]
    pub public_base_path: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: Self::default_upload_dir(),
            public_base_path: Self::default_public_base_path(),
        }
    }
}

impl MediaConfig {
    fn default_upload_dir() -> String {
        "uploads".to_string()
    }

    fn default_public_base_path() -> String {
        "/uploads".to_string()
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use courier_config::load;
///
/// std::env::remove_var("COURIER_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let db_max = defaults.database.max_connections as i64;
    let handshake_timeout = defaults.auth.handshake_timeout_secs;
    let handshake_timeout_i64 = if handshake_timeout > i64::MAX as u64 {
        i64::MAX
    } else {
        handshake_timeout as i64
    };

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default("database.max_connections", db_max)
        .unwrap()
        .set_default("auth.jwt_secret", defaults.auth.jwt_secret.clone())
        .unwrap()
        .set_default("auth.jwt_issuer", defaults.auth.jwt_issuer.clone())
        .unwrap()
        .set_default("auth.jwt_audience", defaults.auth.jwt_audience.clone())
        .unwrap()
        .set_default("auth.handshake_timeout_secs", handshake_timeout_i64)
        .unwrap()
        .set_default("media.upload_dir", defaults.media.upload_dir.clone())
        .unwrap()
        .set_default(
            "media.public_base_path",
            defaults.media.public_base_path.clone(),
        )
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("COURIER").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("COURIER_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via COURIER_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.handshake_timeout_secs > i64::MAX as u64 {
        config.auth.handshake_timeout_secs = i64::MAX as u64;
    }

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
