use roadsign_pipeline::DetectorConfig;

use crate::auth::jwt::JwtConfig;
use crate::ws::DEFAULT_HEARTBEAT_SECS;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// SQLite connection string (default: `sqlite://roadsign.db`).
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body in bytes (default: 10 MiB).
    pub max_upload_bytes: usize,
    /// Store detections made without an identity (default: `true`).
    pub persist_anonymous: bool,
    /// Seconds between keep-alive pings to streaming sessions (default: `30`).
    pub ws_heartbeat_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Model and inference pool settings.
    pub detector: DetectorConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `DATABASE_URL`         | `sqlite://roadsign.db`     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `60`                       |
    /// | `MAX_UPLOAD_BYTES`     | `10485760`                 |
    /// | `PERSIST_ANONYMOUS`    | `true`                     |
    /// | `WS_HEARTBEAT_SECS`    | `30`                       |
    ///
    /// See [`JwtConfig::from_env`] and [`DetectorConfig::from_env`] for the rest.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://roadsign.db".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "10485760".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let persist_anonymous: bool = std::env::var("PERSIST_ANONYMOUS")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("PERSIST_ANONYMOUS must be true or false");

        let ws_heartbeat_secs: u64 = std::env::var("WS_HEARTBEAT_SECS")
            .map(|v| v.parse().expect("WS_HEARTBEAT_SECS must be a valid u64"))
            .unwrap_or(DEFAULT_HEARTBEAT_SECS);
        assert!(ws_heartbeat_secs > 0, "WS_HEARTBEAT_SECS must be at least 1");

        Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            persist_anonymous,
            ws_heartbeat_secs,
            jwt: JwtConfig::from_env(),
            detector: DetectorConfig::from_env(),
        }
    }
}
