use std::sync::Arc;

use roadsign_pipeline::InferencePool;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: roadsign_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Streaming session registry.
    pub ws_manager: Arc<WsManager>,
    /// Bounded executor around the shared detector.
    pub inference: InferencePool,
}
