use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Streaming detection endpoint, mounted at the root like `/health`.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws/detect", get(ws::ws_detect_handler))
}
