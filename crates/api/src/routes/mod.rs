pub mod auth;
pub mod detection;
pub mod health;
pub mod stream;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /detect                  one-shot detection (POST, optional auth)
/// /detect/annotated        detection with boxes drawn (POST, optional auth)
/// /detections              caller's history (GET, requires auth)
/// /stats                   caller's statistics (GET, requires auth)
/// /global-stats            caller or global statistics (GET, optional auth)
///
/// /auth/register           create account (POST)
/// /auth/login              login (POST)
/// /auth/profile            current user (GET, requires auth)
/// /auth/profile/stats      current user's totals (GET, requires auth)
/// /auth/account            delete account (DELETE, requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(detection::router())
        .nest("/auth", auth::router())
}
