//! Route definitions for the `/auth` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /register       -> register
/// POST   /login          -> login
/// GET    /profile        -> profile (requires auth)
/// GET    /profile/stats  -> profile_stats (requires auth)
/// DELETE /account        -> delete_account (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/profile", get(auth::profile))
        .route("/profile/stats", get(auth::profile_stats))
        .route("/account", delete(auth::delete_account))
}
