//! Handlers for detection statistics.

use axum::extract::State;
use axum::Json;
use roadsign_db::models::stats::{DetectionStats, StatsScope};
use roadsign_db::repositories::StatsRepo;

use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::state::AppState;

/// GET /api/v1/stats
pub async fn detection_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DetectionStats>> {
    let stats = StatsRepo::detection_stats(&state.pool, StatsScope::User(auth.user_id)).await?;
    Ok(Json(stats))
}

/// GET /api/v1/global-stats
///
/// Scoped to the caller when authenticated, to every detection otherwise.
pub async fn global_stats(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
) -> AppResult<Json<DetectionStats>> {
    let scope = auth.user_id().map_or(StatsScope::Global, StatsScope::User);
    let stats = StatsRepo::detection_stats(&state.pool, scope).await?;
    Ok(Json(stats))
}
