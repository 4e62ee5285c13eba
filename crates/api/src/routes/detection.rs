use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{detection, stats};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/detect", post(detection::detect))
        .route("/detect/annotated", post(detection::detect_annotated))
        .route("/detections", get(detection::list_detections))
        .route("/stats", get(stats::detection_stats))
        .route("/global-stats", get(stats::global_stats))
}
