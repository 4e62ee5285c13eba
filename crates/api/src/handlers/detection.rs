//! Handlers for one-shot detection and detection history.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use roadsign_core::detection::DetectionBox;
use roadsign_db::models::detection::StoredDetection;
use roadsign_db::repositories::DetectionRepo;
use roadsign_pipeline::annotate::to_png_data_uri;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::persistence::{persist, PersistPolicy};
use crate::state::AppState;

/// How many history entries `GET /detections` returns.
const HISTORY_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for both detect endpoints.
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    /// `data:<mime>;base64,<data>`
    #[serde(default)]
    pub image: Option<String>,
}

impl DetectRequest {
    /// Unwrap the body, turning a malformed one into a `{error, code}` 400
    /// instead of axum's plain-text rejection.
    fn image_from(body: Result<Json<Self>, JsonRejection>) -> AppResult<String> {
        let Json(input) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
        input.into_image()
    }

    fn into_image(self) -> AppResult<String> {
        self.image
            .filter(|image| !image.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("No image provided".into()))
    }
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    /// The stored history row, or `null` when nothing was persisted.
    pub detection: Option<StoredDetection>,
    pub detections: Vec<DetectionBox>,
    pub processing_time: f64,
    pub detections_count: usize,
    pub confidence_avg: f64,
}

#[derive(Debug, Serialize)]
pub struct AnnotatedResponse {
    pub detections: Vec<DetectionBox>,
    pub processing_time: f64,
    pub detections_count: usize,
    pub confidence_avg: f64,
    /// The input frame with boxes drawn, as a PNG data URI.
    pub annotated_image: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/detect
///
/// Detect signs in one frame and, subject to the persistence policy, store
/// the result. Anonymous callers are accepted.
pub async fn detect(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
    body: Result<Json<DetectRequest>, JsonRejection>,
) -> AppResult<Json<DetectResponse>> {
    let image = DetectRequest::image_from(body)?;

    let summary = state.inference.detect_data_uri(image).await;
    if let Some(error) = &summary.error {
        return Err(AppError::Detection(error.clone()));
    }

    let policy = PersistPolicy {
        persist_anonymous: state.config.persist_anonymous,
    };
    let detection = persist(&state.pool, policy, &summary, auth.user_id()).await?;

    Ok(Json(DetectResponse {
        detection,
        detections: summary.detections,
        processing_time: summary.processing_time,
        detections_count: summary.detections_count,
        confidence_avg: summary.confidence_avg,
    }))
}

/// POST /api/v1/detect/annotated
///
/// Detect signs and return the frame with boxes drawn. Never persists.
pub async fn detect_annotated(
    State(state): State<AppState>,
    body: Result<Json<DetectRequest>, JsonRejection>,
) -> AppResult<Json<AnnotatedResponse>> {
    let image = DetectRequest::image_from(body)?;

    let result = state
        .inference
        .annotate_data_uri(image)
        .await
        .map_err(|e| AppError::Detection(e.to_string()))?;

    let annotated_image = to_png_data_uri(&result.annotated)
        .map_err(|e| AppError::InternalError(format!("PNG encoding error: {e}")))?;

    let summary = result.summary;
    Ok(Json(AnnotatedResponse {
        detections: summary.detections,
        processing_time: summary.processing_time,
        detections_count: summary.detections_count,
        confidence_avg: summary.confidence_avg,
        annotated_image,
    }))
}

/// GET /api/v1/detections
///
/// The caller's most recent detections, newest first.
pub async fn list_detections(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<StoredDetection>>> {
    let detections = DetectionRepo::list_for_user(&state.pool, auth.user_id, HISTORY_LIMIT).await?;
    Ok(Json(detections))
}
