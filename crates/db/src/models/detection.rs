//! Detection history rows.

use roadsign_core::detection::DetectionBox;
use roadsign_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `detections` table: one persisted summary.
#[derive(Debug, Clone, FromRow)]
pub struct Detection {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub timestamp: Timestamp,
    pub detections_count: i64,
    pub confidence_avg: f64,
    pub processing_time: f64,
}

/// A row from the `detection_results` table: one persisted box.
#[derive(Debug, Clone, FromRow)]
pub struct DetectionResult {
    pub id: DbId,
    pub detection_id: DbId,
    pub class_name: String,
    pub confidence: f64,
    pub bbox_x: f64,
    pub bbox_y: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
}

impl From<DetectionResult> for DetectionBox {
    fn from(row: DetectionResult) -> Self {
        DetectionBox {
            class_name: row.class_name,
            confidence: row.confidence,
            bbox_x: row.bbox_x,
            bbox_y: row.bbox_y,
            bbox_width: row.bbox_width,
            bbox_height: row.bbox_height,
        }
    }
}

/// A summary row together with its boxes, in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct StoredDetection {
    pub id: DbId,
    #[serde(skip)]
    pub user_id: Option<DbId>,
    pub timestamp: Timestamp,
    pub detections_count: i64,
    pub confidence_avg: f64,
    pub processing_time: f64,
    pub results: Vec<DetectionBox>,
}

impl StoredDetection {
    pub fn new(detection: Detection, results: Vec<DetectionBox>) -> Self {
        Self {
            id: detection.id,
            user_id: detection.user_id,
            timestamp: detection.timestamp,
            detections_count: detection.detections_count,
            confidence_avg: detection.confidence_avg,
            processing_time: detection.processing_time,
            results,
        }
    }
}
