//! Repository for the `detections` and `detection_results` tables.

use std::collections::HashMap;

use chrono::Utc;
use roadsign_core::detection::{DetectionBox, DetectionSummary};
use roadsign_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::detection::{Detection, DetectionResult, StoredDetection};

const COLUMNS: &str =
    "id, user_id, timestamp, detections_count, confidence_avg, processing_time";

const RESULT_COLUMNS: &str = "id, detection_id, class_name, confidence, \
                              bbox_x, bbox_y, bbox_width, bbox_height";

pub struct DetectionRepo;

impl DetectionRepo {
    /// Persist a summary row plus one result row per box in a single
    /// transaction. `user_id = None` stores an anonymous detection.
    pub async fn create_with_results(
        pool: &SqlitePool,
        user_id: Option<DbId>,
        summary: &DetectionSummary,
    ) -> Result<StoredDetection, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO detections \
                (user_id, timestamp, detections_count, confidence_avg, processing_time) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING {COLUMNS}"
        );
        let detection = sqlx::query_as::<_, Detection>(&insert_query)
            .bind(user_id)
            .bind(Utc::now())
            .bind(summary.detections_count as i64)
            .bind(summary.confidence_avg)
            .bind(summary.processing_time)
            .fetch_one(&mut *tx)
            .await?;

        for b in &summary.detections {
            sqlx::query(
                "INSERT INTO detection_results \
                    (detection_id, class_name, confidence, bbox_x, bbox_y, bbox_width, bbox_height) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(detection.id)
            .bind(&b.class_name)
            .bind(b.confidence)
            .bind(b.bbox_x)
            .bind(b.bbox_y)
            .bind(b.bbox_width)
            .bind(b.bbox_height)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            detection_id = detection.id,
            user_id = ?user_id,
            count = summary.detections_count,
            "Detection persisted"
        );
        Ok(StoredDetection::new(detection, summary.detections.clone()))
    }

    /// Find a stored detection with its results.
    pub async fn find_by_id(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<StoredDetection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM detections WHERE id = ?1");
        let Some(detection) = sqlx::query_as::<_, Detection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let query = format!(
            "SELECT {RESULT_COLUMNS} FROM detection_results WHERE detection_id = ?1 ORDER BY id"
        );
        let results = sqlx::query_as::<_, DetectionResult>(&query)
            .bind(id)
            .fetch_all(pool)
            .await?;

        Ok(Some(StoredDetection::new(
            detection,
            results.into_iter().map(DetectionBox::from).collect(),
        )))
    }

    /// The `limit` most recent detections of a user, newest first, each
    /// with its results.
    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<StoredDetection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM detections WHERE user_id = ?1 \
             ORDER BY timestamp DESC, id DESC LIMIT ?2"
        );
        let detections = sqlx::query_as::<_, Detection>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        if detections.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {RESULT_COLUMNS} FROM detection_results WHERE detection_id IN \
                (SELECT id FROM detections WHERE user_id = ?1 \
                 ORDER BY timestamp DESC, id DESC LIMIT ?2) \
             ORDER BY detection_id, id"
        );
        let rows = sqlx::query_as::<_, DetectionResult>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        let mut by_detection: HashMap<DbId, Vec<DetectionBox>> = HashMap::new();
        for row in rows {
            by_detection
                .entry(row.detection_id)
                .or_default()
                .push(row.into());
        }

        Ok(detections
            .into_iter()
            .map(|d| {
                let results = by_detection.remove(&d.id).unwrap_or_default();
                StoredDetection::new(d, results)
            })
            .collect())
    }
}
