//! Aggregate queries over detection history.

use roadsign_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::stats::{DetectionStats, ProfileStats, SignCount, StatsScope};
use crate::models::user::User;

/// Number of classes reported in `most_detected_signs`.
const TOP_SIGNS: i64 = 5;

#[derive(sqlx::FromRow)]
struct Totals {
    total: i64,
    signs: i64,
    avg_processing_time: f64,
    avg_confidence: f64,
}

pub struct StatsRepo;

impl StatsRepo {
    /// Totals, averages and the most frequent classes for `scope`.
    ///
    /// With no rows every number is zero and the class list is empty.
    pub async fn detection_stats(
        pool: &SqlitePool,
        scope: StatsScope,
    ) -> Result<DetectionStats, sqlx::Error> {
        let user_id = scope.user_id();
        let totals = Self::totals(pool, user_id).await?;

        let most_detected_signs = sqlx::query_as::<_, SignCount>(
            "SELECT r.class_name AS class_name, COUNT(*) AS count
             FROM detection_results r
             JOIN detections d ON d.id = r.detection_id
             WHERE ?1 IS NULL OR d.user_id = ?1
             GROUP BY r.class_name
             ORDER BY count DESC, r.class_name ASC
             LIMIT ?2",
        )
        .bind(user_id)
        .bind(TOP_SIGNS)
        .fetch_all(pool)
        .await?;

        Ok(DetectionStats {
            total_detections: totals.total,
            avg_processing_time: round3(totals.avg_processing_time),
            avg_confidence: round3(totals.avg_confidence),
            most_detected_signs,
        })
    }

    /// Lifetime totals for one user.
    pub async fn profile_stats(
        pool: &SqlitePool,
        user: &User,
    ) -> Result<ProfileStats, sqlx::Error> {
        let totals = Self::totals(pool, Some(user.id)).await?;
        Ok(ProfileStats {
            total_sessions: totals.total,
            total_signs_detected: totals.signs,
            avg_confidence: round3(totals.avg_confidence),
            avg_processing_time: round3(totals.avg_processing_time),
            member_since: user.created_at,
        })
    }

    async fn totals(pool: &SqlitePool, user_id: Option<DbId>) -> Result<Totals, sqlx::Error> {
        sqlx::query_as::<_, Totals>(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(detections_count), 0) AS signs,
                    COALESCE(AVG(processing_time), 0.0) AS avg_processing_time,
                    COALESCE(AVG(confidence_avg), 0.0) AS avg_confidence
             FROM detections
             WHERE ?1 IS NULL OR user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::round3;

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(round3(0.123_456), 0.123);
        assert_eq!(round3(0.0005), 0.001);
        assert_eq!(round3(0.0), 0.0);
    }
}
