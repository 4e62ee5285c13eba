//! Decides whether a detection summary is written to history, and writes it.

use roadsign_core::detection::DetectionSummary;
use roadsign_core::types::DbId;
use roadsign_db::models::detection::StoredDetection;
use roadsign_db::repositories::DetectionRepo;
use roadsign_db::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Failed to persist detection: {0}")]
    Database(#[from] sqlx::Error),
}

/// Shared by the HTTP and streaming paths.
#[derive(Debug, Clone, Copy)]
pub struct PersistPolicy {
    pub persist_anonymous: bool,
}

impl PersistPolicy {
    /// Only non-empty, successful summaries are stored. Anonymous ones only
    /// when `persist_anonymous` is set.
    pub fn should_persist(&self, summary: &DetectionSummary, user_id: Option<DbId>) -> bool {
        summary.detections_count > 0
            && summary.error.is_none()
            && (user_id.is_some() || self.persist_anonymous)
    }
}

/// Write `summary` (and one row per box) if `policy` allows it.
///
/// Returns the stored row, or `None` when nothing was written.
pub async fn persist(
    pool: &DbPool,
    policy: PersistPolicy,
    summary: &DetectionSummary,
    user_id: Option<DbId>,
) -> Result<Option<StoredDetection>, PersistenceError> {
    if !policy.should_persist(summary, user_id) {
        return Ok(None);
    }
    let stored = DetectionRepo::create_with_results(pool, user_id, summary).await?;
    Ok(Some(stored))
}

#[cfg(test)]
mod tests {
    use roadsign_core::detection::DetectionBox;
    use roadsign_core::geometry::NormalizedBox;

    use super::*;

    fn one_box() -> DetectionSummary {
        DetectionSummary::from_boxes(
            vec![DetectionBox::new(
                "Stop",
                0.9,
                NormalizedBox { x: 0.0, y: 0.0, width: 0.5, height: 0.5 },
            )],
            0.01,
        )
    }

    #[test]
    fn empty_and_failed_summaries_are_never_persisted() {
        let policy = PersistPolicy { persist_anonymous: true };
        assert!(!policy.should_persist(&DetectionSummary::from_boxes(Vec::new(), 0.01), Some(1)));
        assert!(!policy.should_persist(&DetectionSummary::failed("boom"), Some(1)));
    }

    #[test]
    fn anonymous_persistence_follows_the_flag() {
        let summary = one_box();
        assert!(PersistPolicy { persist_anonymous: true }.should_persist(&summary, None));
        assert!(!PersistPolicy { persist_anonymous: false }.should_persist(&summary, None));
        assert!(PersistPolicy { persist_anonymous: false }.should_persist(&summary, Some(7)));
    }
}
