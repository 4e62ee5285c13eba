//! Aggregates over detection history.

use roadsign_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Which detections an aggregate covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    User(DbId),
    Global,
}

impl StatsScope {
    pub(crate) fn user_id(self) -> Option<DbId> {
        match self {
            StatsScope::User(id) => Some(id),
            StatsScope::Global => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SignCount {
    pub class_name: String,
    pub count: i64,
}

/// Response body of the stats endpoints. Averages are rounded to 3 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionStats {
    pub total_detections: i64,
    pub avg_processing_time: f64,
    pub avg_confidence: f64,
    pub most_detected_signs: Vec<SignCount>,
}

/// Per-user totals shown on the profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub total_sessions: i64,
    pub total_signs_detected: i64,
    pub avg_confidence: f64,
    pub avg_processing_time: f64,
    pub member_since: Timestamp,
}
