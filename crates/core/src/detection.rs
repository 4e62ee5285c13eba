//! Detection records and their aggregation.

use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedBox;

/// One detected sign: label, confidence and a normalized top-left box.
///
/// Field names are the wire format used by both the HTTP and the streaming
/// interface, and match the persisted `detection_results` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub class_name: String,
    pub confidence: f64,
    pub bbox_x: f64,
    pub bbox_y: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
}

impl DetectionBox {
    pub fn new(class_name: impl Into<String>, confidence: f64, bbox: NormalizedBox) -> Self {
        Self {
            class_name: class_name.into(),
            confidence: confidence.clamp(0.0, 1.0),
            bbox_x: bbox.x,
            bbox_y: bbox.y,
            bbox_width: bbox.width,
            bbox_height: bbox.height,
        }
    }
}

/// Aggregate over all boxes produced by a single inference call.
///
/// Build one through [`DetectionSummary::from_boxes`] (or
/// [`DetectionSummary::failed`] for a degraded result) so the count and mean
/// always agree with `detections`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub detections: Vec<DetectionBox>,
    pub detections_count: usize,
    pub confidence_avg: f64,
    /// Wall-clock seconds spent producing this summary.
    pub processing_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionSummary {
    pub fn from_boxes(detections: Vec<DetectionBox>, processing_time: f64) -> Self {
        let detections_count = detections.len();
        let confidence_avg = mean_confidence(&detections);
        Self {
            detections,
            detections_count,
            confidence_avg,
            processing_time,
            error: None,
        }
    }

    /// A summary standing in for a failed decode or inference.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            detections: Vec::new(),
            detections_count: 0,
            confidence_avg: 0.0,
            processing_time: 0.0,
            error: Some(message.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detections_count == 0
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Check the count/mean invariants against the contained boxes.
    pub fn is_consistent(&self) -> bool {
        const TOLERANCE: f64 = 1e-9;
        self.detections_count == self.detections.len()
            && (self.confidence_avg - mean_confidence(&self.detections)).abs() < TOLERANCE
    }
}

fn mean_confidence(boxes: &[DetectionBox]) -> f64 {
    if boxes.is_empty() {
        return 0.0;
    }
    boxes.iter().map(|b| b.confidence).sum::<f64>() / boxes.len() as f64
}
