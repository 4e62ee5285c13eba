use std::time::Instant;

use image::RgbImage;
use roadsign_core::detection::{DetectionBox, DetectionSummary};
use roadsign_core::labels::label_for;

use crate::annotate::annotate;
use crate::frame::{self, DecodeError, PixelArray};
use crate::model::{DetectionModel, InferenceError};

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// A summary together with the frame it was computed on, boxes drawn in.
#[derive(Debug, Clone)]
pub struct AnnotatedDetection {
    pub summary: DetectionSummary,
    pub annotated: RgbImage,
}

/// Wraps a loaded model with label lookup, box normalization and
/// aggregation. Loaded once at startup and shared by every caller.
pub struct Detector {
    model: Box<dyn DetectionModel>,
    confidence_threshold: f32,
}

impl Detector {
    pub fn new(model: Box<dyn DetectionModel>, confidence_threshold: f32) -> Self {
        Self {
            model,
            confidence_threshold,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Run the model over a decoded frame and aggregate the result.
    pub fn infer(&self, frame: &PixelArray) -> Result<DetectionSummary, InferenceError> {
        self.infer_with_threshold(frame, self.confidence_threshold)
    }

    pub fn infer_with_threshold(
        &self,
        frame: &PixelArray,
        confidence_threshold: f32,
    ) -> Result<DetectionSummary, InferenceError> {
        let started = Instant::now();
        let boxes = self.boxes(frame, confidence_threshold)?;
        Ok(self.summarize(boxes, started))
    }

    /// Decode a data-URI frame and detect signs in it.
    ///
    /// Never fails: a decode or inference error yields an empty summary
    /// with `error` set.
    pub fn detect_data_uri(&self, payload: &str) -> DetectionSummary {
        let started = Instant::now();
        let result = frame::decode(payload)
            .map_err(DetectError::from)
            .and_then(|frame| Ok(self.boxes(&frame, self.confidence_threshold)?));

        match result {
            Ok(boxes) => self.summarize(boxes, started),
            Err(e) => {
                tracing::warn!(error = %e, "Detection failed");
                DetectionSummary::failed(e.to_string())
            }
        }
    }

    /// Detect signs in `frame` and draw the boxes onto a copy of it.
    pub fn detect_frame(&self, frame: &PixelArray) -> Result<AnnotatedDetection, DetectError> {
        let summary = self.infer(frame)?;
        let annotated = annotate(frame, &summary.detections);
        Ok(AnnotatedDetection { summary, annotated })
    }

    fn boxes(
        &self,
        frame: &PixelArray,
        confidence_threshold: f32,
    ) -> Result<Vec<DetectionBox>, InferenceError> {
        let raw = self.model.predict(frame, confidence_threshold)?;
        let (w, h) = (frame.width(), frame.height());

        Ok(raw
            .into_iter()
            .map(|r| {
                DetectionBox::new(
                    label_for(r.class_id),
                    f64::from(r.confidence),
                    r.coords.normalize(w, h),
                )
            })
            .collect())
    }

    fn summarize(&self, boxes: Vec<DetectionBox>, started: Instant) -> DetectionSummary {
        let summary = DetectionSummary::from_boxes(boxes, started.elapsed().as_secs_f64());
        debug_assert!(summary.is_consistent());
        tracing::debug!(
            model = self.model.name(),
            count = summary.detections_count,
            processing_time = summary.processing_time,
            "Frame processed"
        );
        summary
    }
}
