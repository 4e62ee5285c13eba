use std::time::Duration;

use roadsign_core::geometry::BoxCoords;

use crate::frame::PixelArray;

/// One box as reported by a model backend, before label lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub class_id: u32,
    pub confidence: f32,
    pub coords: BoxCoords,
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),

    #[error("Inference timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("Inference worker failed: {0}")]
    WorkerFailed(String),
}

/// A frozen object-detection model.
///
/// Implementations own confidence thresholding and non-max suppression; the
/// detector only consumes the returned boxes. A single instance is shared
/// by every request and session, so `predict` must be callable concurrently
/// through `&self`.
pub trait DetectionModel: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn name(&self) -> &str;

    /// Run a forward pass over `frame`, keeping boxes scoring above
    /// `confidence_threshold`. Boxes are returned in no particular order.
    fn predict(
        &self,
        frame: &PixelArray,
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, InferenceError>;
}
