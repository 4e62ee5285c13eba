use std::path::PathBuf;

/// Default confidence threshold applied to model output.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
/// Default IoU threshold for per-class non-max suppression.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;
/// Default square input edge of the exported model.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Detector and inference-pool configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Path to the frozen ONNX model.
    pub model_path: PathBuf,
    /// Square input edge the model was exported with.
    pub input_size: u32,
    /// Minimum class score for a box to be reported.
    pub confidence_threshold: f32,
    /// Overlap above which same-class boxes are suppressed.
    pub iou_threshold: f32,
    /// Maximum number of concurrent inference calls.
    pub workers: usize,
    /// Upper bound on a single inference call, in seconds.
    pub timeout_secs: u64,
}

impl DetectorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `MODEL_PATH`              | `models/traffic_signs.onnx` |
    /// | `MODEL_INPUT_SIZE`        | `640`                       |
    /// | `CONFIDENCE_THRESHOLD`    | `0.25`                      |
    /// | `IOU_THRESHOLD`           | `0.7`                       |
    /// | `INFERENCE_WORKERS`       | `2`                         |
    /// | `INFERENCE_TIMEOUT_SECS`  | `30`                        |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model_path = std::env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let input_size: u32 = std::env::var("MODEL_INPUT_SIZE")
            .map(|v| v.parse().expect("MODEL_INPUT_SIZE must be a valid u32"))
            .unwrap_or(defaults.input_size);

        let confidence_threshold: f32 = std::env::var("CONFIDENCE_THRESHOLD")
            .map(|v| v.parse().expect("CONFIDENCE_THRESHOLD must be a valid f32"))
            .unwrap_or(defaults.confidence_threshold);
        assert!(
            (0.0..=1.0).contains(&confidence_threshold),
            "CONFIDENCE_THRESHOLD must be within [0, 1]"
        );

        let iou_threshold: f32 = std::env::var("IOU_THRESHOLD")
            .map(|v| v.parse().expect("IOU_THRESHOLD must be a valid f32"))
            .unwrap_or(defaults.iou_threshold);

        let workers: usize = std::env::var("INFERENCE_WORKERS")
            .map(|v| v.parse().expect("INFERENCE_WORKERS must be a valid usize"))
            .unwrap_or(defaults.workers);
        assert!(workers > 0, "INFERENCE_WORKERS must be at least 1");

        let timeout_secs: u64 = std::env::var("INFERENCE_TIMEOUT_SECS")
            .map(|v| v.parse().expect("INFERENCE_TIMEOUT_SECS must be a valid u64"))
            .unwrap_or(defaults.timeout_secs);

        Self {
            model_path,
            input_size,
            confidence_threshold,
            iou_threshold,
            workers,
            timeout_secs,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/traffic_signs.onnx"),
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            workers: 2,
            timeout_secs: 30,
        }
    }
}
