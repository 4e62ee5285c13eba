//! Traffic-sign detection pipeline.
//!
//! - [`frame`] -- data-URI decoding into a [`frame::PixelArray`].
//! - [`model`] -- the [`model::DetectionModel`] seam every backend implements.
//! - [`yolo`] -- YOLO ONNX backend running on `tract`.
//! - [`detector`] -- label mapping, normalization and aggregation around a model.
//! - [`pool`] -- bounded off-loop execution of detector calls.
//! - [`annotate`] -- box overlays for the raw-frame path.

pub mod annotate;
pub mod config;
pub mod detector;
pub mod frame;
pub mod model;
pub mod pool;
pub mod yolo;

pub use config::DetectorConfig;
pub use detector::{AnnotatedDetection, DetectError, Detector};
pub use frame::{decode, DecodeError, PixelArray};
pub use model::{DetectionModel, InferenceError, RawDetection};
pub use pool::InferencePool;
