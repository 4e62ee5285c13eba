//! YOLO (Ultralytics export) backend running on `tract`.
//!
//! The exported graph takes a `[1, 3, S, S]` RGB tensor in `[0, 1]` and
//! returns `[1, 4 + classes, anchors]`: centre x, centre y, width and height
//! in input pixels followed by one score per class. Some exports transpose
//! the last two axes; both layouts are accepted.

use std::collections::HashMap;

use image::imageops::FilterType;
use roadsign_core::geometry::{BoxCoords, Xyxy};
use tract_onnx::prelude::*;

use crate::config::DetectorConfig;
use crate::frame::PixelArray;
use crate::model::{DetectionModel, InferenceError, RawDetection};

type YoloPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Gray used by Ultralytics for letterbox padding.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// YOLO object detector loaded from an ONNX file.
pub struct TractYoloModel {
    plan: YoloPlan,
    input_size: u32,
    iou_threshold: f32,
}

impl TractYoloModel {
    /// Load, optimize and plan the model at `config.model_path`.
    ///
    /// This is the expensive step; call it once at startup.
    pub fn load(config: &DetectorConfig) -> Result<Self, InferenceError> {
        let path = &config.model_path;
        let size = config.input_size as usize;

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                InferenceError::Model(format!("failed to load {}: {e:#}", path.display()))
            })?;

        tracing::info!(
            path = %path.display(),
            input_size = config.input_size,
            iou_threshold = config.iou_threshold,
            "YOLO model loaded"
        );

        Ok(Self {
            plan,
            input_size: config.input_size,
            iou_threshold: config.iou_threshold,
        })
    }
}

impl DetectionModel for TractYoloModel {
    fn name(&self) -> &str {
        "tract-yolo"
    }

    fn predict(
        &self,
        frame: &PixelArray,
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, InferenceError> {
        let (input, letterbox) = preprocess(frame, self.input_size);

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::Model(format!("{e:#}")))?;
        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InvalidOutput("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InvalidOutput(format!("{e:#}")))?;

        let candidates = decode_output(
            view,
            confidence_threshold,
            &letterbox,
            frame.width(),
            frame.height(),
        )?;

        Ok(nms(candidates, self.iou_threshold)
            .into_iter()
            .map(Candidate::into_raw)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Placement of a frame inside the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub width: u32,
    pub height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    /// Fit a `width x height` frame into a `target x target` square, keeping
    /// the aspect ratio and centring it.
    pub fn fit(width: u32, height: u32, target: u32) -> Self {
        let scale = target as f32 / width.max(height).max(1) as f32;
        let scaled_w = ((width as f32 * scale).round() as u32).clamp(1, target);
        let scaled_h = ((height as f32 * scale).round() as u32).clamp(1, target);
        Self {
            scale,
            width: scaled_w,
            height: scaled_h,
            pad_x: (target - scaled_w) / 2,
            pad_y: (target - scaled_h) / 2,
        }
    }

    /// Map a point in model-input pixels back to frame pixels.
    pub fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.scale,
            (y - self.pad_y as f32) / self.scale,
        )
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.pad_x
            && x < self.pad_x + self.width
            && y >= self.pad_y
            && y < self.pad_y + self.height
    }
}

/// Letterbox `frame` into an NCHW RGB tensor of edge `target`.
pub fn preprocess(frame: &PixelArray, target: u32) -> (Tensor, Letterbox) {
    let letterbox = Letterbox::fit(frame.width(), frame.height(), target);
    let resized = image::imageops::resize(
        &frame.to_rgb_image(),
        letterbox.width,
        letterbox.height,
        FilterType::Triangle,
    );

    let size = target as usize;
    let input = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
        let (x, y) = (x as u32, y as u32);
        if letterbox.contains(x, y) {
            resized.get_pixel(x - letterbox.pad_x, y - letterbox.pad_y)[c] as f32 / 255.0
        } else {
            PAD_VALUE
        }
    });

    (input.into_tensor(), letterbox)
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// A thresholded box in frame pixels, prior to suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: u32,
    pub confidence: f32,
    pub xyxy: Xyxy,
}

impl Candidate {
    fn into_raw(self) -> RawDetection {
        RawDetection {
            class_id: self.class_id,
            confidence: self.confidence,
            coords: BoxCoords::Pixel(self.xyxy),
        }
    }
}

/// Turn raw YOLO output into thresholded candidates in frame pixels.
pub fn decode_output(
    output: tract_ndarray::ArrayViewD<'_, f32>,
    confidence_threshold: f32,
    letterbox: &Letterbox,
    frame_width: u32,
    frame_height: u32,
) -> Result<Vec<Candidate>, InferenceError> {
    let shape = output.shape().to_vec();
    let output = output
        .into_dimensionality::<tract_ndarray::Ix3>()
        .map_err(|_| {
            InferenceError::InvalidOutput(format!(
                "expected [1, 4 + classes, anchors], got {shape:?}"
            ))
        })?;

    let (batch, dim1, dim2) = output.dim();
    // The attribute axis is the short one: 4 + classes is far below the
    // anchor count for any sane input size.
    let (attrs, anchors, transposed) = if dim1 <= dim2 {
        (dim1, dim2, false)
    } else {
        (dim2, dim1, true)
    };
    if batch != 1 || attrs <= 4 {
        return Err(InferenceError::InvalidOutput(format!(
            "expected [1, 4 + classes, anchors], got {shape:?}"
        )));
    }

    let value = |attr: usize, anchor: usize| {
        if transposed {
            output[[0, anchor, attr]]
        } else {
            output[[0, attr, anchor]]
        }
    };

    let max_x = frame_width as f32;
    let max_y = frame_height as f32;
    let mut candidates = Vec::new();

    for anchor in 0..anchors {
        let mut class_id = 0usize;
        let mut confidence = f32::MIN;
        for class in 0..attrs - 4 {
            let score = value(4 + class, anchor);
            if score > confidence {
                confidence = score;
                class_id = class;
            }
        }
        if confidence.is_nan() || confidence <= confidence_threshold {
            continue;
        }

        let (cx, cy) = (value(0, anchor), value(1, anchor));
        let (half_w, half_h) = (value(2, anchor) / 2.0, value(3, anchor) / 2.0);
        let (x1, y1) = letterbox.to_frame(cx - half_w, cy - half_h);
        let (x2, y2) = letterbox.to_frame(cx + half_w, cy + half_h);

        candidates.push(Candidate {
            class_id: class_id as u32,
            confidence,
            xyxy: Xyxy::new(
                f64::from(x1.clamp(0.0, max_x)),
                f64::from(y1.clamp(0.0, max_y)),
                f64::from(x2.clamp(0.0, max_x)),
                f64::from(y2.clamp(0.0, max_y)),
            ),
        });
    }

    Ok(candidates)
}

/// Per-class greedy non-max suppression. Output is sorted by confidence,
/// highest first.
pub fn nms(candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    let mut by_class: HashMap<u32, Vec<Candidate>> = HashMap::new();
    for candidate in candidates {
        by_class.entry(candidate.class_id).or_default().push(candidate);
    }

    let mut kept = Vec::new();
    for (_, mut group) in by_class {
        group.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut suppressed = vec![false; group.len()];

        for i in 0..group.len() {
            if suppressed[i] {
                continue;
            }
            kept.push(group[i]);
            for j in (i + 1)..group.len() {
                if !suppressed[j] && group[i].xyxy.iou(&group[j].xyxy) > f64::from(iou_threshold) {
                    suppressed[j] = true;
                }
            }
        }
    }

    kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    kept
}

#[cfg(test)]
mod tests {
    use tract_onnx::prelude::tract_ndarray::Array3;

    use super::*;

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        width: 100,
        height: 100,
        pad_x: 0,
        pad_y: 0,
    };

    /// Build a `[1, 4 + classes, anchors]` output from per-anchor rows of
    /// `[cx, cy, w, h, score_0, score_1, ...]`, padded with all-zero anchors
    /// so the anchor axis is always the long one.
    fn output(rows: &[&[f32]]) -> Array3<f32> {
        let attrs = rows[0].len();
        let anchors = rows.len().max(attrs + 1);
        Array3::from_shape_fn((1, attrs, anchors), |(_, attr, anchor)| {
            rows.get(anchor).map_or(0.0, |row| row[attr])
        })
    }

    #[test]
    fn letterbox_centres_wide_frames() {
        let lb = Letterbox::fit(1280, 720, 640);
        assert_eq!(lb.scale, 0.5);
        assert_eq!((lb.width, lb.height), (640, 360));
        assert_eq!((lb.pad_x, lb.pad_y), (0, 140));
        assert_eq!(lb.to_frame(320.0, 140.0), (640.0, 0.0));
    }

    #[test]
    fn preprocess_pads_with_gray() {
        let frame = PixelArray::from_raw(2, 1, 3, vec![0, 0, 255, 0, 0, 255]).unwrap();
        let (tensor, lb) = preprocess(&frame, 4);
        assert_eq!(tensor.shape(), &[1, 3, 4, 4]);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 1));

        let view = tensor.to_array_view::<f32>().unwrap();
        assert_eq!(view[[0, 0, 0, 0]], PAD_VALUE);
        // BGR [0, 0, 255] is pure red once read back as RGB.
        assert_eq!(view[[0, 0, 1, 0]], 1.0);
        assert_eq!(view[[0, 2, 1, 0]], 0.0);
    }

    #[test]
    fn decode_keeps_best_class_above_threshold() {
        let out = output(&[
            &[50.0, 50.0, 20.0, 10.0, 0.1, 0.9],
            &[10.0, 10.0, 4.0, 4.0, 0.2, 0.1],
        ]);
        let candidates = decode_output(out.view().into_dyn(), 0.25, &IDENTITY, 100, 100).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].class_id, 1);
        assert_eq!(candidates[0].confidence, 0.9);
        assert_eq!(candidates[0].xyxy, Xyxy::new(40.0, 45.0, 60.0, 55.0));
    }

    #[test]
    fn decode_accepts_transposed_layout() {
        let out = output(&[&[50.0, 50.0, 20.0, 10.0, 0.1, 0.9]]);
        // [1, 6, 7] becomes [1, 7, 6].
        let transposed = out.permuted_axes([0, 2, 1]);
        let candidates =
            decode_output(transposed.view().into_dyn(), 0.25, &IDENTITY, 100, 100).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].class_id, 1);
    }

    #[test]
    fn decode_clamps_to_frame() {
        let out = output(&[&[5.0, 95.0, 20.0, 20.0, 0.8]]);
        let candidates = decode_output(out.view().into_dyn(), 0.25, &IDENTITY, 100, 100).unwrap();
        assert_eq!(candidates[0].xyxy, Xyxy::new(0.0, 85.0, 15.0, 100.0));
    }

    #[test]
    fn decode_rejects_wrong_rank() {
        let out = tract_ndarray::Array2::<f32>::zeros((6, 10));
        let result = decode_output(out.view().into_dyn(), 0.25, &IDENTITY, 100, 100);
        assert!(matches!(result, Err(InferenceError::InvalidOutput(_))));
    }

    #[test]
    fn nms_suppresses_overlaps_within_a_class_only() {
        let boxed = |class_id, confidence, x1| Candidate {
            class_id,
            confidence,
            xyxy: Xyxy::new(x1, 0.0, x1 + 10.0, 10.0),
        };
        let kept = nms(
            vec![
                boxed(0, 0.6, 1.0),
                boxed(0, 0.9, 0.0),
                boxed(1, 0.7, 0.0),
                boxed(0, 0.5, 50.0),
            ],
            0.5,
        );

        let summary: Vec<(u32, f32)> = kept.iter().map(|c| (c.class_id, c.confidence)).collect();
        assert_eq!(summary, vec![(0, 0.9), (1, 0.7), (0, 0.5)]);
    }
}
