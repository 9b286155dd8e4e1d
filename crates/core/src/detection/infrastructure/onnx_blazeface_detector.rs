/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// A lightweight short-range detector that yields one box per face in frame
/// pixel coordinates. Boxes may extend past the frame edges; clamping is left
/// to the consumer.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::math::{bbox_iou, sigmoid};

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: box (4) + 6 keypoints (12).
const NUM_REGRESSORS: usize = 16;

/// BlazeFace face detector backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        // 1. Preprocess: resize to 128x128, normalize to [0,1], NCHW
        let input_tensor = preprocess(frame, INPUT_SIZE);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // BlazeFace outputs two tensors:
        // - regressors: [1, 896, 16] (box deltas + keypoints)
        // - classificators: [1, 896, 1] (confidence logits)
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        // 3. Decode anchor boxes + filter by confidence
        let mut raw_dets = decode(
            reg_data,
            score_data,
            &self.anchors,
            self.confidence,
            frame.width(),
            frame.height(),
        );

        // 4. NMS
        let kept = nms(&mut raw_dets, NMS_IOU_THRESH);
        log::debug!("BlazeFace kept {} of {} candidates", kept.len(), raw_dets.len());

        Ok(kept.iter().map(RawDet::to_bounding_box).collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Nearest-neighbour resize to `size × size`, scaled to [0,1], NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let s = size as usize;
    let sample = |dst: usize, src_len: u32| -> usize {
        let pos = (dst as f64 + 0.5) * src_len as f64 / s as f64;
        (pos as usize).min(src_len as usize - 1)
    };
    let rows: Vec<usize> = (0..s).map(|y| sample(y, frame.height())).collect();
    let cols: Vec<usize> = (0..s).map(|x| sample(x, frame.width())).collect();

    ndarray::Array4::from_shape_fn((1, 3, s, s), |(_, c, y, x)| {
        src[[rows[y], cols[x], c]] as f32 / 255.0
    })
}

// ---------------------------------------------------------------------------
// Anchor generation (BlazeFace short-range)
// ---------------------------------------------------------------------------

/// Anchor centers of the short-range model, in [0,1] input coordinates.
///
/// Two feature maps: 16×16 cells with 2 anchors each, then 8×8 cells with 6.
fn generate_anchors() -> Vec<[f32; 2]> {
    const LAYERS: [(usize, usize); 2] = [(16, 2), (8, 6)]; // (grid, anchors_per_cell)

    LAYERS
        .iter()
        .flat_map(|&(grid, per_cell)| {
            (0..grid * grid).flat_map(move |cell| {
                let cx = ((cell % grid) as f32 + 0.5) / grid as f32;
                let cy = ((cell / grid) as f32 + 0.5) / grid as f32;
                std::iter::repeat([cx, cy]).take(per_cell)
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Decoding + NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDet {
    corners: [f64; 4],
    score: f64,
}

impl RawDet {
    fn to_bounding_box(&self) -> BoundingBox {
        let [x1, y1, x2, y2] = self.corners;
        BoundingBox::new(
            x1.round() as i32,
            y1.round() as i32,
            (x2 - x1).round() as i32,
            (y2 - y1).round() as i32,
        )
    }
}

/// Turn raw regressor/logit slices into frame-space candidates.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    confidence: f64,
    fw: u32,
    fh: u32,
) -> Vec<RawDet> {
    let mut dets = Vec::new();
    let scale = INPUT_SIZE as f32;

    for (i, (&raw_score, anchor)) in score_data.iter().zip(anchors).enumerate() {
        let score = sigmoid(raw_score);
        if (score as f64) < confidence {
            continue;
        }

        let reg_offset = i * NUM_REGRESSORS;
        if reg_offset + 4 > reg_data.len() {
            break;
        }

        // Decode box center + size relative to anchor
        let cx = anchor[0] + reg_data[reg_offset] / scale;
        let cy = anchor[1] + reg_data[reg_offset + 1] / scale;
        let w = reg_data[reg_offset + 2] / scale;
        let h = reg_data[reg_offset + 3] / scale;

        dets.push(RawDet {
            corners: [
                ((cx - w / 2.0) * fw as f32) as f64,
                ((cy - h / 2.0) * fh as f32) as f64,
                ((cx + w / 2.0) * fw as f32) as f64,
                ((cy + h / 2.0) * fh as f32) as f64,
            ],
            score: score as f64,
        });
    }

    dets
}

/// Greedy NMS: highest score first, drop anything overlapping a kept box.
fn nms(dets: &mut [RawDet], iou_thresh: f64) -> Vec<RawDet> {
    dets.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<RawDet> = Vec::new();
    for det in dets.iter() {
        if keep
            .iter()
            .all(|k| bbox_iou(&k.corners, &det.corners) <= iou_thresh)
        {
            keep.push(det.clone());
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
