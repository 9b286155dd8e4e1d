/// Face mesh landmarker using ONNX Runtime via `ort`.
///
/// Faces are proposed by an inner [`FaceDetector`]; each one is cropped to a
/// square region, run through the mesh model, and the resulting landmarks
/// are mapped back into frame-normalized coordinates.
use std::path::Path;

use crate::detection::domain::eye_landmarks::NormalizedPoint;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarker::FaceLandmarker;
use crate::detection::domain::face_mesh::FaceMesh;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::math::sigmoid;

/// Fallback mesh input resolution when the model shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 192;

/// Default minimum face-presence probability.
pub const DEFAULT_MIN_PRESENCE: f64 = 0.5;

/// ROI side relative to the larger side of the detected box.
const ROI_SCALE: f64 = 1.5;

/// Memory layout of the mesh model's image input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputLayout {
    Nchw(u32),
    Nhwc(u32),
}

impl InputLayout {
    fn size(self) -> u32 {
        match self {
            Self::Nchw(s) | Self::Nhwc(s) => s,
        }
    }

    /// Infer the layout from a `[N, C, H, W]` or `[N, H, W, C]` shape.
    fn from_shape(shape: &[i64]) -> Self {
        if shape.len() == 4 {
            if shape[1] == 3 && shape[2] > 0 {
                return Self::Nchw(shape[2] as u32);
            }
            if shape[3] == 3 && shape[1] > 0 {
                return Self::Nhwc(shape[1] as u32);
            }
        }
        Self::Nhwc(DEFAULT_INPUT_SIZE)
    }
}

/// Square crop around one face, in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SquareRoi {
    x0: f64,
    y0: f64,
    side: f64,
}

impl SquareRoi {
    fn around(bbox: &BoundingBox) -> Option<Self> {
        let side = ROI_SCALE * bbox.width.max(bbox.height) as f64;
        if side <= 0.0 {
            return None;
        }
        let (cx, cy) = bbox.center();
        Some(Self {
            x0: cx - side / 2.0,
            y0: cy - side / 2.0,
            side,
        })
    }
}

/// Face mesh landmarker backed by an ONNX Runtime session.
pub struct OnnxFaceMeshLandmarker {
    session: ort::session::Session,
    face_detector: Box<dyn FaceDetector>,
    layout: InputLayout,
    max_faces: usize,
    min_presence: f64,
}

impl OnnxFaceMeshLandmarker {
    /// Load a face mesh ONNX model.
    ///
    /// The input resolution and layout are read from the model's input shape.
    /// Falls back to 192×192 NHWC if the shape is dynamic or unreadable.
    pub fn new(
        model_path: &Path,
        face_detector: Box<dyn FaceDetector>,
        max_faces: usize,
        min_presence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;

        let layout = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    Some(InputLayout::from_shape(shape))
                } else {
                    None
                }
            })
            .unwrap_or(InputLayout::Nhwc(DEFAULT_INPUT_SIZE));
        log::debug!("Face mesh input layout: {layout:?}");

        Ok(Self {
            session,
            face_detector,
            layout,
            max_faces,
            min_presence,
        })
    }
}

impl FaceLandmarker for OnnxFaceMeshLandmarker {
    fn detect_landmarks(&mut self, frame: &Frame) -> Result<Vec<FaceMesh>, Box<dyn std::error::Error>> {
        let faces = self.face_detector.detect(frame)?;
        if faces.len() > self.max_faces {
            log::info!("Keeping {} of {} detected faces", self.max_faces, faces.len());
        }

        let mut meshes = Vec::new();
        for bbox in faces.iter().take(self.max_faces) {
            let Some(roi) = SquareRoi::around(bbox) else {
                continue;
            };

            let input_tensor = crop_to_tensor(frame, &roi, self.layout);
            let input_value = ort::value::Tensor::from_array(input_tensor)?;
            let outputs = self.session.run(ort::inputs![input_value])?;
            if outputs.len() == 0 {
                return Err("Face mesh model produced no outputs".into());
            }

            let landmarks = outputs[0].try_extract_array::<f32>()?;
            let raw: Vec<f32> = landmarks.iter().copied().collect();

            let mut presence_logit = None;
            for i in 1..outputs.len() {
                let t = outputs[i].try_extract_array::<f32>()?;
                if t.len() == 1 {
                    presence_logit = t.iter().next().copied();
                }
            }

            if let Some(logit) = presence_logit {
                let presence = sigmoid(logit) as f64;
                if presence < self.min_presence {
                    log::debug!("Dropping face at {bbox:?}: presence {presence:.3}");
                    continue;
                }
            }

            meshes.push(map_landmarks(&raw, &roi, self.layout.size(), frame.width(), frame.height()));
        }

        Ok(meshes)
    }
}

/// Sample `roi` to a model-sized tensor in [0,1]; pixels outside the frame are black.
fn crop_to_tensor(frame: &Frame, roi: &SquareRoi, layout: InputLayout) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let fw = frame.width() as i64;
    let fh = frame.height() as i64;
    let s = layout.size() as usize;
    let step = roi.side / s as f64;

    let mut tensor = match layout {
        InputLayout::Nchw(_) => ndarray::Array4::<f32>::zeros((1, 3, s, s)),
        InputLayout::Nhwc(_) => ndarray::Array4::<f32>::zeros((1, s, s, 3)),
    };

    for y in 0..s {
        let src_y = (roi.y0 + (y as f64 + 0.5) * step).floor() as i64;
        if src_y < 0 || src_y >= fh {
            continue;
        }
        for x in 0..s {
            let src_x = (roi.x0 + (x as f64 + 0.5) * step).floor() as i64;
            if src_x < 0 || src_x >= fw {
                continue;
            }
            for c in 0..3 {
                let v = src[[src_y as usize, src_x as usize, c]] as f32 / 255.0;
                match layout {
                    InputLayout::Nchw(_) => tensor[[0, c, y, x]] = v,
                    InputLayout::Nhwc(_) => tensor[[0, y, x, c]] = v,
                }
            }
        }
    }

    tensor
}

/// Convert `x, y, z` triples in model-input pixels to frame-normalized points.
fn map_landmarks(raw: &[f32], roi: &SquareRoi, input_size: u32, fw: u32, fh: u32) -> FaceMesh {
    let scale = roi.side / input_size as f64;
    let points = raw
        .chunks_exact(3)
        .map(|p| {
            let x = roi.x0 + p[0] as f64 * scale;
            let y = roi.y0 + p[1] as f64 * scale;
            NormalizedPoint::new(x / fw as f64, y / fh as f64)
        })
        .collect();
    FaceMesh::new(points)
}
