//! Precomputed detections loaded from JSON.
//!
//! Lets an external detector feed the pipeline, and gives deterministic
//! input for runs without model files. The expected document is
//!
//! ```json
//! {
//!   "faces": [{"origin_x": 10, "origin_y": 20, "width": 80, "height": 90}],
//!   "eyes":  [{"left": {"x": 0.3, "y": 0.4}, "right": {"x": 0.6, "y": 0.4}}]
//! }
//! ```
//!
//! Both keys are optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::eye_landmarks::{EyeCornerIndices, EyeLandmarkPair, NormalizedPoint};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarker::FaceLandmarker;
use crate::detection::domain::face_mesh::FaceMesh;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum JsonDetectionsError {
    #[error("failed to read detections from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid detections JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct DetectionsDocument {
    #[serde(default)]
    faces: Vec<BoundingBox>,
    #[serde(default)]
    eyes: Vec<EyeLandmarkPair>,
}

/// Fixed detections served for every frame.
#[derive(Clone, Debug, Default)]
pub struct JsonDetections {
    faces: Vec<BoundingBox>,
    eyes: Vec<EyeLandmarkPair>,
    eye_corners: EyeCornerIndices,
}

impl JsonDetections {
    pub fn from_file(path: &Path, eye_corners: EyeCornerIndices) -> Result<Self, JsonDetectionsError> {
        let text = std::fs::read_to_string(path).map_err(|source| JsonDetectionsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, eye_corners)
    }

    pub fn from_json(text: &str, eye_corners: EyeCornerIndices) -> Result<Self, JsonDetectionsError> {
        let doc: DetectionsDocument = serde_json::from_str(text)?;
        log::info!(
            "Loaded {} face boxes and {} eye pairs from JSON",
            doc.faces.len(),
            doc.eyes.len()
        );
        Ok(Self {
            faces: doc.faces,
            eyes: doc.eyes,
            eye_corners,
        })
    }

    pub fn faces(&self) -> &[BoundingBox] {
        &self.faces
    }

    pub fn eyes(&self) -> &[EyeLandmarkPair] {
        &self.eyes
    }

    /// A mesh whose only meaningful points sit at the configured eye indices.
    fn sparse_mesh(&self, pair: &EyeLandmarkPair) -> FaceMesh {
        let len = self.eye_corners.left.max(self.eye_corners.right) + 1;
        let mut points = vec![NormalizedPoint::new(f64::NAN, f64::NAN); len];
        points[self.eye_corners.left] = pair.left;
        points[self.eye_corners.right] = pair.right;
        FaceMesh::new(points)
    }
}

impl FaceDetector for JsonDetections {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        Ok(self.faces.clone())
    }
}

impl FaceLandmarker for JsonDetections {
    fn detect_landmarks(&mut self, _frame: &Frame) -> Result<Vec<FaceMesh>, Box<dyn std::error::Error>> {
        Ok(self.eyes.iter().map(|pair| self.sparse_mesh(pair)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"{
        "faces": [{"origin_x": -50, "origin_y": 0, "width": 100, "height": 100}],
        "eyes": [
            {"left": {"x": 0.3, "y": 0.4}, "right": {"x": 0.6, "y": 0.4}},
            {"left": {"x": 0.1, "y": 0.2}, "right": {"x": 0.2, "y": 0.25}}
        ]
    }"#;

    #[test]
    fn test_parses_faces_and_eyes() {
        let dets = JsonDetections::from_json(DOC, EyeCornerIndices::default()).unwrap();
        assert_eq!(dets.faces(), &[BoundingBox::new(-50, 0, 100, 100)]);
        assert_eq!(dets.eyes().len(), 2);
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let dets = JsonDetections::from_json("{}", EyeCornerIndices::default()).unwrap();
        assert!(dets.faces().is_empty());
        assert!(dets.eyes().is_empty());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = JsonDetections::from_json("{\"faces\": 3}", EyeCornerIndices::default()).unwrap_err();
        assert!(matches!(err, JsonDetectionsError::Parse(_)));
    }

    #[test]
    fn test_detector_returns_faces_for_any_frame() {
        let mut dets = JsonDetections::from_json(DOC, EyeCornerIndices::default()).unwrap();
        let frame = Frame::filled(8, 8, [0, 0, 0]);
        assert_eq!(dets.detect(&frame).unwrap(), vec![BoundingBox::new(-50, 0, 100, 100)]);
    }

    #[test]
    fn test_landmarker_meshes_expose_eye_pairs() {
        let indices = EyeCornerIndices::default();
        let mut dets = JsonDetections::from_json(DOC, indices).unwrap();
        let meshes = dets.detect_landmarks(&Frame::filled(8, 8, [0, 0, 0])).unwrap();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].len(), 264);
        assert_eq!(meshes[0].eye_pair(indices), Some(dets.eyes()[0]));
        assert_eq!(meshes[1].eye_pair(indices), Some(dets.eyes()[1]));
    }

    #[test]
    fn test_landmarker_honors_custom_indices() {
        let indices = EyeCornerIndices { left: 1, right: 0 };
        let mut dets = JsonDetections::from_json(DOC, indices).unwrap();
        let meshes = dets.detect_landmarks(&Frame::filled(8, 8, [0, 0, 0])).unwrap();
        assert_eq!(meshes[0].len(), 2);
        assert_eq!(meshes[0].eye_pair(indices), Some(dets.eyes()[0]));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let dets = JsonDetections::from_file(file.path(), EyeCornerIndices::default()).unwrap();
        assert_eq!(dets.faces().len(), 1);
    }

    #[test]
    fn test_from_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonDetections::from_file(&dir.path().join("nope.json"), EyeCornerIndices::default())
            .unwrap_err();
        assert!(matches!(err, JsonDetectionsError::Read { .. }));
    }
}
