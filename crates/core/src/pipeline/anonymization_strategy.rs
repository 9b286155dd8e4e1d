use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::detection::domain::eye_landmarks::EyeCornerIndices;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarker::FaceLandmarker;
use crate::detection::domain::face_mesh::eye_pairs;
use crate::occlusion::domain::eye_occluder::EyeOccluder;
use crate::shared::anonymization_mode::AnonymizationMode;
use crate::shared::frame::Frame;

/// A detector paired with the transform it feeds, one variant per mode.
pub enum AnonymizationStrategy {
    FaceBlur {
        detector: Box<dyn FaceDetector>,
        blurrer: Box<dyn FrameBlurrer>,
    },
    CoverEyes {
        landmarker: Box<dyn FaceLandmarker>,
        occluder: Box<dyn EyeOccluder>,
        eye_corners: EyeCornerIndices,
    },
}

/// Result of applying a strategy to one frame.
#[derive(Debug)]
pub struct Anonymized {
    pub frame: Frame,
    /// Number of faces the transform acted on.
    pub faces: usize,
}

impl AnonymizationStrategy {
    pub fn face_blur(detector: Box<dyn FaceDetector>, blurrer: Box<dyn FrameBlurrer>) -> Self {
        Self::FaceBlur { detector, blurrer }
    }

    pub fn cover_eyes(
        landmarker: Box<dyn FaceLandmarker>,
        occluder: Box<dyn EyeOccluder>,
        eye_corners: EyeCornerIndices,
    ) -> Self {
        Self::CoverEyes {
            landmarker,
            occluder,
            eye_corners,
        }
    }

    pub fn mode(&self) -> AnonymizationMode {
        match self {
            Self::FaceBlur { .. } => AnonymizationMode::FaceBlur,
            Self::CoverEyes { .. } => AnonymizationMode::CoverEyes,
        }
    }

    /// Detects faces and returns an anonymized copy of `frame`.
    pub fn apply(&mut self, frame: &Frame) -> Result<Anonymized, Box<dyn std::error::Error>> {
        match self {
            Self::FaceBlur { detector, blurrer } => {
                let boxes = detector.detect(frame)?;
                log::debug!("Blurring {} face boxes", boxes.len());
                Ok(Anonymized {
                    frame: blurrer.blur(frame, &boxes),
                    faces: boxes.len(),
                })
            }
            Self::CoverEyes {
                landmarker,
                occluder,
                eye_corners,
            } => {
                let meshes = landmarker.detect_landmarks(frame)?;
                let pairs = eye_pairs(&meshes, *eye_corners);
                log::debug!("Covering eyes of {} faces", pairs.len());
                Ok(Anonymized {
                    frame: occluder.occlude(frame, &pairs),
                    faces: pairs.len(),
                })
            }
        }
    }
}
