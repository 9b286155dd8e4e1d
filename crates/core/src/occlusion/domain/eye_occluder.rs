use crate::detection::domain::eye_landmarks::EyeLandmarkPair;
use crate::shared::frame::Frame;

/// Domain interface for covering the eyes of detected faces.
///
/// Implementations return a new frame and leave `frame` untouched. Landmarks
/// that map outside the frame are clipped, never reported as errors.
pub trait EyeOccluder: Send {
    fn occlude(&self, frame: &Frame, pairs: &[EyeLandmarkPair]) -> Frame;
}
