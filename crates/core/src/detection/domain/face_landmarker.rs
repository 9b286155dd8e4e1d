use crate::detection::domain::face_mesh::FaceMesh;
use crate::shared::frame::Frame;

/// Domain interface for dense face landmarking: one [`FaceMesh`] per face.
pub trait FaceLandmarker: Send {
    fn detect_landmarks(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceMesh>, Box<dyn std::error::Error>>;
}
