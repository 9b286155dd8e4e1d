pub mod execution_provider;
pub mod json_detections;
mod math;
pub mod onnx_blazeface_detector;
pub mod onnx_face_mesh_landmarker;
