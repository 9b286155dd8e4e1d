pub const BLAZEFACE_MODEL_NAME: &str = "blaze_face_short_range.onnx";
pub const FACE_MESH_MODEL_NAME: &str = "face_landmark.onnx";

/// Directory under the platform cache/data dir holding downloaded models.
pub const APP_DIR_NAME: &str = "FaceAnonymizer";

pub const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Gaussian blur applied to face boxes. Large enough to make faces
/// unrecognizable at typical photo resolutions.
pub const BLUR_KERNEL_SIZE: usize = 99;
pub const BLUR_SIGMA: f64 = 30.0;

/// Detector boxes tend to start below the hairline; raise them this much.
pub const BLUR_VERTICAL_SHIFT: i32 = 8;

/// MediaPipe face mesh (468/478 points): outer corners of the eyes.
pub const LEFT_EYE_OUTER_CORNER: usize = 33;
pub const RIGHT_EYE_OUTER_CORNER: usize = 263;

/// Matches the face mesh `max_num_faces` of the web demo.
pub const DEFAULT_MAX_FACES: usize = 20;
