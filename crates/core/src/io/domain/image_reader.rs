use crate::shared::frame::Frame;

/// Decodes an uploaded image buffer into an RGB frame.
pub trait ImageReader: Send {
    fn read(&self, bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error>>;
}
