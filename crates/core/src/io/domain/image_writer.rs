use crate::shared::frame::Frame;
use crate::shared::upload::UploadFormat;

/// Encodes a frame into an in-memory image file of the given format.
pub trait ImageWriter: Send {
    fn write(
        &self,
        frame: &Frame,
        format: UploadFormat,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>>;
}
