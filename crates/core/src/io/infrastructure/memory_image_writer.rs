use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;

use crate::io::domain::image_writer::ImageWriter;
use crate::shared::frame::Frame;
use crate::shared::upload::UploadFormat;

/// Default JPEG quality, matching common desktop encoders.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Encodes frames to PNG or JPEG bytes with the `image` crate.
pub struct MemoryImageWriter {
    jpeg_quality: u8,
}

impl MemoryImageWriter {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }
}

impl Default for MemoryImageWriter {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageWriter for MemoryImageWriter {
    fn write(
        &self,
        frame: &Frame,
        format: UploadFormat,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let img = frame.clone().into_rgb_image();
        let mut buf = Vec::new();

        match format {
            UploadFormat::Png => {
                img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
            }
            UploadFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
                img.write_with_encoder(encoder)?;
            }
        }

        log::debug!("Encoded {:?} ({} bytes)", format, buf.len());
        Ok(buf)
    }
}
