use std::io::Cursor;

use image::{DynamicImage, ImageDecoder};

use crate::io::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

/// Decodes PNG/JPEG bytes with the `image` crate.
///
/// The format is sniffed from the buffer rather than trusted from the file
/// name, and EXIF orientation is applied so the frame is upright.
pub struct MemoryImageReader;

impl MemoryImageReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MemoryImageReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for MemoryImageReader {
    fn read(&self, bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut decoder = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_decoder()?;
        let orientation = decoder.orientation()?;
        let mut img = DynamicImage::from_decoder(decoder)?;
        img.apply_orientation(orientation);

        let rgb = img.to_rgb8();
        log::debug!("Decoded {}x{} image", rgb.width(), rgb.height());
        Ok(Frame::from(rgb))
    }
}
