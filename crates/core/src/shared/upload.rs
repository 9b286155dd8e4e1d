use std::path::Path;

use thiserror::Error;

use crate::shared::anonymization_mode::AnonymizationMode;
use crate::shared::constants::UPLOAD_EXTENSIONS;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UploadError {
    #[error("unsupported image type for '{0}' (expected jpg, jpeg or png)")]
    UnsupportedFormat(String),
}

/// Container format of an upload, which is also the format of its download.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadFormat {
    Png,
    Jpeg,
}

impl UploadFormat {
    /// Determines the format from the file extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, UploadError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| UPLOAD_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| UploadError::UnsupportedFormat(file_name.to_string()))?;

        if ext == "png" {
            Ok(UploadFormat::Png)
        } else {
            Ok(UploadFormat::Jpeg)
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            UploadFormat::Png => "image/png",
            UploadFormat::Jpeg => "image/jpeg",
        }
    }

    /// Extension of the download, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            UploadFormat::Png => ".png",
            UploadFormat::Jpeg => ".jpg",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            UploadFormat::Png => image::ImageFormat::Png,
            UploadFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Raw bytes of a user-supplied image together with its original name.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Encoded result ready to be offered for download.
#[derive(Clone, Debug)]
pub struct DownloadableImage {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `{base}-{mode}{ext}`, where `base` is the upload name up to its first dot.
///
/// `photo.final.jpeg` with Face-Blur becomes `photo-Face-Blur.jpg`.
pub fn download_file_name(upload_name: &str, mode: AnonymizationMode, format: UploadFormat) -> String {
    let name = Path::new(upload_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(upload_name);
    let base = name.split('.').next().unwrap_or(name);
    format!("{base}-{}{}", mode.label(), format.extension())
}
